//! Coordinate source adapter
//!
//! Reads chromosome lengths and annotated feature tables from the backing
//! store. The store is read-only; every query opens its own connection and
//! drops it before returning.
//!
//! Table and column names never reach SQL unchecked: they are validated
//! against the database schema first and then quoted as identifiers. The
//! chromosome id is always a bound parameter.

use crate::core::error::{GenomeTraceError, Result};
use crate::core::genome::{AttrValue, ChromId, Feature, Span, Strand};
use log::{debug, warn};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Column holding the feature's external identifier
pub const ID_COLUMN: &str = "Primary_SGDID";
/// Column holding the feature type tag
pub const TYPE_COLUMN: &str = "Feature_type";
/// Column holding the strand (W / C)
pub const STRAND_COLUMN: &str = "Strand";
/// Column holding the start coordinate
pub const START_COLUMN: &str = "Start_coordinate";
/// Column holding the stop coordinate
pub const STOP_COLUMN: &str = "Stop_coordinate";
/// Column holding the chromosome number
pub const CHROMOSOME_COLUMN: &str = "Chromosome";
/// Table with one length row per chromosome, in chromosome order
pub const LENGTH_TABLE: &str = "chromosome_length";

const BASE_COLUMNS: [&str; 5] = [ID_COLUMN, TYPE_COLUMN, STRAND_COLUMN, START_COLUMN, STOP_COLUMN];

/// Which feature table to read and which extra columns to carry along
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureQuery {
    pub table: String,
    pub extra_columns: Vec<String>,
}

impl FeatureQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            extra_columns: Vec::new(),
        }
    }

    /// Add extra columns, skipping the ones always fetched and duplicates
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if BASE_COLUMNS.contains(&column.as_str()) || self.extra_columns.contains(&column) {
                continue;
            }
            self.extra_columns.push(column);
        }
        self
    }

    /// Every column the query selects, base columns first
    pub fn columns(&self) -> Vec<&str> {
        BASE_COLUMNS
            .iter()
            .copied()
            .chain(self.extra_columns.iter().map(|s| s.as_str()))
            .collect()
    }
}

/// Read-only provider of chromosome lengths and feature tables
pub trait GenomeSource {
    /// Genomic length of `chrom` in base pairs
    fn chromosome_length(&self, chrom: ChromId) -> Result<u64>;

    /// Features on `chrom`, in the table's stored order
    fn features(&self, chrom: ChromId, query: &FeatureQuery) -> Result<Vec<Feature>>;

    /// Distinct chromosome numbers referenced by the feature table, ascending
    fn chromosome_ids(&self, query: &FeatureQuery) -> Result<Vec<i64>>;
}

impl<S: GenomeSource + ?Sized> GenomeSource for &S {
    fn chromosome_length(&self, chrom: ChromId) -> Result<u64> {
        (**self).chromosome_length(chrom)
    }

    fn features(&self, chrom: ChromId, query: &FeatureQuery) -> Result<Vec<Feature>> {
        (**self).features(chrom, query)
    }

    fn chromosome_ids(&self, query: &FeatureQuery) -> Result<Vec<i64>> {
        (**self).chromosome_ids(query)
    }
}

/// SQLite-backed genome database
#[derive(Debug)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    /// Open a database file, failing early if it cannot be opened read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = Self {
            path: path.as_ref().to_path_buf(),
        };
        drop(source.connect()?);
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags).map_err(|e| {
            GenomeTraceError::data_source(format!("cannot open {}: {}", self.path.display(), e))
        })
    }

    /// Names of all tables and views in the database
    pub fn tables(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        list_tables(&conn)
    }

    /// Column names of `table`, which must exist
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        validated_columns(&conn, table)
    }
}

fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

fn validated_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    if !list_tables(conn)?.iter().any(|t| t == table) {
        return Err(GenomeTraceError::data_source(format!("unknown table '{}'", table)));
    }
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn require_columns<'a, I>(known: &[String], table: &str, columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for column in columns {
        if !known.iter().any(|k| k == column) {
            return Err(GenomeTraceError::data_source(format!(
                "table '{}' has no column '{}'",
                table, column
            )));
        }
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_attr(value: ValueRef<'_>) -> AttrValue {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => AttrValue::Missing,
        ValueRef::Integer(i) => AttrValue::Number(i as f64),
        ValueRef::Real(f) => AttrValue::Number(f),
        ValueRef::Text(t) => AttrValue::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Chromosome column value; anything but a whole number is a data error
fn chromosome_number(value: ValueRef<'_>, table: &str) -> Result<i64> {
    let number = match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) if f.fract() == 0.0 => Some(f as i64),
        ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(|t| t.trim().parse().ok()),
        _ => None,
    };
    number.ok_or_else(|| {
        GenomeTraceError::data_source(format!(
            "table '{}' has a non-integer {} value",
            table, CHROMOSOME_COLUMN
        ))
    })
}

/// Strand column value; unrecognised values fall back to Watson
fn parse_strand(value: &AttrValue, feature_id: &str) -> Strand {
    let text = value.to_string();
    text.chars().next().and_then(Strand::from_char).unwrap_or_else(|| {
        warn!("feature {}: unrecognised strand '{}', drawing on Watson", feature_id, text);
        Strand::Watson
    })
}

/// Coordinate column value: missing stays missing, negatives are an error
fn coordinate(value: &AttrValue, feature_id: &str) -> Result<Option<u64>> {
    match value.as_f64() {
        None => Ok(None),
        Some(v) if v < 0.0 => Err(GenomeTraceError::data_source(format!(
            "negative coordinate {} on feature {}",
            v, feature_id
        ))),
        Some(v) => Ok(Some(v as u64)),
    }
}

impl GenomeSource for SqliteSource {
    fn chromosome_length(&self, chrom: ChromId) -> Result<u64> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT length FROM {} ORDER BY rowid LIMIT 1 OFFSET ?1",
            quote_ident(LENGTH_TABLE)
        );
        let length: Option<i64> = conn
            .query_row(&sql, [chrom.index() as i64], |row| row.get(0))
            .optional()?;
        match length {
            Some(len) if len >= 0 => Ok(len as u64),
            Some(len) => Err(GenomeTraceError::data_source(format!(
                "negative length {} for chromosome {}",
                len, chrom
            ))),
            None => Err(GenomeTraceError::data_source(format!(
                "no length row for chromosome {}",
                chrom
            ))),
        }
    }

    fn features(&self, chrom: ChromId, query: &FeatureQuery) -> Result<Vec<Feature>> {
        let conn = self.connect()?;

        let known = validated_columns(&conn, &query.table)?;
        let columns = query.columns();
        require_columns(
            &known,
            &query.table,
            columns.iter().copied().chain(std::iter::once(CHROMOSOME_COLUMN)),
        )?;

        let select: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            select.join(", "),
            quote_ident(&query.table),
            quote_ident(CHROMOSOME_COLUMN)
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([chrom.get() as i64])?;
        let mut features = Vec::new();

        while let Some(row) = rows.next()? {
            let values: Vec<AttrValue> = (0..columns.len())
                .map(|i| row.get_ref(i).map(to_attr))
                .collect::<rusqlite::Result<_>>()?;

            let id = values[0].to_string();
            let strand = parse_strand(&values[2], &id);
            let span = match (coordinate(&values[3], &id)?, coordinate(&values[4], &id)?) {
                (Some(a), Some(b)) => Some(Span::new(a, b)),
                _ => None,
            };

            let attributes: BTreeMap<String, AttrValue> = query
                .extra_columns
                .iter()
                .cloned()
                .zip(values[BASE_COLUMNS.len()..].iter().cloned())
                .collect();

            features.push(Feature {
                id,
                chrom,
                strand,
                feature_type: values[1].to_string(),
                span,
                attributes,
            });
        }

        debug!("{}: {} features on chromosome {}", query.table, features.len(), chrom);
        Ok(features)
    }

    fn chromosome_ids(&self, query: &FeatureQuery) -> Result<Vec<i64>> {
        let conn = self.connect()?;
        let known = validated_columns(&conn, &query.table)?;
        require_columns(&known, &query.table, [CHROMOSOME_COLUMN])?;

        let sql = format!(
            "SELECT DISTINCT {col} FROM {} ORDER BY {col}",
            quote_ident(&query.table),
            col = quote_ident(CHROMOSOME_COLUMN)
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(chromosome_number(row.get_ref(0)?, &query.table)?);
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

/// In-memory source, for tests and for callers that already hold the tables
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lengths: HashMap<ChromId, u64>,
    features: Vec<Feature>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_length(mut self, chrom: ChromId, length: u64) -> Self {
        self.lengths.insert(chrom, length);
        self
    }

    /// Set lengths for chromosomes 1, 2, ... in order
    pub fn with_lengths(mut self, lengths: &[u64]) -> Self {
        for (chrom, &len) in ChromId::all().zip(lengths) {
            self.lengths.insert(chrom, len);
        }
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }
}

impl GenomeSource for MemorySource {
    fn chromosome_length(&self, chrom: ChromId) -> Result<u64> {
        self.lengths.get(&chrom).copied().ok_or_else(|| {
            GenomeTraceError::data_source(format!("no length row for chromosome {}", chrom))
        })
    }

    fn features(&self, chrom: ChromId, _query: &FeatureQuery) -> Result<Vec<Feature>> {
        Ok(self.features.iter().filter(|f| f.chrom == chrom).cloned().collect())
    }

    fn chromosome_ids(&self, _query: &FeatureQuery) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self.features.iter().map(|f| f.chrom.get() as i64).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

/// Once-per-session cache of chromosome lengths
///
/// Lengths are immutable for a given data source, so entries are never
/// invalidated; drop the cache to start a new session.
pub struct LengthCache<S> {
    inner: S,
    lengths: RwLock<HashMap<ChromId, u64>>,
}

impl<S: GenomeSource> LengthCache<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lengths: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of lengths fetched so far
    pub fn cached(&self) -> usize {
        self.lengths.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl<S: GenomeSource> GenomeSource for LengthCache<S> {
    fn chromosome_length(&self, chrom: ChromId) -> Result<u64> {
        if let Some(len) = self.lengths.read().ok().and_then(|m| m.get(&chrom).copied()) {
            return Ok(len);
        }
        let len = self.inner.chromosome_length(chrom)?;
        if let Ok(mut m) = self.lengths.write() {
            m.insert(chrom, len);
        }
        Ok(len)
    }

    fn features(&self, chrom: ChromId, query: &FeatureQuery) -> Result<Vec<Feature>> {
        self.inner.features(chrom, query)
    }

    fn chromosome_ids(&self, query: &FeatureQuery) -> Result<Vec<i64>> {
        self.inner.chromosome_ids(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl GenomeSource for CountingSource {
        fn chromosome_length(&self, chrom: ChromId) -> Result<u64> {
            self.calls.set(self.calls.get() + 1);
            Ok(chrom.get() as u64 * 1000)
        }

        fn features(&self, _chrom: ChromId, _query: &FeatureQuery) -> Result<Vec<Feature>> {
            Ok(Vec::new())
        }

        fn chromosome_ids(&self, _query: &FeatureQuery) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }
    }

    fn chrom(n: i64) -> ChromId {
        ChromId::new(n).unwrap()
    }

    #[test]
    fn test_feature_query_columns() {
        let query = FeatureQuery::new("loci").with_columns(["Feature_type", "GC", "GC", "Length"]);
        assert_eq!(query.extra_columns, vec!["GC".to_string(), "Length".to_string()]);
        assert_eq!(query.columns().len(), 7);
        assert_eq!(query.columns()[0], ID_COLUMN);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("loci"), "\"loci\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_coordinate_values() {
        assert_eq!(coordinate(&AttrValue::Number(10.0), "x").unwrap(), Some(10));
        assert_eq!(coordinate(&AttrValue::Text("".into()), "x").unwrap(), None);
        assert!(coordinate(&AttrValue::Number(-1.0), "x").is_err());
    }

    #[test]
    fn test_chromosome_number_values() {
        assert_eq!(chromosome_number(ValueRef::Integer(99), "loci").unwrap(), 99);
        assert_eq!(chromosome_number(ValueRef::Real(3.0), "loci").unwrap(), 3);
        assert_eq!(chromosome_number(ValueRef::Text(b" 12"), "loci").unwrap(), 12);
        assert!(chromosome_number(ValueRef::Real(2.5), "loci").unwrap_err().is_data_source());
        assert!(chromosome_number(ValueRef::Null, "loci").is_err());
        assert!(chromosome_number(ValueRef::Text(b"chrI"), "loci").is_err());
    }

    #[test]
    fn test_unrecognised_strand_draws_watson() {
        assert_eq!(parse_strand(&AttrValue::Text("C".into()), "S1"), Strand::Crick);
        assert_eq!(parse_strand(&AttrValue::Text("W".into()), "S1"), Strand::Watson);
        assert_eq!(parse_strand(&AttrValue::Text("X".into()), "S1"), Strand::Watson);
        assert_eq!(parse_strand(&AttrValue::Text(String::new()), "S1"), Strand::Watson);
        assert_eq!(parse_strand(&AttrValue::Missing, "S1"), Strand::Watson);
    }

    #[test]
    fn test_length_cache_hits() {
        let cache = LengthCache::new(CountingSource { calls: Cell::new(0) });
        assert_eq!(cache.chromosome_length(chrom(2)).unwrap(), 2000);
        assert_eq!(cache.chromosome_length(chrom(2)).unwrap(), 2000);
        assert_eq!(cache.chromosome_length(chrom(3)).unwrap(), 3000);
        assert_eq!(cache.inner().calls.get(), 2);
        assert_eq!(cache.cached(), 2);
    }

    #[test]
    fn test_memory_source_missing_length() {
        let source = MemorySource::new().with_length(chrom(1), 500);
        assert_eq!(source.chromosome_length(chrom(1)).unwrap(), 500);
        let err = source.chromosome_length(chrom(2)).unwrap_err();
        assert!(err.is_data_source());
    }

    #[test]
    fn test_memory_source_filters_by_chrom() {
        let source = MemorySource::new()
            .with_feature(Feature::new("a", chrom(1), Strand::Watson, None))
            .with_feature(Feature::new("b", chrom(2), Strand::Watson, None))
            .with_feature(Feature::new("c", chrom(1), Strand::Crick, None));
        let features = source.features(chrom(1), &FeatureQuery::new("loci")).unwrap();
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(source.chromosome_ids(&FeatureQuery::new("loci")).unwrap(), vec![1, 2]);
    }
}

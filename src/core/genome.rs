//! Genome data model
//!
//! Chromosome ids, strands, annotated features and the vertical lane layout
//! used to place chromosomes on a linear plot.

use crate::core::error::{GenomeTraceError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of chromosomes served by the data source (16 nuclear + mitochondrial)
pub const CHROMOSOME_COUNT: u8 = 17;

/// Chromosome id reserved for the mitochondrial genome
pub const MITOCHONDRIAL: u8 = 17;

/// Chromosome identifier in `1..=CHROMOSOME_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChromId(u8);

impl ChromId {
    /// Validate a raw chromosome number
    ///
    /// # Examples
    /// ```
    /// use genome_trace::core::ChromId;
    /// assert!(ChromId::new(1).is_ok());
    /// assert!(ChromId::new(17).is_ok());
    /// assert!(ChromId::new(0).is_err());
    /// assert!(ChromId::new(18).is_err());
    /// ```
    pub fn new(n: i64) -> Result<Self> {
        if (1..=CHROMOSOME_COUNT as i64).contains(&n) {
            Ok(ChromId(n as u8))
        } else {
            Err(GenomeTraceError::input_shape(format!(
                "chromosome id {} outside 1..={}",
                n, CHROMOSOME_COUNT
            )))
        }
    }

    /// Iterate over every chromosome id served by the source
    pub fn all() -> impl Iterator<Item = ChromId> {
        (1..=CHROMOSOME_COUNT).map(ChromId)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Zero-based position, used for lane arithmetic and table offsets
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn is_mitochondrial(&self) -> bool {
        self.0 == MITOCHONDRIAL
    }

    /// Axis label: the chromosome number, or "mitochondrial"
    pub fn label(&self) -> String {
        if self.is_mitochondrial() {
            "mitochondrial".to_string()
        } else {
            self.0.to_string()
        }
    }
}

impl std::fmt::Display for ChromId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strand orientation (Watson / Crick)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub enum Strand {
    #[default]
    Watson,
    Crick,
}

impl Strand {
    /// Parse strand from char
    ///
    /// # Examples
    /// ```
    /// use genome_trace::core::Strand;
    /// assert_eq!(Strand::from_char('W'), Some(Strand::Watson));
    /// assert_eq!(Strand::from_char('-'), Some(Strand::Crick));
    /// assert_eq!(Strand::from_char('.'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'W' | 'w' | '+' => Some(Strand::Watson),
            'C' | 'c' | '-' => Some(Strand::Crick),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Strand::Watson => 'W',
            Strand::Crick => 'C',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Attribute value pulled from a feature table column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    Missing,
}

impl AttrValue {
    /// Numeric view of the value; text is parsed, empty text is missing
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) if v.is_nan() => None,
            AttrValue::Number(v) => Some(*v),
            AttrValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            AttrValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            AttrValue::Missing => true,
            AttrValue::Text(s) => s.is_empty(),
            AttrValue::Number(v) => v.is_nan(),
        }
    }

    /// Category key used by the discrete color policy
    pub fn as_category(&self) -> Option<String> {
        match self {
            AttrValue::Missing => None,
            AttrValue::Text(s) if s.is_empty() => None,
            AttrValue::Text(s) => Some(s.clone()),
            AttrValue::Number(v) if v.is_nan() => None,
            AttrValue::Number(v) => Some(v.to_string()),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Number(v) => write!(f, "{}", v),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Missing => Ok(()),
        }
    }
}

/// Closed genomic interval in base pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u64,
    pub stop: u64,
}

impl Span {
    /// Build a span, swapping the bounds if they arrive reversed
    pub fn new(a: u64, b: u64) -> Self {
        Span { start: a.min(b), stop: a.max(b) }
    }

    pub fn len(&self) -> u64 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

/// Annotated genomic feature (locus), read-only
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Stable external identifier (e.g. SGDID)
    pub id: String,
    pub chrom: ChromId,
    pub strand: Strand,
    pub feature_type: String,
    /// None when the store has no coordinates for this feature
    pub span: Option<Span>,
    /// Extra columns requested for coloring or hover
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Feature {
    pub fn new(id: impl Into<String>, chrom: ChromId, strand: Strand, span: Option<Span>) -> Self {
        Self {
            id: id.into(),
            chrom,
            strand,
            feature_type: String::new(),
            span,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = feature_type.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Look up a column value; the built-in columns are addressable by name too
    pub fn attr(&self, name: &str) -> AttrValue {
        if let Some(v) = self.attributes.get(name) {
            return v.clone();
        }
        match name {
            "Feature_type" => AttrValue::Text(self.feature_type.clone()),
            "Strand" => AttrValue::Text(self.strand.to_string()),
            "Primary_SGDID" => AttrValue::Text(self.id.clone()),
            _ => AttrValue::Missing,
        }
    }
}

/// Vertical placement of chromosomes on the linear plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenomeLayout {
    /// Number of chromosome lanes, ids 1..=chromosome_count
    pub chromosome_count: u8,
    /// Vertical distance between consecutive chromosomes
    pub spacing: f64,
    /// Offset of each strand lane from the chromosome axis
    pub strand_nudge: f64,
}

impl Default for GenomeLayout {
    fn default() -> Self {
        Self {
            chromosome_count: CHROMOSOME_COUNT,
            spacing: 6.0,
            strand_nudge: 0.2,
        }
    }
}

impl GenomeLayout {
    pub fn with_spacing(spacing: f64) -> Self {
        Self { spacing, ..Self::default() }
    }

    /// Reject chromosome ids beyond this layout's lanes
    pub fn check(&self, chrom: ChromId) -> Result<ChromId> {
        if chrom.get() <= self.chromosome_count {
            Ok(chrom)
        } else {
            Err(GenomeTraceError::input_shape(format!(
                "chromosome {} outside layout of {} chromosomes",
                chrom, self.chromosome_count
            )))
        }
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = ChromId> {
        ChromId::all().take(self.chromosome_count as usize)
    }

    /// Axis position of chromosome `chrom`
    pub fn axis(&self, chrom: ChromId) -> f64 {
        chrom.index() as f64 * self.spacing
    }

    /// Lane for a strand: Crick above the axis, Watson below
    ///
    /// # Examples
    /// ```
    /// use genome_trace::core::{ChromId, GenomeLayout, Strand};
    /// let layout = GenomeLayout::default();
    /// let chrom = ChromId::new(2).unwrap();
    /// assert!((layout.lane(chrom, Strand::Crick) - 6.2).abs() < 1e-9);
    /// assert!((layout.lane(chrom, Strand::Watson) - 5.8).abs() < 1e-9);
    /// ```
    pub fn lane(&self, chrom: ChromId, strand: Strand) -> f64 {
        match strand {
            Strand::Crick => self.axis(chrom) + self.strand_nudge,
            Strand::Watson => self.axis(chrom) - self.strand_nudge,
        }
    }

    /// Parallel per-chromosome lane lists (Crick lanes, Watson lanes)
    pub fn lanes(&self) -> (Vec<f64>, Vec<f64>) {
        self.chromosomes()
            .map(|c| (self.lane(c, Strand::Crick), self.lane(c, Strand::Watson)))
            .unzip()
    }

    /// Axis ticks: one per chromosome, labelled by chromosome
    pub fn ticks(&self) -> Vec<(f64, String)> {
        self.chromosomes().map(|c| (self.axis(c), c.label())).collect()
    }
}

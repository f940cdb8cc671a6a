//! Integration tests against an on-disk annotation database
//!
//! Builds a small SQLite database with a chromosome length table and a loci
//! table, then runs both plot builds and the file writers end to end.

use genome_trace::core::{
    build_linear_plot, build_model_plot, resolve_model_segments, ChromId, ColorConfig, ColorKey,
    ColorMode, FeatureQuery, GenomeLayout, GenomeSource, LengthCache, ResolverConfig, SqliteSource,
    Strand,
};
use genome_trace::formats::{read_model_file, write_segments_tsv, write_table, PlotFormat};
use genome_trace::GenomeTraceError;
use rusqlite::{params, Connection};
use std::io::Write;
use tempfile::NamedTempFile;

fn chrom(n: i64) -> ChromId {
    ChromId::new(n).unwrap()
}

/// Three chromosomes: 1000, 2000 and 3000 bp
fn create_test_db() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();
    conn.execute_batch(
        "CREATE TABLE chromosome_length (length INTEGER);
         INSERT INTO chromosome_length VALUES (1000), (2000), (3000);
         CREATE TABLE loci (
             Primary_SGDID TEXT,
             Feature_type TEXT,
             Strand TEXT,
             Start_coordinate INTEGER,
             Stop_coordinate INTEGER,
             Chromosome INTEGER,
             Expression REAL,
             Gene TEXT
         );",
    )
    .unwrap();

    let rows: [(&str, &str, &str, Option<i64>, Option<i64>, i64, Option<f64>, &str); 6] = [
        ("S01", "ORF", "W", Some(50), Some(150), 1, Some(10.0), "AAA1"),
        ("S02", "CDS", "W", Some(50), Some(150), 1, Some(99.0), "AAA1"),
        ("S03", "tRNA", "C", Some(600), Some(400), 1, None, "tK"),
        ("S04", "ORF", "C", Some(100), Some(900), 2, Some(95.0), "BBB2"),
        ("S05", "ORF", "W", None, None, 2, Some(1.0), "CCC3"),
        ("S06", "ORF", "W", Some(2500), Some(2900), 3, Some(0.0), "DDD4"),
    ];
    for (id, kind, strand, start, stop, c, expr, gene) in rows {
        conn.execute(
            "INSERT INTO loci VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![id, kind, strand, start, stop, c, expr, gene],
        )
        .unwrap();
    }
    file
}

fn layout() -> GenomeLayout {
    GenomeLayout { chromosome_count: 3, ..GenomeLayout::default() }
}

#[test]
fn test_lengths_follow_row_order() {
    let db = create_test_db();
    let source = SqliteSource::open(db.path()).unwrap();
    assert_eq!(source.chromosome_length(chrom(1)).unwrap(), 1000);
    assert_eq!(source.chromosome_length(chrom(3)).unwrap(), 3000);

    let err = source.chromosome_length(chrom(4)).unwrap_err();
    assert!(err.is_data_source());
}

#[test]
fn test_features_by_chromosome() {
    let db = create_test_db();
    let source = SqliteSource::open(db.path()).unwrap();
    let query = FeatureQuery::new("loci").with_columns(["Expression"]);
    let features = source.features(chrom(1), &query).unwrap();

    let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["S01", "S02", "S03"]);

    // Crick coordinates are stored stop-first
    let trna = &features[2];
    assert_eq!(trna.span.unwrap().start, 400);
    assert_eq!(trna.span.unwrap().stop, 600);
    assert_eq!(trna.attr("Expression").as_f64(), None);
    assert_eq!(features[0].attr("Expression").as_f64(), Some(10.0));

    let chrom2 = source.features(chrom(2), &query).unwrap();
    assert!(chrom2[1].span.is_none());
}

#[test]
fn test_unknown_identifiers_rejected() {
    let db = create_test_db();
    let source = SqliteSource::open(db.path()).unwrap();

    let err = source
        .features(chrom(1), &FeatureQuery::new("loci; DROP TABLE loci"))
        .unwrap_err();
    assert!(err.is_data_source());

    let err = source
        .features(chrom(1), &FeatureQuery::new("loci").with_columns(["Nope\" FROM loci --"]))
        .unwrap_err();
    assert!(err.is_data_source());

    // Still intact
    assert_eq!(source.features(chrom(1), &FeatureQuery::new("loci")).unwrap().len(), 3);
    assert!(source.tables().unwrap().contains(&"loci".to_string()));
    assert!(source.columns("loci").unwrap().contains(&"Gene".to_string()));
}

#[test]
fn test_open_missing_database() {
    let err = SqliteSource::open("/nonexistent/dir/genome.db").unwrap_err();
    assert!(err.is_data_source());
}

#[test]
fn test_linear_plot_from_database() {
    let db = create_test_db();
    let source = LengthCache::new(SqliteSource::open(db.path()).unwrap());
    let config = ColorConfig::new(ColorMode::SemiContinuous, "Expression")
        .with_threshold(90.0)
        .with_hover(vec!["Gene".into()]);

    let table = build_linear_plot(&source, &FeatureQuery::new("loci"), &layout(), &config).unwrap();

    // 3 chromosomes x 2 bars + 5 features with coordinates
    assert_eq!(table.len(), 3 * 6 + 3 * 5);
    assert_eq!(source.cached(), 3);
    assert!(table.rows[..18].iter().all(|r| r.is_background()));
    assert!(table.rows.iter().skip(2).step_by(3).all(|r| r.is_break()));

    let feature_keys: Vec<String> = table.colors[18..].iter().step_by(3).map(|k| k.key()).collect();
    assert_eq!(feature_keys, vec!["0-10", "90<", "null", "90<", "0-10"]);

    let mut out = Vec::new();
    write_table(&table, PlotFormat::Tsv, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("x\ty\tcolor\thover\tchromosome\tGene\n"));
    assert!(text.contains("\tS04\t2\tBBB2\n"));
}

#[test]
fn test_out_of_range_chromosome_rejected() {
    let db = create_test_db();
    let source = SqliteSource::open(db.path()).unwrap();
    let config = ColorConfig::new(ColorMode::Continuous, "Expression");
    assert_eq!(source.chromosome_ids(&FeatureQuery::new("loci")).unwrap(), vec![1, 2, 3]);

    // Rows on chromosome 3 do not fit a two-chromosome layout
    let narrow = GenomeLayout { chromosome_count: 2, ..GenomeLayout::default() };
    let err = build_linear_plot(&source, &FeatureQuery::new("loci"), &narrow, &config).unwrap_err();
    assert!(matches!(err, GenomeTraceError::InputShape(_)));

    let conn = Connection::open(db.path()).unwrap();
    conn.execute(
        "INSERT INTO loci VALUES ('bad', 'ORF', 'W', 10, 20, 99, 1.0, 'BAD1')",
        [],
    )
    .unwrap();
    drop(conn);

    let err = build_linear_plot(&source, &FeatureQuery::new("loci"), &layout(), &config).unwrap_err();
    match err {
        GenomeTraceError::InputShape(message) => assert!(message.contains("99")),
        other => panic!("unexpected error {:?}", other),
    }

    let model_file = write_model("1\t0\t0\t0\n1\t1\t0\t0\n");
    let model = read_model_file(model_file.path()).unwrap();
    let err = resolve_model_segments(&source, &FeatureQuery::new("loci"), &model, &ResolverConfig::default())
        .unwrap_err();
    assert!(matches!(err, GenomeTraceError::InputShape(_)));
}

#[test]
fn test_unrecognised_strand_kept_on_watson() {
    let db = create_test_db();
    let conn = Connection::open(db.path()).unwrap();
    conn.execute("INSERT INTO loci VALUES ('odd', 'ORF', 'X', 10, 20, 1, NULL, 'ODD1')", [])
        .unwrap();
    drop(conn);

    let source = SqliteSource::open(db.path()).unwrap();
    let features = source.features(chrom(1), &FeatureQuery::new("loci")).unwrap();
    let odd = features.iter().find(|f| f.id == "odd").unwrap();
    assert_eq!(odd.strand, Strand::Watson);
}

fn write_model(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_model_plot_from_files() {
    let db = create_test_db();
    let source = LengthCache::new(SqliteSource::open(db.path()).unwrap());
    let model_file = write_model(
        "chrom\tx\ty\tz\n\
         chrI\t0\t0\t0\n\
         chrI\t1\t0\t0\n\
         chrI\t1\t3\t0\n\
         chrII\t0\t0\t0\n\
         chrII\t0\t0\t2\n",
    );
    let model = read_model_file(model_file.path()).unwrap();

    let resolved = resolve_model_segments(
        &source,
        &FeatureQuery::new("loci"),
        &model,
        &ResolverConfig::default(),
    )
    .unwrap();

    // chromosome 1: [0, 250] hits S01 (S02 is a CDS), [250, 1000] hits the tRNA
    let ids: Vec<Option<&str>> = resolved[0]
        .identities
        .iter()
        .map(|i| i.as_ref().map(|f| f.id.as_str()))
        .collect();
    assert_eq!(ids, vec![Some("S01"), Some("S03")]);
    assert_eq!(resolved[1].segments[0].stop_bp, 2000.0);

    let config = ColorConfig::new(ColorMode::Discrete, "Feature_type")
        .with_categories(vec!["ORF".into()], vec!["#1f77b4".into()]);
    let table = build_model_plot(
        &source,
        &FeatureQuery::new("loci"),
        &model,
        &ResolverConfig::default(),
        &config,
    )
    .unwrap();
    assert!(table.is_3d());
    assert_eq!(table.len(), 9);
    assert_eq!(table.colors[0], ColorKey::Category("ORF".into()));
    assert_eq!(table.colors[3], ColorKey::Other);

    let mut out = Vec::new();
    write_table(&table, PlotFormat::Json, &mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(json["rows"][2]["z"].is_null());
    assert_eq!(json["rows"][0]["hover"], "S01");

    let mut report = Vec::new();
    write_segments_tsv(&resolved, &mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert_eq!(report.lines().count(), 1 + 3);
    assert!(report.contains("1\t0\t0.0\t250.0\t1.0000\tS01"));
}

#[test]
fn test_degenerate_model_aborts() {
    let db = create_test_db();
    let source = SqliteSource::open(db.path()).unwrap();
    let model_file = write_model("1\t0\t0\t0\n1\t1\t0\t0\n2\t3\t3\t3\n2\t3\t3\t3\n");
    let model = read_model_file(model_file.path()).unwrap();

    let config = ColorConfig::new(ColorMode::Continuous, "Expression");
    let err = build_model_plot(
        &source,
        &FeatureQuery::new("loci"),
        &model,
        &ResolverConfig::default(),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, GenomeTraceError::DegenerateGeometry { chrom: 2 }));
}

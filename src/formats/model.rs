//! Structural model reader
//!
//! Reads a table of model points, one per line:
//!
//! ```text
//! chrom  x  y  z
//! 1      0.12  3.40  -1.05
//! 1      0.80  3.10  -0.92
//! ```
//!
//! Fields may be separated by tabs, commas or spaces. Lines starting with
//! `#` are comments, and a leading header line is skipped. Chromosomes may
//! be written as numbers, with a `chr` prefix, as roman numerals (`chrIV`)
//! or as `M`/`MT`/`mito` for the mitochondrial genome. Points of one
//! chromosome must be contiguous and are kept in file order.

use crate::core::io::{open_text_reader, LineIterator};
use crate::core::{ChromId, GenomeTraceError, Point3, Result, StructuralModel, MITOCHONDRIAL};
use log::debug;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// Parse a chromosome token
///
/// # Examples
/// ```
/// use genome_trace::model::parse_chrom;
/// assert_eq!(parse_chrom("4").unwrap().get(), 4);
/// assert_eq!(parse_chrom("chrXVI").unwrap().get(), 16);
/// assert_eq!(parse_chrom("chrM").unwrap().get(), 17);
/// assert!(parse_chrom("chr99").is_none());
/// ```
pub fn parse_chrom(token: &str) -> Option<ChromId> {
    let lower = token.trim().to_lowercase();
    let bare = lower.strip_prefix("chr").unwrap_or(&lower);

    if matches!(bare, "m" | "mt" | "mito" | "mitochondrial") {
        return ChromId::new(MITOCHONDRIAL as i64).ok();
    }
    if let Ok(n) = bare.parse::<i64>() {
        return ChromId::new(n).ok();
    }
    parse_roman(bare).and_then(|n| ChromId::new(n).ok())
}

fn parse_roman(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let digit = |c: char| match c {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        _ => None,
    };
    let values: Vec<i64> = s.chars().map(digit).collect::<Option<_>>()?;
    let total = values.iter().enumerate().fold(0, |acc, (i, &v)| {
        if values.get(i + 1).map_or(false, |&next| next > v) {
            acc - v
        } else {
            acc + v
        }
    });
    Some(total)
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == '\t' || c == ',' || c == ' ')
        .filter(|f| !f.is_empty())
        .collect()
}

fn parse_point(fields: &[&str], line_number: usize) -> Result<Point3> {
    let coord = |i: usize, name: &str| -> Result<f64> {
        fields[i].parse::<f64>().map_err(|_| {
            GenomeTraceError::input_shape(format!(
                "line {}: invalid {} coordinate '{}'",
                line_number, name, fields[i]
            ))
        })
    };
    Ok(Point3::new(coord(1, "x")?, coord(2, "y")?, coord(3, "z")?))
}

/// Parse a structural model from any buffered reader
pub fn parse_model_reader<R: BufRead>(reader: R) -> Result<StructuralModel> {
    let mut lines = LineIterator::new(reader);
    let mut model = StructuralModel::new();
    let mut finished: HashSet<ChromId> = HashSet::new();
    let mut current: Option<ChromId> = None;
    let mut seen_data = false;
    let mut line_number = 0;

    while let Some(line) = lines.next_line() {
        line_number += 1;
        let line = line?.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = split_fields(line);
        if fields.len() < 4 {
            return Err(GenomeTraceError::input_shape(format!(
                "line {}: expected 4 fields (chrom x y z), found {}",
                line_number,
                fields.len()
            )));
        }

        let chrom = match parse_chrom(fields[0]) {
            Some(c) => c,
            None if !seen_data && fields[1].parse::<f64>().is_err() => continue,
            None => {
                return Err(GenomeTraceError::input_shape(format!(
                    "line {}: unknown chromosome '{}'",
                    line_number, fields[0]
                )))
            }
        };
        seen_data = true;

        if current != Some(chrom) {
            if let Some(prev) = current {
                finished.insert(prev);
            }
            if finished.contains(&chrom) {
                return Err(GenomeTraceError::input_shape(format!(
                    "line {}: points of chromosome {} are not contiguous",
                    line_number, chrom
                )));
            }
            current = Some(chrom);
        }

        model.push(chrom, parse_point(&fields, line_number)?);
    }

    debug!(
        "structural model: {} points on {} chromosomes",
        model.total_points(),
        model.chromosomes().count()
    );
    Ok(model)
}

/// Read a structural model file (plain, .gz or .bz2)
pub fn read_model_file<P: AsRef<Path>>(path: P) -> Result<StructuralModel> {
    let reader = open_text_reader(path.as_ref())?;
    parse_model_reader(reader)
}

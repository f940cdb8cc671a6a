//! Plot table writers
//!
//! A [`PlotTable`] is written either as TSV, one row per line with `none`
//! in the coordinate columns of break rows, or as a single JSON document
//! carrying the rows together with the color map and axis ticks. Breaks are
//! `null` in JSON.

use crate::core::{AttrValue, ChromId, Coord, PlotTable, ResolvedChromosome, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Output encoding of a plot table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlotFormat {
    #[default]
    Tsv,
    Json,
}

/// Open `path` for writing, or stdout when no path is given
pub fn open_output<P: AsRef<Path>>(path: Option<P>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) => Box::new(BufWriter::with_capacity(128 * 1024, File::create(p.as_ref())?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    Ok(writer)
}

fn header(table: &PlotTable) -> Vec<String> {
    let mut columns = vec!["x".to_string(), "y".to_string()];
    if table.is_3d() {
        columns.push("z".to_string());
    }
    columns.extend(["color", "hover", "chromosome"].map(String::from));
    columns.extend(table.hover_columns.iter().cloned());
    columns
}

/// Write rows as tab-separated text with a header line
pub fn write_tsv<W: Write>(table: &PlotTable, mut out: W) -> Result<()> {
    writeln!(out, "{}", header(table).join("\t"))?;

    let is_3d = table.is_3d();
    for (row, color) in table.iter() {
        write!(out, "{}\t{}", row.x, row.y)?;
        if is_3d {
            write!(out, "\t{}", row.z.unwrap_or(Coord::Break))?;
        }
        write!(
            out,
            "\t{}\t{}\t{}",
            color.key(),
            row.hover().unwrap_or(""),
            row.chrom.map(|c| c.to_string()).unwrap_or_default()
        )?;
        for column in &table.hover_columns {
            write!(out, "\t{}", row.attr(column))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonRow<'a> {
    x: Coord,
    y: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    z: Option<Coord>,
    color: String,
    hover: Option<&'a str>,
    chromosome: Option<ChromId>,
    #[serde(flatten)]
    extra: BTreeMap<&'a str, AttrValue>,
}

#[derive(Serialize)]
struct JsonTick<'a> {
    position: f64,
    label: &'a str,
}

#[derive(Serialize)]
struct JsonTable<'a> {
    columns: Vec<String>,
    rows: Vec<JsonRow<'a>>,
    color_map: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ticks: Vec<JsonTick<'a>>,
}

/// Write the table as one JSON document
pub fn write_json<W: Write>(table: &PlotTable, mut out: W) -> Result<()> {
    let rows = table
        .iter()
        .map(|(row, color)| JsonRow {
            x: row.x,
            y: row.y,
            z: row.z,
            color: color.key(),
            hover: row.hover(),
            chromosome: row.chrom,
            extra: table
                .hover_columns
                .iter()
                .map(|c| (c.as_str(), row.attr(c)))
                .collect(),
        })
        .collect();

    let document = JsonTable {
        columns: header(table),
        rows,
        color_map: &table.color_map,
        ticks: table
            .ticks
            .iter()
            .map(|(position, label)| JsonTick { position: *position, label })
            .collect(),
    };

    serde_json::to_writer(&mut out, &document).map_err(io::Error::from)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write a plot table in the requested format
pub fn write_table<W: Write>(table: &PlotTable, format: PlotFormat, out: W) -> Result<()> {
    match format {
        PlotFormat::Tsv => write_tsv(table, out),
        PlotFormat::Json => write_json(table, out),
    }
}

/// Segment report: genomic extent and resolved feature of every model segment
pub fn write_segments_tsv<W: Write>(chromosomes: &[ResolvedChromosome], mut out: W) -> Result<()> {
    writeln!(out, "chrom\tsegment\tstart_bp\tstop_bp\tlength_3d\tfeature")?;
    for c in chromosomes {
        for (segment, identity) in c.segments.iter().zip(&c.identities) {
            writeln!(
                out,
                "{}\t{}\t{:.1}\t{:.1}\t{:.4}\t{}",
                c.chrom,
                segment.index,
                segment.start_bp,
                segment.stop_bp,
                segment.length_3d,
                identity.as_ref().map_or("", |f| f.id.as_str())
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

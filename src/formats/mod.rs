//! File formats
//!
//! Structural model input and plot table output.

pub mod model;
pub mod table;

pub use model::{parse_chrom, parse_model_reader, read_model_file};
pub use table::{open_output, write_json, write_segments_tsv, write_table, write_tsv, PlotFormat};

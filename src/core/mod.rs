//! Core coordinate bookkeeping
//!
//! This module contains the data source adapter, the interleavers, the
//! arc-length remapper, the segment-locus index and the color classifier.

pub mod color;
mod error;
pub mod genome;
mod index;
mod interleave;
pub mod io;
mod pipeline;
mod plot;
mod remap;
pub mod source;

pub use color::{
    classify, viridis, BinScheme, Classification, ColorConfig, ColorKey, ColorMode, BIN_COUNT,
};
pub use error::{GenomeTraceError, Result};
pub use genome::{AttrValue, ChromId, Feature, GenomeLayout, Span, Strand, CHROMOSOME_COUNT, MITOCHONDRIAL};
pub use index::{LocusIndex, LocusInterval, ResolverConfig, DEFAULT_EXCLUDED_TYPE};
pub use interleave::{
    chromosome_shapes, default_chromosome_shapes, interleave_loci, interleave_model, ResolvedChromosome,
};
pub use pipeline::{build_linear_plot, build_model_plot, resolve_model_segments, PlotTable};
pub use plot::{with_breaks, Coord, Layer, PlotRow, SharedFeature};
pub use remap::{remap_chromosome, remap_segments, segment_lengths, GenomicSegment, Point3, StructuralModel};
pub use source::{FeatureQuery, GenomeSource, LengthCache, MemorySource, SqliteSource};

//! GenomeTrace - genome annotations and 3D structural models as plot traces
//!
//! Turns annotated genomic intervals and coarse 3D chromosome models into
//! ordered coordinate rows for a line renderer, using break rows to draw
//! many disconnected strokes in one trace.
//!
//! # Features
//!
//! - Linear genome drawing with per-strand lanes and chromosome bars
//! - Arc-length remapping of 3D model segments onto base-pair coordinates
//! - Segment to feature resolution with an interval index
//! - Continuous, binned and categorical color policies
//!
//! # Example
//!
//! ```ignore
//! use genome_trace::{ColorConfig, ColorMode, FeatureQuery, GenomeLayout, LengthCache, SqliteSource};
//!
//! let source = LengthCache::new(SqliteSource::open("SCERE.db")?);
//! let config = ColorConfig::new(ColorMode::SemiContinuous, "Expression").with_threshold(90.0);
//! let table = genome_trace::build_linear_plot(
//!     &source,
//!     &FeatureQuery::new("loci"),
//!     &GenomeLayout::default(),
//!     &config,
//! )?;
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    build_linear_plot, build_model_plot, resolve_model_segments, ChromId, ColorConfig, ColorKey,
    ColorMode, Coord, Feature, FeatureQuery, GenomeLayout, GenomeSource, GenomeTraceError,
    LengthCache, MemorySource, PlotRow, PlotTable, Point3, ResolverConfig, Result, SqliteSource,
    Strand, StructuralModel,
};
pub use formats::{model, table};

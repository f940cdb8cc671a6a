//! End-to-end plot builds
//!
//! Composes source, interleavers, remapper, resolver and classifier into the
//! two drawings: the linear genome and the 3D structural model. A failure on
//! any chromosome aborts the whole build.

use crate::core::color::{classify, ColorConfig, ColorKey};
use crate::core::error::{GenomeTraceError, Result};
use crate::core::genome::{ChromId, GenomeLayout, CHROMOSOME_COUNT};
use crate::core::index::{LocusIndex, ResolverConfig};
use crate::core::interleave::{default_chromosome_shapes, interleave_loci, interleave_model, ResolvedChromosome};
use crate::core::plot::{PlotRow, SharedFeature};
use crate::core::remap::{remap_chromosome, StructuralModel};
use crate::core::source::{FeatureQuery, GenomeSource};
use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Renderer-ready table: rows, their color column and the color map
#[derive(Debug, Clone)]
pub struct PlotTable {
    pub rows: Vec<PlotRow>,
    /// Color key per row, parallel to `rows`
    pub colors: Vec<ColorKey>,
    /// Color specification for every key
    pub color_map: BTreeMap<String, String>,
    /// Extra feature columns shown on hover
    pub hover_columns: Vec<String>,
    /// y-axis ticks (linear plots only)
    pub ticks: Vec<(f64, String)>,
}

impl PlotTable {
    pub fn is_3d(&self) -> bool {
        self.rows.first().map_or(false, |r| r.z.is_some())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with their color keys
    pub fn iter(&self) -> impl Iterator<Item = (&PlotRow, &ColorKey)> {
        self.rows.iter().zip(&self.colors)
    }
}

fn colored(rows: Vec<PlotRow>, config: &ColorConfig, ticks: Vec<(f64, String)>) -> Result<PlotTable> {
    let classification = classify(&rows, config)?;
    Ok(PlotTable {
        rows,
        colors: classification.keys,
        color_map: classification.color_map,
        hover_columns: config.hover.clone(),
        ticks,
    })
}

/// Fail when the feature table references a chromosome outside `1..=count`
fn check_table_chromosomes<S>(source: &S, query: &FeatureQuery, count: u8) -> Result<()>
where
    S: GenomeSource + ?Sized,
{
    let ids = source.chromosome_ids(query)?;
    let outside: Vec<String> = ids
        .iter()
        .filter(|&&id| ChromId::new(id).map_or(true, |c| c.get() > count))
        .map(|id| id.to_string())
        .collect();
    if outside.is_empty() {
        return Ok(());
    }
    Err(GenomeTraceError::input_shape(format!(
        "table '{}' has features on chromosome(s) {} outside 1..={}",
        query.table,
        outside.join(", "),
        count
    )))
}

/// Linear genome drawing: background bars first, then feature strokes
pub fn build_linear_plot<S: GenomeSource + ?Sized>(
    source: &S,
    query: &FeatureQuery,
    layout: &GenomeLayout,
    config: &ColorConfig,
) -> Result<PlotTable> {
    config.validate()?;
    let query = query.clone().with_columns(config.columns());
    check_table_chromosomes(source, &query, layout.chromosome_count)?;

    let mut features: Vec<SharedFeature> = Vec::new();
    for chrom in layout.chromosomes() {
        features.extend(source.features(chrom, &query)?.into_iter().map(Arc::new));
    }

    let background = default_chromosome_shapes(layout, source)?;
    let loci = interleave_loci(&features, layout)?;
    let rows: Vec<PlotRow> = background.into_iter().chain(loci).collect();

    info!(
        "linear plot: {} features, {} rows from table '{}'",
        features.len(),
        rows.len(),
        query.table
    );
    colored(rows, config, layout.ticks())
}

/// Remap every model chromosome and resolve its segments to features
pub fn resolve_model_segments<S: GenomeSource + ?Sized>(
    source: &S,
    query: &FeatureQuery,
    model: &StructuralModel,
    resolver: &ResolverConfig,
) -> Result<Vec<ResolvedChromosome>> {
    if model.is_empty() {
        return Err(GenomeTraceError::input_shape("structural model has no points"));
    }
    check_table_chromosomes(source, query, CHROMOSOME_COUNT)?;

    model
        .chromosomes()
        .map(|(chrom, points)| -> Result<ResolvedChromosome> {
            let segments = remap_chromosome(source, chrom, points)?;
            let index = LocusIndex::from_features(source.features(chrom, query)?, resolver);
            let identities = index.resolve_segments(&segments);
            Ok(ResolvedChromosome {
                chrom,
                points: points.to_vec(),
                segments,
                identities,
            })
        })
        .collect()
}

/// 3D structural model drawing colored by the features under each segment
pub fn build_model_plot<S: GenomeSource + ?Sized>(
    source: &S,
    query: &FeatureQuery,
    model: &StructuralModel,
    resolver: &ResolverConfig,
    config: &ColorConfig,
) -> Result<PlotTable> {
    config.validate()?;
    let query = query.clone().with_columns(config.columns());

    let resolved = resolve_model_segments(source, &query, model, resolver)?;
    let rows = interleave_model(&resolved)?;

    let segments: usize = resolved.iter().map(|c| c.segments.len()).sum();
    let hits: usize = resolved.iter().map(|c| c.resolved_count()).sum();
    info!(
        "model plot: {} chromosomes, {} segments, {} resolved to features",
        resolved.len(),
        segments,
        hits
    );
    colored(rows, config, Vec::new())
}

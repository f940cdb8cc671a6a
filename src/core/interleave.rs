//! Interleaving features and model segments into plot rows
//!
//! Every stroke becomes a `from, to, break` triplet, so a whole genome can be
//! drawn as one line trace with disconnected strokes.

use crate::core::error::{GenomeTraceError, Result};
use crate::core::genome::{ChromId, GenomeLayout};
use crate::core::plot::{with_breaks, PlotRow, SharedFeature};
use crate::core::remap::{GenomicSegment, Point3};
use crate::core::source::GenomeSource;
use log::debug;

/// One chromosome of a structural model after remapping and resolution
#[derive(Debug, Clone)]
pub struct ResolvedChromosome {
    pub chrom: ChromId,
    pub points: Vec<Point3>,
    pub segments: Vec<GenomicSegment>,
    /// Feature drawn by each segment, parallel to `segments`
    pub identities: Vec<Option<SharedFeature>>,
}

impl ResolvedChromosome {
    /// Number of segments that found a feature
    pub fn resolved_count(&self) -> usize {
        self.identities.iter().filter(|i| i.is_some()).count()
    }
}

/// Lay features out as horizontal strokes, chromosome by chromosome
///
/// Each feature becomes `(start, lane)`, `(stop, lane)`, break, where the
/// lane depends on its chromosome and strand. Within a chromosome features
/// keep their input order. Features without coordinates are skipped.
pub fn interleave_loci(features: &[SharedFeature], layout: &GenomeLayout) -> Result<Vec<PlotRow>> {
    for feature in features {
        layout.check(feature.chrom)?;
    }

    let rows: Vec<PlotRow> = layout
        .chromosomes()
        .flat_map(|chrom| {
            let strokes = features
                .iter()
                .filter(move |f| f.chrom == chrom)
                .filter_map(move |f| {
                    let span = f.span?;
                    let y = layout.lane(chrom, f.strand);
                    let start = PlotRow::point(span.start, y).on_chrom(chrom).drawing(Some(f.clone()));
                    let stop = PlotRow::point(span.stop, y).on_chrom(chrom).drawing(Some(f.clone()));
                    Some((start, stop))
                });
            with_breaks(strokes)
        })
        .collect();

    let skipped = features.iter().filter(|f| f.span.is_none()).count();
    debug!(
        "interleaved {} features into {} rows ({} without coordinates)",
        features.len() - skipped,
        rows.len(),
        skipped
    );
    Ok(rows)
}

/// Background bars: one line per strand lane spanning each chromosome
///
/// `upper` and `lower` hold one y value per chromosome of the layout.
pub fn chromosome_shapes<S: GenomeSource + ?Sized>(
    upper: &[f64],
    lower: &[f64],
    layout: &GenomeLayout,
    source: &S,
) -> Result<Vec<PlotRow>> {
    let count = layout.chromosome_count as usize;
    if upper.len() != count || lower.len() != count {
        return Err(GenomeTraceError::input_shape(format!(
            "lane lists have {} and {} entries for {} chromosomes",
            upper.len(),
            lower.len(),
            count
        )));
    }

    let mut strokes = Vec::with_capacity(count * 2);
    for chrom in layout.chromosomes() {
        let length = source.chromosome_length(chrom)?;
        for y in [upper[chrom.index()], lower[chrom.index()]] {
            strokes.push((
                PlotRow::point(0.0, y).on_chrom(chrom),
                PlotRow::point(length, y).on_chrom(chrom),
            ));
        }
    }

    Ok(with_breaks(strokes).collect())
}

/// Background bars on the layout's own strand lanes
pub fn default_chromosome_shapes<S: GenomeSource + ?Sized>(
    layout: &GenomeLayout,
    source: &S,
) -> Result<Vec<PlotRow>> {
    let (upper, lower) = layout.lanes();
    chromosome_shapes(&upper, &lower, layout, source)
}

/// Lay model segments out as 3D strokes
///
/// Segment `i` of a chromosome becomes `p(i)`, `p(i+1)`, break, both points
/// carrying the feature resolved for that segment. Segments without a
/// feature land on the background layer.
pub fn interleave_model(chromosomes: &[ResolvedChromosome]) -> Result<Vec<PlotRow>> {
    for c in chromosomes {
        let expected = c.points.len().saturating_sub(1);
        if c.identities.len() != expected || c.segments.len() != expected {
            return Err(GenomeTraceError::input_shape(format!(
                "chromosome {}: {} points but {} segments and {} identities",
                c.chrom,
                c.points.len(),
                c.segments.len(),
                c.identities.len()
            )));
        }
    }

    let rows = chromosomes
        .iter()
        .flat_map(|c| {
            let strokes = c.points.windows(2).zip(&c.identities).map(move |(pair, identity)| {
                let row = |p: &Point3| {
                    PlotRow::point3(p.x, p.y, p.z)
                        .on_chrom(c.chrom)
                        .drawing(identity.clone())
                };
                (row(&pair[0]), row(&pair[1]))
            });
            with_breaks(strokes)
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::genome::{Feature, Span, Strand};
    use crate::core::plot::Coord;
    use crate::core::source::MemorySource;
    use std::sync::Arc;

    fn chrom(n: i64) -> ChromId {
        ChromId::new(n).unwrap()
    }

    fn feature(id: &str, c: i64, strand: Strand, start: u64, stop: u64) -> SharedFeature {
        Arc::new(Feature::new(id, chrom(c), strand, Some(Span::new(start, stop))))
    }

    #[test]
    fn test_loci_triplets() {
        let features = vec![
            feature("b", 2, Strand::Watson, 10, 20),
            feature("a", 1, Strand::Crick, 100, 200),
            feature("c", 2, Strand::Crick, 30, 40),
        ];
        let rows = interleave_loci(&features, &GenomeLayout::default()).unwrap();
        assert_eq!(rows.len(), 9);

        // Chromosome 1 first, then chromosome 2 in table order
        assert_eq!(rows[0].hover(), Some("a"));
        assert_eq!(rows[0].x, Coord::Value(100.0));
        assert_eq!(rows[1].x, Coord::Value(200.0));
        assert!((rows[0].y.value().unwrap() - 0.2).abs() < 1e-9);
        assert!(rows[2].is_break());
        assert_eq!(rows[2].hover(), Some("a"));

        assert_eq!(rows[3].hover(), Some("b"));
        assert!((rows[3].y.value().unwrap() - 5.8).abs() < 1e-9);
        assert_eq!(rows[6].hover(), Some("c"));
        assert!((rows[6].y.value().unwrap() - 6.2).abs() < 1e-9);
    }

    #[test]
    fn test_loci_skip_missing_coordinates() {
        let features = vec![
            feature("a", 1, Strand::Watson, 1, 2),
            Arc::new(Feature::new("x", chrom(1), Strand::Watson, None)),
        ];
        let rows = interleave_loci(&features, &GenomeLayout::default()).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_loci_out_of_layout() {
        let layout = GenomeLayout { chromosome_count: 16, ..GenomeLayout::default() };
        let features = vec![feature("m", 17, Strand::Watson, 1, 2)];
        let err = interleave_loci(&features, &layout).unwrap_err();
        assert!(matches!(err, GenomeTraceError::InputShape(_)));
    }

    #[test]
    fn test_chromosome_shapes() {
        let source = MemorySource::new().with_lengths(&[1000, 2000]);
        let layout = GenomeLayout { chromosome_count: 2, ..GenomeLayout::default() };
        let (upper, lower) = layout.lanes();
        let rows = chromosome_shapes(&upper, &lower, &layout, &source).unwrap();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.is_background()));
        assert_eq!(rows[1].x, Coord::Value(1000.0));
        assert_eq!(rows[4].x, Coord::Value(1000.0));
        assert_eq!(rows[7].x, Coord::Value(2000.0));
        assert!(rows[5].is_break());
        assert!((rows[9].y.value().unwrap() - 5.8).abs() < 1e-9);
    }

    #[test]
    fn test_chromosome_shapes_lane_mismatch() {
        let source = MemorySource::new().with_lengths(&[1000]);
        let layout = GenomeLayout { chromosome_count: 1, ..GenomeLayout::default() };
        assert!(chromosome_shapes(&[0.2], &[], &layout, &source).is_err());
    }

    #[test]
    fn test_chromosome_shapes_missing_length() {
        let source = MemorySource::new().with_lengths(&[1000]);
        let layout = GenomeLayout { chromosome_count: 2, ..GenomeLayout::default() };
        let err = default_chromosome_shapes(&layout, &source).unwrap_err();
        assert!(err.is_data_source());
    }

    fn resolved(c: i64, n: usize, identities: Vec<Option<SharedFeature>>) -> ResolvedChromosome {
        let points: Vec<Point3> = (0..n).map(|i| Point3::new(i as f64, 0.0, c as f64)).collect();
        let segments = (0..n.saturating_sub(1))
            .map(|i| GenomicSegment {
                index: i,
                length_3d: 1.0,
                start_bp: i as f64,
                stop_bp: i as f64 + 1.0,
            })
            .collect();
        ResolvedChromosome { chrom: chrom(c), points, segments, identities }
    }

    #[test]
    fn test_model_rows() {
        let f = feature("YAL001C", 1, Strand::Crick, 0, 10);
        let chromosomes = vec![
            resolved(1, 3, vec![Some(f), None]),
            resolved(2, 2, vec![None]),
        ];
        let rows = interleave_model(&chromosomes).unwrap();
        assert_eq!(rows.len(), 9);

        assert_eq!(rows[0].x, Coord::Value(0.0));
        assert_eq!(rows[1].x, Coord::Value(1.0));
        assert_eq!(rows[0].hover(), Some("YAL001C"));
        assert_eq!(rows[1].hover(), Some("YAL001C"));
        assert!(rows[2].is_break());
        assert_eq!(rows[2].z, Some(Coord::Break));

        // Second segment shares point 1 and has no feature
        assert_eq!(rows[3].x, Coord::Value(1.0));
        assert!(rows[3].is_background());

        // Chromosome 2 never connects to chromosome 1
        assert_eq!(rows[6].chrom, Some(chrom(2)));
        assert_eq!(rows[6].z, Some(Coord::Value(2.0)));
    }

    #[test]
    fn test_model_identity_mismatch() {
        let chromosomes = vec![resolved(1, 3, vec![None])];
        assert!(matches!(
            interleave_model(&chromosomes),
            Err(GenomeTraceError::InputShape(_))
        ));
    }
}

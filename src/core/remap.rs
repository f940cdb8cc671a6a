//! Arc-length remapping of structural models
//!
//! A structural model is an ordered polyline of 3D points per chromosome with
//! no base-pair meaning. Remapping stretches the polyline onto the
//! chromosome's genomic length: each segment gets a share of the length
//! proportional to its Euclidean length.
//!
//! ```text
//! genomic_len(i) = |p(i+1) - p(i)| / sum_j |p(j+1) - p(j)| * chrom_length
//! start(i)       = sum_{j<i} genomic_len(j)
//! stop(i)        = start(i) + genomic_len(i)
//! ```

use crate::core::error::{GenomeTraceError, Result};
use crate::core::genome::ChromId;
use crate::core::source::GenomeSource;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Point of a structural model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Structural model: ordered points grouped by chromosome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralModel {
    chromosomes: BTreeMap<ChromId, Vec<Point3>>,
}

impl StructuralModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point to the end of `chrom`'s polyline
    pub fn push(&mut self, chrom: ChromId, point: Point3) {
        self.chromosomes.entry(chrom).or_default().push(point);
    }

    pub fn contains(&self, chrom: ChromId) -> bool {
        self.chromosomes.contains_key(&chrom)
    }

    pub fn points(&self, chrom: ChromId) -> Option<&[Point3]> {
        self.chromosomes.get(&chrom).map(|v| v.as_slice())
    }

    /// Chromosomes in ascending id order with their points
    pub fn chromosomes(&self) -> impl Iterator<Item = (ChromId, &[Point3])> {
        self.chromosomes.iter().map(|(c, p)| (*c, p.as_slice()))
    }

    pub fn total_points(&self) -> usize {
        self.chromosomes.values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}

/// Segment between two consecutive model points, placed on the genome
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenomicSegment {
    /// Position of the segment along its chromosome, from 0
    pub index: usize,
    /// Euclidean length in model units
    pub length_3d: f64,
    pub start_bp: f64,
    pub stop_bp: f64,
}

impl GenomicSegment {
    pub fn genomic_length(&self) -> f64 {
        self.stop_bp - self.start_bp
    }
}

/// Euclidean lengths of the N-1 segments joining N points
pub fn segment_lengths(points: &[Point3]) -> Vec<f64> {
    points.windows(2).map(|w| w[0].distance(&w[1])).collect()
}

/// Place each segment of `chrom`'s polyline on `[0, chrom_length]`
///
/// Fails with an input-shape error for fewer than two points, non-finite
/// coordinates or a 3D length that overflows `f64`, and with a degenerate-geometry error when all points
/// coincide. The last segment stops exactly at `chrom_length`.
///
/// # Examples
/// ```
/// use genome_trace::core::{remap_segments, ChromId, Point3};
///
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 3.0, 0.0),
/// ];
/// let segments = remap_segments(ChromId::new(1).unwrap(), &points, 1000).unwrap();
/// assert_eq!((segments[0].start_bp, segments[0].stop_bp), (0.0, 250.0));
/// assert_eq!((segments[1].start_bp, segments[1].stop_bp), (250.0, 1000.0));
/// ```
pub fn remap_segments(chrom: ChromId, points: &[Point3], chrom_length: u64) -> Result<Vec<GenomicSegment>> {
    if points.len() < 2 {
        return Err(GenomeTraceError::input_shape(format!(
            "chromosome {} has {} model point(s), need at least 2",
            chrom,
            points.len()
        )));
    }
    if let Some(i) = points.iter().position(|p| !p.is_finite()) {
        return Err(GenomeTraceError::input_shape(format!(
            "chromosome {} model point {} is not finite",
            chrom, i
        )));
    }

    let lengths = segment_lengths(points);
    let total: f64 = lengths.iter().sum();
    if !total.is_finite() {
        return Err(GenomeTraceError::input_shape(format!(
            "chromosome {} model is too large: 3D length overflows",
            chrom
        )));
    }
    if total <= 0.0 {
        return Err(GenomeTraceError::DegenerateGeometry { chrom: chrom.get() });
    }

    let genome_len = chrom_length as f64;
    let last = lengths.len() - 1;
    let mut walked = 0.0;
    let segments = lengths
        .iter()
        .enumerate()
        .map(|(index, &length_3d)| {
            let start_bp = walked / total * genome_len;
            walked += length_3d;
            let stop_bp = if index == last {
                genome_len
            } else {
                walked / total * genome_len
            };
            GenomicSegment {
                index,
                length_3d,
                start_bp,
                stop_bp,
            }
        })
        .collect();

    debug!(
        "chromosome {}: {} segments, 3D length {:.3} over {} bp",
        chrom,
        lengths.len(),
        total,
        chrom_length
    );
    Ok(segments)
}

/// Remap using the source's length for `chrom`
pub fn remap_chromosome<S: GenomeSource + ?Sized>(
    source: &S,
    chrom: ChromId,
    points: &[Point3],
) -> Result<Vec<GenomicSegment>> {
    let length = source.chromosome_length(chrom)?;
    remap_segments(chrom, points, length)
}

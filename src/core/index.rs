//! Segment-locus resolution
//!
//! Uses rust-lapper for O(log n + k) overlap queries between remapped 3D
//! segments and the features of one chromosome.

use crate::core::genome::Feature;
use crate::core::plot::SharedFeature;
use crate::core::remap::GenomicSegment;
use log::debug;
use rust_lapper::{Interval, Lapper};
use std::sync::Arc;

/// Feature type ignored by default when resolving segments
pub const DEFAULT_EXCLUDED_TYPE: &str = "CDS";

/// Type alias for locus intervals; the value is the feature's table position
pub type LocusInterval = Interval<u64, usize>;

/// Which features take part in resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Feature types never assigned to a segment
    pub excluded_types: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            excluded_types: vec![DEFAULT_EXCLUDED_TYPE.to_string()],
        }
    }
}

/// Interval index over one chromosome's features
///
/// Overlap is closed on both ends: a feature `[fs, fe]` overlaps a segment
/// `[ss, se]` when `fs <= ss <= fe` or `ss <= fs <= se`. When several
/// features overlap, the one with the smallest start wins, then the one
/// earliest in table order.
pub struct LocusIndex {
    lapper: Lapper<u64, usize>,
    features: Vec<SharedFeature>,
    skipped: usize,
}

impl LocusIndex {
    /// Build the index, dropping excluded types and features without coordinates
    pub fn new<I>(features: I, config: &ResolverConfig) -> Self
    where
        I: IntoIterator<Item = SharedFeature>,
    {
        let mut kept = Vec::new();
        let mut intervals = Vec::new();
        let mut skipped = 0;

        for feature in features {
            let span = match feature.span {
                Some(span) if !config.excluded_types.contains(&feature.feature_type) => span,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            // Stored half-open so lapper's overlap test matches the closed rule
            intervals.push(Interval {
                start: span.start,
                stop: span.stop + 1,
                val: kept.len(),
            });
            kept.push(feature);
        }

        debug!("locus index: {} candidates, {} skipped", kept.len(), skipped);

        Self {
            lapper: Lapper::new(intervals),
            features: kept,
            skipped,
        }
    }

    /// Build from owned features
    pub fn from_features(features: Vec<Feature>, config: &ResolverConfig) -> Self {
        Self::new(features.into_iter().map(Arc::new), config)
    }

    /// Number of candidate features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features left out (excluded type or no coordinates)
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// All candidates overlapping `[start_bp, stop_bp]`, in table order
    pub fn overlapping(&self, start_bp: f64, stop_bp: f64) -> Vec<&SharedFeature> {
        let mut hits: Vec<&LocusInterval> = self.query(start_bp, stop_bp).collect();
        hits.sort_by_key(|iv| iv.val);
        hits.into_iter().map(|iv| &self.features[iv.val]).collect()
    }

    /// The feature a segment resolves to, or None
    pub fn resolve(&self, start_bp: f64, stop_bp: f64) -> Option<&SharedFeature> {
        self.query(start_bp, stop_bp)
            .min_by_key(|iv| (iv.start, iv.val))
            .map(|iv| &self.features[iv.val])
    }

    /// Resolve each segment in order
    pub fn resolve_segments(&self, segments: &[GenomicSegment]) -> Vec<Option<SharedFeature>> {
        segments
            .iter()
            .map(|s| self.resolve(s.start_bp, s.stop_bp).cloned())
            .collect()
    }

    fn query(&self, start_bp: f64, stop_bp: f64) -> Box<dyn Iterator<Item = &LocusInterval> + '_> {
        if !(start_bp <= stop_bp) || stop_bp < 0.0 || !stop_bp.is_finite() {
            return Box::new(std::iter::empty());
        }
        // Whole-base window around the segment, then the closed rule on reals
        let lo = start_bp.max(0.0).floor() as u64;
        let hi = stop_bp.floor() as u64 + 1;
        Box::new(
            self.lapper
                .find(lo, hi)
                .filter(move |iv| iv.start as f64 <= stop_bp && start_bp <= (iv.stop - 1) as f64),
        )
    }
}

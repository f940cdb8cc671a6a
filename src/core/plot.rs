//! Plot rows handed to the renderer
//!
//! A plot is an ordered row sequence. A row whose coordinates are
//! [`Coord::Break`] tells a line renderer not to connect the previous row
//! to the next one, which lets many disjoint strokes share a single trace.

use crate::core::genome::{AttrValue, ChromId, Feature};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Shared handle on a feature; plot rows point back at the feature they draw
pub type SharedFeature = Arc<Feature>;

/// A plot coordinate or the line-break sentinel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coord {
    Value(f64),
    Break,
}

impl Coord {
    pub fn value(&self) -> Option<f64> {
        match self {
            Coord::Value(v) => Some(*v),
            Coord::Break => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Coord::Break)
    }
}

impl From<f64> for Coord {
    fn from(v: f64) -> Self {
        Coord::Value(v)
    }
}

impl From<u64> for Coord {
    fn from(v: u64) -> Self {
        Coord::Value(v as f64)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coord::Value(v) => write!(f, "{}", v),
            Coord::Break => write!(f, "none"),
        }
    }
}

// Breaks become JSON null, which line renderers treat as a gap
impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Coord::Value(v) => serializer.serialize_f64(*v),
            Coord::Break => serializer.serialize_none(),
        }
    }
}

/// Which layer a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Structural scaffolding: chromosome bars, unresolved 3D segments
    Background,
    /// A real annotated feature
    Feature,
}

/// One renderer row: (x, y[, z]) plus the feature it draws
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRow {
    pub x: Coord,
    pub y: Coord,
    pub z: Option<Coord>,
    pub chrom: Option<ChromId>,
    /// None on background rows
    pub feature: Option<SharedFeature>,
}

impl PlotRow {
    /// 2D row
    pub fn point(x: impl Into<Coord>, y: impl Into<Coord>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: None,
            chrom: None,
            feature: None,
        }
    }

    /// 3D row
    pub fn point3(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Coord::Value(x),
            y: Coord::Value(y),
            z: Some(Coord::Value(z)),
            chrom: None,
            feature: None,
        }
    }

    pub fn on_chrom(mut self, chrom: ChromId) -> Self {
        self.chrom = Some(chrom);
        self
    }

    pub fn drawing(mut self, feature: Option<SharedFeature>) -> Self {
        self.feature = feature;
        self
    }

    /// Break row that keeps this row's feature and chromosome
    ///
    /// The renderer groups rows by color before drawing, so the break has to
    /// fall in the same group as the stroke it ends.
    pub fn as_break(&self) -> Self {
        Self {
            x: Coord::Break,
            y: Coord::Break,
            z: self.z.map(|_| Coord::Break),
            chrom: self.chrom,
            feature: self.feature.clone(),
        }
    }

    pub fn is_break(&self) -> bool {
        self.x.is_break()
    }

    pub fn layer(&self) -> Layer {
        if self.feature.is_some() {
            Layer::Feature
        } else {
            Layer::Background
        }
    }

    pub fn is_background(&self) -> bool {
        self.layer() == Layer::Background
    }

    /// Hover identity: the feature's external id
    pub fn hover(&self) -> Option<&str> {
        self.feature.as_deref().map(|f| f.id.as_str())
    }

    /// Column value for coloring; background rows have none
    pub fn attr(&self, name: &str) -> AttrValue {
        match &self.feature {
            Some(f) => f.attr(name),
            None => AttrValue::Missing,
        }
    }
}

/// Interleave strokes with break rows: each `(from, to)` pair becomes
/// `from, to, break`
pub fn with_breaks<I>(strokes: I) -> impl Iterator<Item = PlotRow>
where
    I: IntoIterator<Item = (PlotRow, PlotRow)>,
{
    strokes.into_iter().flat_map(|(from, to)| {
        let brk = to.as_break();
        [from, to, brk]
    })
}

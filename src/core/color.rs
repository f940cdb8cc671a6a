//! Color classification
//!
//! Turns one feature column into a categorical color column under one of
//! three policies. Background rows always get a reserved key so the
//! renderer can keep scaffolding apart from real data.

use crate::core::error::{GenomeTraceError, Result};
use crate::core::plot::PlotRow;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Color for rows with no usable value
pub const NO_DATA_COLOR: &str = "lightgrey";
/// Color for the background layer
pub const BACKGROUND_COLOR: &str = "lightgrey";
/// Color for discrete values outside the configured categories
pub const OTHER_COLOR: &str = "darkgrey";

/// Reserved key for background rows
pub const BACKGROUND_KEY: &str = "background";
/// Reserved key for rows without data
pub const NO_DATA_KEY: &str = "null";
/// Reserved key for uncategorized discrete values
pub const OTHER_KEY: &str = "Other";

/// Number of semi-continuous bins (9 finite + 1 open-ended)
pub const BIN_COUNT: usize = 10;

/// Viridis sampled at 9 evenly spaced stops
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

/// Reversed viridis sequence, one color per semi-continuous bin
pub const BIN_COLORS: [&str; BIN_COUNT] = [
    "#fde725", "#b5de2b", "#6ece58", "#35b779", "#1f9e89",
    "#26828e", "#31688e", "#3e4989", "#482878", "#440154",
];

/// Color policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Linear gradient between the observed min and max
    #[default]
    Continuous,
    /// Ten labelled numeric bins
    SemiContinuous,
    /// Explicit categories with explicit colors
    Discrete,
}

impl FromStr for ColorMode {
    type Err = GenomeTraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continuous" => Ok(ColorMode::Continuous),
            "semi_continuous" | "semi-continuous" => Ok(ColorMode::SemiContinuous),
            "discreet" | "discrete" => Ok(ColorMode::Discrete),
            _ => Err(GenomeTraceError::input_shape(format!("unknown color mode '{}'", s))),
        }
    }
}

/// What to color by and how
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorConfig {
    pub mode: ColorMode,
    /// Feature column driving the color
    pub parameter: String,
    /// Discrete mode: ordered category values
    pub values: Vec<String>,
    /// Discrete mode: one color per category value
    pub colors: Vec<String>,
    /// Semi-continuous mode: cap on the binned range (unbounded when None)
    pub threshold: Option<f64>,
    /// Extra columns to show on hover
    pub hover: Vec<String>,
}

impl ColorConfig {
    pub fn new(mode: ColorMode, parameter: impl Into<String>) -> Self {
        Self {
            mode,
            parameter: parameter.into(),
            ..Self::default()
        }
    }

    pub fn with_categories(mut self, values: Vec<String>, colors: Vec<String>) -> Self {
        self.values = values;
        self.colors = colors;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_hover(mut self, hover: Vec<String>) -> Self {
        self.hover = hover;
        self
    }

    /// Columns the source has to provide for this config
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(self.parameter.clone())
            .chain(self.hover.iter().cloned())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Check the discrete category lists
    pub fn validate(&self) -> Result<()> {
        if self.mode != ColorMode::Discrete {
            return Ok(());
        }
        if self.values.is_empty() {
            return Err(GenomeTraceError::input_shape("discrete mode needs at least one category"));
        }
        if self.values.len() != self.colors.len() {
            return Err(GenomeTraceError::input_shape(format!(
                "{} categories but {} colors",
                self.values.len(),
                self.colors.len()
            )));
        }
        for (i, value) in self.values.iter().enumerate() {
            if value == BACKGROUND_KEY || value == OTHER_KEY {
                return Err(GenomeTraceError::input_shape(format!(
                    "category '{}' collides with a reserved color key",
                    value
                )));
            }
            if self.values[..i].contains(value) {
                return Err(GenomeTraceError::input_shape(format!(
                    "category '{}' listed twice",
                    value
                )));
            }
        }
        Ok(())
    }
}

/// Categorical color assigned to a row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColorKey {
    Background,
    NoData,
    Other,
    Category(String),
    Bin { index: usize, label: String },
    Rgb([u8; 3]),
}

impl ColorKey {
    /// Key written to the renderer's color column
    pub fn key(&self) -> String {
        match self {
            ColorKey::Background => BACKGROUND_KEY.to_string(),
            ColorKey::NoData => NO_DATA_KEY.to_string(),
            ColorKey::Other => OTHER_KEY.to_string(),
            ColorKey::Category(value) => value.clone(),
            ColorKey::Bin { label, .. } => label.clone(),
            ColorKey::Rgb(rgb) => rgb_string(*rgb),
        }
    }
}

fn rgb_string([r, g, b]: [u8; 3]) -> String {
    format!("rgb({}, {}, {})", r, g, b)
}

/// Semi-continuous bin boundaries for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct BinScheme {
    /// Width of each finite bin
    pub step: f64,
    /// Human-readable labels, "0-a" ... "x<"
    pub labels: Vec<String>,
}

impl BinScheme {
    /// `step = min(observed_max, threshold) / 9`
    ///
    /// Bounds are rounded to whole numbers, so a limit below about 9 repeats
    /// labels. Bins sharing a label share one color map entry, the color of
    /// the highest such bin.
    ///
    /// # Examples
    /// ```
    /// use genome_trace::core::BinScheme;
    /// let bins = BinScheme::new(95.0, 90.0);
    /// assert_eq!(bins.step, 10.0);
    /// assert_eq!(bins.labels[0], "0-10");
    /// assert_eq!(bins.labels[9], "90<");
    /// ```
    pub fn new(observed_max: f64, threshold: f64) -> Self {
        let limit = observed_max.min(threshold);
        let step = limit / (BIN_COUNT - 1) as f64;
        let bound = |k: usize| ((step * k as f64).round_ties_even() as i64).to_string();

        let labels = (0..BIN_COUNT)
            .map(|k| match k {
                0 => format!("0-{}", bound(1)),
                k if k == BIN_COUNT - 1 => format!("{}<", bound(k)),
                k => format!("{}-{}", bound(k), bound(k + 1)),
            })
            .collect();

        Self { step, labels }
    }

    /// Bin index: first k with `value <= (k+1) * step`, else the open bin
    pub fn bin(&self, value: f64) -> usize {
        (1..BIN_COUNT)
            .find(|&k| value <= self.step * k as f64)
            .map(|k| k - 1)
            .unwrap_or(BIN_COUNT - 1)
    }

    pub fn key(&self, value: f64) -> ColorKey {
        let index = self.bin(value);
        ColorKey::Bin {
            index,
            label: self.labels[index].clone(),
        }
    }
}

/// Color column plus the key → color map the renderer needs
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// One key per input row
    pub keys: Vec<ColorKey>,
    /// Color for every key that can appear
    pub color_map: BTreeMap<String, String>,
    /// Semi-continuous mode only
    pub bins: Option<BinScheme>,
}

/// Classify rows by `config.parameter`
pub fn classify(rows: &[PlotRow], config: &ColorConfig) -> Result<Classification> {
    config.validate()?;
    let classification = match config.mode {
        ColorMode::Continuous => classify_continuous(rows, &config.parameter),
        ColorMode::SemiContinuous => classify_semi_continuous(
            rows,
            &config.parameter,
            config.threshold.unwrap_or(f64::INFINITY),
        ),
        ColorMode::Discrete => classify_discrete(rows, &config.parameter, &config.values, &config.colors),
    };
    Ok(classification)
}

fn reserved_colors() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(BACKGROUND_KEY.to_string(), BACKGROUND_COLOR.to_string());
    map.insert(NO_DATA_KEY.to_string(), NO_DATA_COLOR.to_string());
    map
}

/// Interpolate the viridis ramp at `t` in [0, 1]
pub fn viridis(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let segs = (VIRIDIS.len() - 1) as f64;
    let x = t * segs;
    let i = x.floor() as usize;
    if i >= VIRIDIS.len() - 1 {
        return VIRIDIS[VIRIDIS.len() - 1];
    }
    let f = x - i as f64;
    let (c0, c1) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let lerp = |a: u8, b: u8| (a as f64 + f * (b as f64 - a as f64)).round() as u8;
    [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])]
}

/// Zero counts as no data in continuous mode
fn continuous_value(row: &PlotRow, parameter: &str) -> Option<f64> {
    row.attr(parameter).as_f64().filter(|v| v.is_finite() && *v != 0.0)
}

fn classify_continuous(rows: &[PlotRow], parameter: &str) -> Classification {
    let (min, max) = rows
        .iter()
        .filter_map(|r| continuous_value(r, parameter))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let keys: Vec<ColorKey> = rows
        .iter()
        .map(|row| {
            if row.is_background() {
                return ColorKey::Background;
            }
            match continuous_value(row, parameter) {
                Some(v) => {
                    let t = if max > min { (v - min) / (max - min) } else { 0.0 };
                    ColorKey::Rgb(viridis(t))
                }
                None => ColorKey::NoData,
            }
        })
        .collect();

    let mut color_map = reserved_colors();
    for key in &keys {
        if let ColorKey::Rgb(rgb) = key {
            color_map.entry(rgb_string(*rgb)).or_insert_with(|| rgb_string(*rgb));
        }
    }

    Classification { keys, color_map, bins: None }
}

fn classify_semi_continuous(rows: &[PlotRow], parameter: &str, threshold: f64) -> Classification {
    let observed_max = rows
        .iter()
        .filter(|r| !r.is_background())
        .filter_map(|r| r.attr(parameter).as_f64())
        .fold(f64::NEG_INFINITY, f64::max);
    let bins = BinScheme::new(if observed_max.is_finite() { observed_max } else { 0.0 }, threshold);

    let keys = rows
        .iter()
        .map(|row| {
            if row.is_background() {
                return ColorKey::Background;
            }
            match row.attr(parameter).as_f64() {
                Some(v) => bins.key(v),
                None => ColorKey::NoData,
            }
        })
        .collect();

    let mut color_map = reserved_colors();
    for (label, color) in bins.labels.iter().zip(BIN_COLORS) {
        color_map.insert(label.clone(), color.to_string());
    }

    Classification { keys, color_map, bins: Some(bins) }
}

fn classify_discrete(rows: &[PlotRow], parameter: &str, values: &[String], colors: &[String]) -> Classification {
    let keys = rows
        .iter()
        .map(|row| {
            if row.is_background() {
                return ColorKey::Background;
            }
            match row.attr(parameter).as_category() {
                Some(v) if values.contains(&v) => ColorKey::Category(v),
                _ => ColorKey::Other,
            }
        })
        .collect();

    let mut color_map = BTreeMap::new();
    color_map.insert(OTHER_KEY.to_string(), OTHER_COLOR.to_string());
    color_map.insert(BACKGROUND_KEY.to_string(), BACKGROUND_COLOR.to_string());
    for (value, color) in values.iter().zip(colors) {
        color_map.insert(value.clone(), color.clone());
    }

    Classification { keys, color_map, bins: None }
}

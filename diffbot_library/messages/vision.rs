use serde::{Deserialize, Serialize};

pub use diffbot_core::params::ColorRange;

/// Ordered list of line colors the follower traverses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSequence {
    colors: Vec<ColorRange>,
}

impl ColorSequence {
    /// Returns `None` for an empty list; a sequence always has a first color.
    pub fn new(colors: Vec<ColorRange>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColorRange> {
        self.colors.get(index)
    }

    /// Color at `index`, or the last color past the end
    pub fn color_at(&self, index: usize) -> &ColorRange {
        &self.colors[index.min(self.colors.len() - 1)]
    }

    pub fn last_index(&self) -> usize {
        self.colors.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorRange> {
        self.colors.iter()
    }
}

/// Two-stage marker confirmation thresholds
///
/// A marker is reported when its color covers at least `roi_share` of the
/// line region of interest and at least `full_frame_share` of the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerThresholds {
    pub roi_share: f64,
    pub full_frame_share: f64,
}

impl Default for MarkerThresholds {
    fn default() -> Self {
        Self {
            roi_share: 0.5,
            full_frame_share: 0.2,
        }
    }
}

/// What the line follower sees in one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisionReading {
    /// Normalized lateral offset of the line in [-1, 1]; `None` when no line
    /// of the current color is visible. Positive means the line is to the right.
    pub offset: Option<f64>,
    pub marker: bool,
}

impl VisionReading {
    pub fn line(offset: f64) -> Self {
        Self {
            offset: Some(offset),
            marker: false,
        }
    }

    pub fn no_line() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self) -> Self {
        self.marker = true;
        self
    }
}

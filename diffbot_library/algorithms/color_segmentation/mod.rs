//! Color segmentation
//!
//! Pixel-level helpers behind the vision sensor: HSV conversion with the
//! OpenCV 8-bit scale, in-range masks, the largest connected blob and the
//! two-stage marker test.
//!
//! # Example
//!
//! ```rust
//! use diffbot_library::algorithms::color_segmentation::{line_offset, rgb_to_hsv};
//! use diffbot_library::messages::ColorRange;
//! use image::{GrayImage, Luma, Rgb, RgbImage};
//!
//! assert_eq!(rgb_to_hsv(Rgb([255, 0, 0])), [0, 255, 255]);
//!
//! let frame = RgbImage::from_pixel(64, 48, Rgb([255, 255, 0]));
//! let offset = line_offset(&frame, &ColorRange::yellow(), 20, 0.03);
//! assert_eq!(offset, Some(0.0));
//! ```

use crate::messages::{ColorRange, MarkerThresholds};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Convert one RGB pixel to HSV (H in [0, 180], S and V in [0, 255])
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0;
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        max as u8,
    ]
}

/// Binary mask over a horizontal band of a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize]
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&set| set).count()
    }

    /// Fraction of set pixels; an empty mask has share 0
    pub fn share(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.count() as f64 / self.data.len() as f64
        }
    }
}

/// Mask of the pixels inside `range`, restricted to the bottom `rows` rows
///
/// `rows` larger than the frame selects the whole frame.
pub fn color_mask(frame: &RgbImage, range: &ColorRange, rows: u32) -> Mask {
    let (width, height) = frame.dimensions();
    let rows = rows.min(height);
    let top = height - rows;

    let mut data = Vec::with_capacity((width * rows) as usize);
    for y in top..height {
        for x in 0..width {
            data.push(range.contains(rgb_to_hsv(*frame.get_pixel(x, y))));
        }
    }
    Mask {
        width,
        height: rows,
        data,
    }
}

/// A 4-connected group of set mask pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub area: usize,
    /// Centroid in pixel-center coordinates of the mask
    pub centroid_x: f64,
    pub centroid_y: f64,
}

impl Mask {
    fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }
}

/// Largest 4-connected blob of the mask
///
/// Ties keep the component whose first pixel comes first in raster order.
pub fn largest_blob(mask: &Mask) -> Option<Blob> {
    if mask.count() == 0 {
        return None;
    }
    let labels = connected_components(&mask.to_luma(), Connectivity::Four, Luma([0u8]));

    // per label: area, first raster index, sum of x and y pixel centers
    let mut components: Vec<(usize, usize, f64, f64)> = Vec::new();
    for (index, (x, y, label)) in labels.enumerate_pixels().enumerate() {
        let label = label.0[0] as usize;
        if label == 0 {
            continue;
        }
        if components.len() < label {
            components.resize(label, (0, usize::MAX, 0.0, 0.0));
        }
        let entry = &mut components[label - 1];
        entry.0 += 1;
        entry.1 = entry.1.min(index);
        entry.2 += x as f64 + 0.5;
        entry.3 += y as f64 + 0.5;
    }

    components
        .into_iter()
        .filter(|c| c.0 > 0)
        .min_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)))
        .map(|(area, _, sum_x, sum_y)| Blob {
            area,
            centroid_x: sum_x / area as f64,
            centroid_y: sum_y / area as f64,
        })
}

/// Normalized lateral offset of the line in the bottom `roi_rows` rows
///
/// Returns `None` when the largest blob of `range` covers less than
/// `min_area` of the region. The offset is in [-1, 1], positive to the right.
pub fn line_offset(frame: &RgbImage, range: &ColorRange, roi_rows: u32, min_area: f64) -> Option<f64> {
    let mask = color_mask(frame, range, roi_rows);
    if mask.width == 0 || mask.height == 0 {
        return None;
    }
    let blob = largest_blob(&mask)?;
    let region = (mask.width * mask.height) as f64;
    if (blob.area as f64) < min_area * region {
        return None;
    }

    let half_width = mask.width as f64 / 2.0;
    Some(((blob.centroid_x - half_width) / half_width).clamp(-1.0, 1.0))
}

/// Two-stage marker test
///
/// The marker color must cover `roi_share` of the line region and then be
/// confirmed over the whole frame with `full_frame_share`, which rejects a
/// patch that only happens to fill the narrow region.
pub fn marker_present(
    frame: &RgbImage,
    range: &ColorRange,
    thresholds: &MarkerThresholds,
    roi_rows: u32,
) -> bool {
    let local = color_mask(frame, range, roi_rows);
    if local.share() < thresholds.roi_share || local.count() == 0 {
        return false;
    }
    let full = color_mask(frame, range, frame.height());
    full.share() >= thresholds.full_frame_share
}

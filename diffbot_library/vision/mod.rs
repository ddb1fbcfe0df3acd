//! Vision sensors
//!
//! A [`VisionSensor`] yields RGB frames; line and marker detection default
//! to the HSV segmentation in [`crate::algorithms::color_segmentation`], so
//! a frame source only has to implement `capture_frame`.
//!
//! - [`ImageSequence`]: replays image files or in-memory frames
//! - [`OpenCvCamera`]: live capture (feature `opencv-backend`)

#[cfg(feature = "opencv-backend")]
mod opencv_camera;

#[cfg(feature = "opencv-backend")]
pub use opencv_camera::OpenCvCamera;

use crate::algorithms::color_segmentation;
use crate::messages::{ColorRange, MarkerThresholds};
use diffbot_core::error::{DiffbotError, DiffbotResult};
use diffbot_core::params::VisionParams;
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Frame source plus line/marker detection
pub trait VisionSensor: Send {
    /// Next frame, or `None` when no frame is available this tick
    fn capture_frame(&mut self) -> DiffbotResult<Option<RgbImage>>;

    /// Segmentation settings used by the default detectors
    fn vision_params(&self) -> &VisionParams;

    /// Normalized lateral offset of the line of `color`, if visible
    fn detect_line(&self, frame: &RgbImage, color: &ColorRange) -> Option<f64> {
        let p = self.vision_params();
        color_segmentation::line_offset(frame, color, p.roi_rows, p.min_line_area)
    }

    fn detect_marker(
        &self,
        frame: &RgbImage,
        marker: &ColorRange,
        thresholds: &MarkerThresholds,
    ) -> bool {
        color_segmentation::marker_present(frame, marker, thresholds, self.vision_params().roi_rows)
    }
}

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

enum Frame {
    File(PathBuf),
    Memory(RgbImage),
}

/// Replays a fixed list of frames, then reports no frame
///
/// # Example
/// ```rust
/// use diffbot_core::params::VisionParams;
/// use diffbot_library::vision::{ImageSequence, VisionSensor};
/// use image::{Rgb, RgbImage};
///
/// let frame = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
/// let mut seq = ImageSequence::from_frames(vec![frame], VisionParams::default());
/// assert!(seq.capture_frame().unwrap().is_some());
/// assert!(seq.capture_frame().unwrap().is_none());
/// ```
pub struct ImageSequence {
    frames: VecDeque<Frame>,
    params: VisionParams,
    delivered: u64,
}

impl ImageSequence {
    pub fn from_frames(frames: Vec<RgbImage>, params: VisionParams) -> Self {
        Self {
            frames: frames.into_iter().map(Frame::Memory).collect(),
            params,
            delivered: 0,
        }
    }

    /// All image files of `dir`, in file name order
    pub fn from_dir(dir: impl AsRef<Path>, params: VisionParams) -> DiffbotResult<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| {
                DiffbotError::InitializationFailed(format!(
                    "cannot open frame directory {}: {}",
                    dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if paths.is_empty() {
            return Err(DiffbotError::NotFound(format!(
                "no image files in {}",
                dir.display()
            )));
        }
        paths.sort();

        tracing::info!(dir = %dir.display(), frames = paths.len(), "replaying recorded frames");
        Ok(Self {
            frames: paths.into_iter().map(Frame::File).collect(),
            params,
            delivered: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl VisionSensor for ImageSequence {
    fn capture_frame(&mut self) -> DiffbotResult<Option<RgbImage>> {
        let frame = match self.frames.pop_front() {
            None => return Ok(None),
            Some(Frame::Memory(image)) => image,
            Some(Frame::File(path)) => image::open(&path)
                .map_err(|e| DiffbotError::Vision(format!("cannot decode {}: {}", path.display(), e)))?
                .to_rgb8(),
        };
        self.delivered += 1;
        Ok(Some(frame))
    }

    fn vision_params(&self) -> &VisionParams {
        &self.params
    }
}

use super::VisionSensor;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use diffbot_core::params::VisionParams;
use image::RgbImage;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{VideoCapture, CAP_ANY};

/// Live camera through OpenCV's `VideoCapture`
pub struct OpenCvCamera {
    capture: VideoCapture,
    params: VisionParams,
}

impl OpenCvCamera {
    pub fn open(params: VisionParams) -> DiffbotResult<Self> {
        let capture = VideoCapture::new(params.camera_id as i32, CAP_ANY).map_err(|e| {
            DiffbotError::InitializationFailed(format!("camera {}: {}", params.camera_id, e))
        })?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(DiffbotError::InitializationFailed(format!(
                "camera {} could not be opened",
                params.camera_id
            )));
        }
        tracing::info!(camera_id = params.camera_id, "camera opened");
        Ok(Self { capture, params })
    }
}

/// Copy a continuous 8-bit BGR `Mat` into an RGB image
fn bgr_mat_to_rgb(frame: &Mat) -> DiffbotResult<RgbImage> {
    if frame.channels() != 3 {
        return Err(DiffbotError::Vision(format!(
            "expected 3 channels, got {}",
            frame.channels()
        )));
    }
    let (cols, rows) = (frame.cols() as u32, frame.rows() as u32);
    let bytes = frame
        .data_bytes()
        .map_err(|e| DiffbotError::Vision(format!("frame not readable: {}", e)))?;

    let mut rgb = Vec::with_capacity(bytes.len());
    for bgr in bytes.chunks_exact(3) {
        rgb.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
    }
    RgbImage::from_raw(cols, rows, rgb)
        .ok_or_else(|| DiffbotError::Vision("frame size does not match its data".to_string()))
}

impl VisionSensor for OpenCvCamera {
    fn capture_frame(&mut self) -> DiffbotResult<Option<RgbImage>> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| DiffbotError::Vision(format!("capture failed: {}", e)))?;
        if !grabbed || frame.empty() {
            return Ok(None);
        }
        bgr_mat_to_rgb(&frame).map(Some)
    }

    fn vision_params(&self) -> &VisionParams {
        &self.params
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!(error = %e, "camera release failed");
        }
    }
}

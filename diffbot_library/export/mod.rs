//! Trajectory export
//!
//! The decimated pose history can be written as a PNG map (path from a green
//! start mark to a red end mark with a heading tick) or as JSON samples.

use crate::messages::TrajectorySample;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([200, 200, 200]);
const PATH: Rgb<u8> = Rgb([30, 90, 200]);
const START: Rgb<u8> = Rgb([0, 160, 0]);
const END: Rgb<u8> = Rgb([210, 0, 0]);

/// Smallest world extent shown (m), so a robot that barely moved still gets
/// a readable map
const MIN_SPAN: f64 = 0.2;
const MARGIN_PX: f64 = 20.0;
const HEADING_TICK_PX: f64 = 18.0;

/// Maps world coordinates (m, y up) to pixels (y down) with equal scaling
struct Viewport {
    min_x: f64,
    min_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height: u32,
}

impl Viewport {
    fn fit(samples: &[TrajectorySample], width: u32, height: u32) -> Self {
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for s in samples {
            min_x = min_x.min(s.x);
            max_x = max_x.max(s.x);
            min_y = min_y.min(s.y);
            max_y = max_y.max(s.y);
        }
        let span_x = (max_x - min_x).max(MIN_SPAN);
        let span_y = (max_y - min_y).max(MIN_SPAN);
        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;

        let usable_w = (width as f64 - 2.0 * MARGIN_PX).max(1.0);
        let usable_h = (height as f64 - 2.0 * MARGIN_PX).max(1.0);
        let scale = (usable_w / span_x).min(usable_h / span_y);

        // center the drawing in both directions
        let min_x = center_x - usable_w / scale / 2.0;
        let min_y = center_y - usable_h / scale / 2.0;
        Self {
            min_x,
            min_y,
            scale,
            offset_x: MARGIN_PX,
            offset_y: MARGIN_PX,
            height,
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = self.offset_x + (x - self.min_x) * self.scale;
        let py = self.height as f64 - (self.offset_y + (y - self.min_y) * self.scale);
        (px, py)
    }
}

fn pixel(at: (f64, f64)) -> (f32, f32) {
    (at.0.round() as f32, at.1.round() as f32)
}

/// Line between two pixel positions; out-of-canvas parts are clipped
fn draw_line(image: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    draw_line_segment_mut(image, pixel(from), pixel(to), color);
}

/// Filled square of side `2 * radius + 1` centered on `at`
fn draw_mark(image: &mut RgbImage, at: (f64, f64), radius: u32, color: Rgb<u8>) {
    let (cx, cy) = (at.0.round() as i32, at.1.round() as i32);
    let r = radius as i32;
    let side = 2 * radius + 1;
    draw_filled_rect_mut(image, Rect::at(cx - r, cy - r).of_size(side, side), color);
}

/// Rasterize a trajectory into a `width` x `height` map
pub fn render_trajectory(
    samples: &[TrajectorySample],
    width: u32,
    height: u32,
) -> DiffbotResult<RgbImage> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(DiffbotError::InvalidInput(
                "cannot render an empty trajectory".to_string(),
            ))
        }
    };

    let view = Viewport::fit(samples, width, height);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    // world axes through the origin
    let (ox, oy) = view.to_pixel(0.0, 0.0);
    draw_line(&mut image, (0.0, oy), (width as f64, oy), AXIS);
    draw_line(&mut image, (ox, 0.0), (ox, height as f64), AXIS);

    for pair in samples.windows(2) {
        let a = view.to_pixel(pair[0].x, pair[0].y);
        let b = view.to_pixel(pair[1].x, pair[1].y);
        draw_line(&mut image, a, b, PATH);
    }

    draw_mark(&mut image, view.to_pixel(first.x, first.y), 3, START);
    let end = view.to_pixel(last.x, last.y);
    let heading = last.heading.to_radians();
    let tip = (
        end.0 + HEADING_TICK_PX * heading.cos(),
        end.1 - HEADING_TICK_PX * heading.sin(),
    );
    draw_line(&mut image, end, tip, END);
    draw_mark(&mut image, end, 3, END);
    Ok(image)
}

/// Write the trajectory map as a PNG file
pub fn save_trajectory_png(samples: &[TrajectorySample], path: impl AsRef<Path>) -> DiffbotResult<()> {
    let path = path.as_ref();
    let image = render_trajectory(samples, 800, 800)?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DiffbotError::Serialization(format!("cannot write {}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), samples = samples.len(), "trajectory map saved");
    Ok(())
}

pub fn save_trajectory_json(samples: &[TrajectorySample], path: impl AsRef<Path>) -> DiffbotResult<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, samples)?;
    tracing::info!(path = %path.display(), samples = samples.len(), "trajectory samples saved");
    Ok(())
}

pub fn load_trajectory_json(path: impl AsRef<Path>) -> DiffbotResult<Vec<TrajectorySample>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

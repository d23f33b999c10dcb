//! Static Chart Renderer
//! Rasterises figures into PNG files at print resolution.
//!
//! Figures are drawn with plotters into an in-memory RGB buffer sized as
//! inches x DPI, cropped to their drawn content plus a small pad (a tight
//! bounding box) and encoded with the `image` crate.

use image::{imageops, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Output resolution in dots per inch.
pub const DPI: f64 = 300.0;
/// White border kept around the drawn content.
pub const TIGHT_PAD_INCHES: f64 = 0.1;

// Colors
pub const EMIGRATION_COLOR: RGBColor = RGBColor(31, 119, 180); // tab:blue
pub const KNIFE_CRIME_COLOR: RGBColor = RGBColor(214, 39, 40); // tab:red
pub const TREND_COLOR: RGBColor = RGBColor(255, 127, 14); // tab:orange
pub const GRID_COLOR: RGBColor = RGBColor(176, 176, 176);

// Viridis anchors at 0, 0.25, 0.5, 0.75, 1
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Bitmap buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("Failed to save image: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Nothing to draw: {0}")]
    Empty(String),
}

impl RenderError {
    pub fn drawing<E: Display>(err: E) -> Self {
        RenderError::Drawing(err.to_string())
    }
}

/// Pixel size of a figure measured in inches.
pub fn figure_pixels(width_in: f64, height_in: f64) -> (u32, u32) {
    ((width_in * DPI).round() as u32, (height_in * DPI).round() as u32)
}

/// Font points to pixels at `DPI`.
pub fn pt(points: f64) -> u32 {
    (points * DPI / 72.0).round() as u32
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Draw a figure of `size` pixels with `draw` and save it to `path` as PNG.
    pub fn render_png<F>(path: &Path, size: (u32, u32), draw: F) -> Result<(), RenderError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), RenderError>,
    {
        let (width, height) = size;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            root.fill(&WHITE).map_err(RenderError::drawing)?;
            draw(&root)?;
            root.present().map_err(RenderError::drawing)?;
        }

        let image =
            RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer(width, height))?;
        let pad = (TIGHT_PAD_INCHES * DPI).round() as u32;
        let cropped = Self::tight_crop(&image, pad);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        cropped.save(path)?;

        info!(
            path = %path.display(),
            width = cropped.width(),
            height = cropped.height(),
            "saved figure"
        );
        Ok(())
    }

    /// Crop to the non-white content plus `pad` pixels on each side.
    pub fn tight_crop(image: &RgbImage, pad: u32) -> RgbImage {
        let (width, height) = image.dimensions();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel.0 == [255, 255, 255] {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }

        let Some((x0, y0, x1, y1)) = bounds else {
            return image.clone();
        };

        let left = x0.saturating_sub(pad);
        let top = y0.saturating_sub(pad);
        let right = (x1 + pad + 1).min(width);
        let bottom = (y1 + pad + 1).min(height);
        imageops::crop_imm(image, left, top, right - left, bottom - top).to_image()
    }

    /// Continuous viridis color for `t` in [0, 1].
    pub fn viridis(t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (VIRIDIS.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
        let frac = scaled - lower as f64;

        let (r0, g0, b0) = VIRIDIS[lower];
        let (r1, g1, b1) = VIRIDIS[lower + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// Position of `value` inside `[min, max]` as a fraction.
    pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
        if max <= min {
            return 0.5;
        }
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }

    /// Data range of `values` with `frac` padding on both ends.
    pub fn padded_range(values: impl IntoIterator<Item = f64>, frac: f64) -> (f64, f64) {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if min.is_infinite() {
            return (0.0, 1.0);
        }
        if max - min < 1e-12 {
            let half = if min == 0.0 { 0.5 } else { min.abs() * 0.05 };
            return (min - half, max + half);
        }
        let pad = (max - min) * frac;
        (min - pad, max + pad)
    }

    /// Round tick step near `range / target_steps` (1, 2 or 5 times a power of ten).
    pub fn nice_step(range: f64, target_steps: usize) -> f64 {
        let raw_step = range / target_steps as f64;
        let magnitude = 10f64.powf(raw_step.log10().floor());
        let normalized = raw_step / magnitude;

        let nice = if normalized <= 1.0 {
            1.0
        } else if normalized <= 2.0 {
            2.0
        } else if normalized <= 5.0 {
            5.0
        } else {
            10.0
        };

        nice * magnitude
    }

    /// Tick values on nice steps inside `[min, max]`.
    pub fn axis_ticks(min: f64, max: f64, target_steps: usize) -> Vec<f64> {
        if !(max > min) || target_steps == 0 {
            return vec![min];
        }
        let step = Self::nice_step(max - min, target_steps);
        let first = (min / step).ceil() as i64;
        let last = (max / step + 1e-9).floor() as i64;

        // Round away float drift such as 0.6000000000000001.
        let decimals = (-step.log10().floor()).max(0.0) as i32 + 1;
        let scale = 10f64.powi(decimals);
        (first..=last)
            .map(|k| (k as f64 * step * scale).round() / scale)
            .collect()
    }

    /// Tick label with as many decimals as the tick spacing needs.
    pub fn format_tick(value: f64, ticks: &[f64]) -> String {
        let step = ticks
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(f64::INFINITY, f64::min);
        let decimals = if step.is_finite() && step > 0.0 && step < 1.0 {
            (-step.log10().floor()) as usize
        } else {
            0
        };
        format!("{:.*}", decimals, value)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop rectangle selection and percentile-based contrast stretching.

use folio_core::{CropRect, DetectionResult};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::stats::percentile;
use tracing::{debug, info, instrument};

use super::grayscale::luma;

/// What contrast normalisation measured and whether it changed the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContrastDecision {
    /// Lower luminance percentile before stretching.
    pub low: u8,
    /// Upper luminance percentile before stretching.
    pub high: u8,
    pub stretched: bool,
}

impl ContrastDecision {
    pub fn range(&self) -> u8 {
        self.high.saturating_sub(self.low)
    }
}

/// Crop rectangle for a detection already mapped to full resolution.
///
/// A found page is grown by `margin_ratio` of its own width/height on every
/// side and clamped to the image. No detection means the whole image.
pub fn crop_rect(detection: &DetectionResult, width: u32, height: u32, margin_ratio: f32) -> CropRect {
    let Some(quad) = detection.corners else {
        return CropRect::full(width, height);
    };

    let margin_x = quad.width() * margin_ratio;
    let margin_y = quad.height() * margin_ratio;
    let clamp_x = |v: f32| v.clamp(0.0, width as f32) as u32;
    let clamp_y = |v: f32| v.clamp(0.0, height as f32) as u32;

    let left = clamp_x((quad.left() - margin_x).floor());
    let top = clamp_y((quad.top() - margin_y).floor());
    let right = clamp_x((quad.right() + margin_x).ceil());
    let bottom = clamp_y((quad.bottom() + margin_y).ceil());

    CropRect {
        x: left,
        y: top,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
    }
}

/// Rounded luma of every pixel.
pub fn luminance_map(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Luma([luma(r, g, b).round().clamp(0.0, 255.0) as u8])
    })
}

/// Linearly stretch R, G and B so the `[low_pct, high_pct]` luminance
/// percentiles map onto `[0, 255]`.
///
/// Images whose percentile range already exceeds `skip_range` are returned
/// untouched, as are flat images with a zero range. Alpha is never changed.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn stretch_contrast(
    mut image: RgbaImage,
    low_pct: u8,
    high_pct: u8,
    skip_range: u8,
) -> (RgbaImage, ContrastDecision) {
    let luminance = luminance_map(&image);
    let low = percentile(&luminance, low_pct);
    let high = percentile(&luminance, high_pct);
    let mut decision = ContrastDecision {
        low,
        high,
        stretched: false,
    };
    debug!(low, high, range = decision.range(), "Luminance percentiles");

    if decision.range() == 0 || decision.range() > skip_range {
        info!(range = decision.range(), "Contrast normalisation skipped");
        return (image, decision);
    }

    let lut = stretch_table(low, high);
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = lut[*channel as usize];
        }
    }
    decision.stretched = true;
    info!(low, high, "Contrast stretched to full range");
    (image, decision)
}

/// Lookup table mapping `low..=high` onto `0..=255`, clamped outside.
fn stretch_table(low: u8, high: u8) -> [u8; 256] {
    let scale = 255.0 / (high - low) as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let stretched = (value as f32 - low as f32) * scale;
        *slot = stretched.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Quad;
    use image::Rgba;

    fn gray_ramp(width: u32, from: u8, step_every: u32) -> RgbaImage {
        RgbaImage::from_fn(width, 4, |x, _| {
            let v = from.saturating_add((x / step_every) as u8);
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn full_frame_when_nothing_found() {
        let rect = crop_rect(&DetectionResult::not_found(), 800, 600, 0.08);
        assert_eq!(rect, CropRect::full(800, 600));
    }

    #[test]
    fn margin_grows_the_page() {
        let detection = DetectionResult::found(Quad::from_bounds(100.0, 100.0, 600.0, 500.0));
        let rect = crop_rect(&detection, 1000, 1000, 0.08);
        // 8% of 500 wide = 40, 8% of 400 tall = 32.
        assert_eq!(rect, CropRect { x: 60, y: 68, width: 580, height: 464 });
    }

    #[test]
    fn margin_is_clamped_to_image() {
        let detection = DetectionResult::found(Quad::from_bounds(10.0, 5.0, 390.0, 295.0));
        let rect = crop_rect(&detection, 400, 300, 0.08);
        assert_eq!(rect, CropRect::full(400, 300));
    }

    #[test]
    fn wide_range_is_left_alone() {
        let image = gray_ramp(256, 0, 1);
        let (out, decision) = stretch_contrast(image.clone(), 1, 99, 200);
        assert!(!decision.stretched);
        assert!(decision.range() > 200);
        assert_eq!(out, image);
    }

    #[test]
    fn narrow_range_is_stretched_within_bounds() {
        let image = gray_ramp(100, 100, 2);
        let (out, decision) = stretch_contrast(image, 1, 99, 200);
        assert!(decision.stretched);
        assert_eq!((decision.low, decision.high), (100, 149));

        let after = luminance_map(&out);
        let new_range = percentile(&after, 99) - percentile(&after, 1);
        assert!(new_range > decision.range(), "range did not grow: {new_range}");
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(99, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn alpha_survives_stretching() {
        let image = RgbaImage::from_fn(10, 10, |x, _| Rgba([90 + x as u8 * 5, 100, 110, 42]));
        let (out, decision) = stretch_contrast(image, 1, 99, 200);
        assert!(decision.stretched);
        assert!(out.pixels().all(|p| p.0[3] == 42));
    }

    #[test]
    fn flat_image_is_not_stretched() {
        let image = RgbaImage::from_pixel(50, 50, Rgba([128, 128, 128, 255]));
        let (out, decision) = stretch_contrast(image.clone(), 1, 99, 200);
        assert_eq!(decision.range(), 0);
        assert!(!decision.stretched);
        assert_eq!(out, image);
    }

    #[test]
    fn stretch_table_endpoints() {
        // A range of 85 gives an exact scale of 3.
        let lut = stretch_table(55, 140);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[55], 0);
        assert_eq!(lut[100], 135);
        assert_eq!(lut[140], 255);
        assert_eq!(lut[255], 255);
    }
}

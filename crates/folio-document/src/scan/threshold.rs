// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive (local-mean) binarization backed by an integral image.

use image::Luma;
use tracing::{debug, instrument};

use super::{BinaryMask, ScalarField};

/// Mask value for pixels at or above `local mean - C`.
pub const FOREGROUND: u8 = 0;
/// Mask value for pixels darker than `local mean - C`.
pub const BACKGROUND: u8 = 255;

/// Summed-area table of a field.
///
/// `table[y * (width+1) + x]` holds the sum of all samples in the rectangle
/// `[0, x) x [0, y)`, so the table is `(width+1) x (height+1)` with a zero
/// first row and column.
struct IntegralImage {
    width: usize,
    height: usize,
    table: Vec<f64>,
}

impl IntegralImage {
    fn new(field: &ScalarField) -> Self {
        let (w, h) = (field.width() as usize, field.height() as usize);
        let stride = w + 1;
        let mut table = vec![0.0f64; stride * (h + 1)];
        let samples = field.as_raw();

        for y in 0..h {
            let mut row_sum = 0.0f64;
            for x in 0..w {
                row_sum += samples[y * w + x] as f64;
                table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
            }
        }

        Self {
            width: w,
            height: h,
            table,
        }
    }

    /// Sum over `[x1, x2) x [y1, y2)`.
    fn box_sum(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        let stride = self.width + 1;
        self.table[y2 * stride + x2] - self.table[y1 * stride + x2] - self.table[y2 * stride + x1]
            + self.table[y1 * stride + x1]
    }

    /// Mean of the `(2r+1) x (2r+1)` window centred on `(cx, cy)`, clipped
    /// to the image.
    fn window_mean(&self, cx: usize, cy: usize, radius: usize) -> f64 {
        let x1 = cx.saturating_sub(radius);
        let y1 = cy.saturating_sub(radius);
        let x2 = (cx + radius + 1).min(self.width);
        let y2 = (cy + radius + 1).min(self.height);
        let area = ((x2 - x1) * (y2 - y1)) as f64;
        self.box_sum(x1, y1, x2, y2) / area
    }
}

/// Binarize `blurred` against its local mean.
///
/// A pixel is `FOREGROUND` (0) when `value > mean - offset`, otherwise
/// `BACKGROUND` (255). Note the polarity: uniform or brighter-than-local
/// regions map to 0, and the dark side of an intensity step maps to 255.
#[instrument(skip(blurred), fields(width = blurred.width(), height = blurred.height()))]
pub fn adaptive_threshold(blurred: &ScalarField, radius: u32, offset: f32) -> BinaryMask {
    let (w, h) = blurred.dimensions();
    let integral = IntegralImage::new(blurred);
    let offset = offset as f64;
    let radius = radius as usize;

    let mask = BinaryMask::from_fn(w, h, |x, y| {
        let mean = integral.window_mean(x as usize, y as usize, radius);
        let value = blurred.get_pixel(x, y).0[0] as f64;
        Luma([if value > mean - offset { FOREGROUND } else { BACKGROUND }])
    });

    debug!(
        background = mask.pixels().filter(|p| p.0[0] == BACKGROUND).count(),
        "Adaptive threshold complete"
    );
    mask
}

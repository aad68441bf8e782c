// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canny-style edge extraction: Sobel gradients, non-maximum suppression along
// the quantized gradient direction, and two-threshold hysteresis.

use image::Luma;
use tracing::{debug, instrument};

use super::{BinaryMask, ScalarField};

/// Hysteresis label for pixels at or above the high threshold.
pub const STRONG: u8 = 255;
/// Hysteresis label for pixels between the thresholds. Never survives into
/// the returned mask.
pub const WEAK: u8 = 128;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per-pixel gradient magnitude and direction (radians, `atan2(gy, gx)`).
#[derive(Clone, Debug)]
pub struct Gradient {
    pub magnitude: ScalarField,
    pub direction: ScalarField,
}

/// Direction bins over [0°, 180°).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionBin {
    Horizontal,
    Diagonal45,
    Vertical,
    Diagonal135,
}

impl DirectionBin {
    fn from_radians(angle: f32) -> Self {
        let mut degrees = angle.to_degrees();
        if degrees < 0.0 {
            degrees += 180.0;
        }
        if !(22.5..157.5).contains(&degrees) {
            Self::Horizontal
        } else if degrees < 67.5 {
            Self::Diagonal45
        } else if degrees < 112.5 {
            Self::Vertical
        } else {
            Self::Diagonal135
        }
    }

    /// Offsets of the two neighbours lying along the gradient, in image
    /// coordinates (y grows downwards).
    fn neighbour_offsets(self) -> [(i64, i64); 2] {
        match self {
            Self::Horizontal => [(-1, 0), (1, 0)],
            Self::Diagonal45 => [(-1, -1), (1, 1)],
            Self::Vertical => [(0, -1), (0, 1)],
            Self::Diagonal135 => [(1, -1), (-1, 1)],
        }
    }
}

/// Sobel gradients of `field`. The one-pixel frame is left at zero.
pub fn sobel(field: &ScalarField) -> Gradient {
    let (w, h) = field.dimensions();
    let mut magnitude = ScalarField::new(w, h);
    let mut direction = ScalarField::new(w, h);
    if w < 3 || h < 3 {
        return Gradient {
            magnitude,
            direction,
        };
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut gx = 0.0f32;
            let mut gy = 0.0f32;
            for (ky, (row_x, row_y)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
                for kx in 0..3 {
                    let sample = field.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1).0[0];
                    gx += sample * row_x[kx];
                    gy += sample * row_y[kx];
                }
            }
            magnitude.put_pixel(x, y, Luma([(gx * gx + gy * gy).sqrt()]));
            direction.put_pixel(x, y, Luma([gy.atan2(gx)]));
        }
    }

    Gradient {
        magnitude,
        direction,
    }
}

/// Thin gradient ridges: keep a pixel only if its magnitude is at least that
/// of both neighbours along its quantized gradient direction.
///
/// Ties survive, so the two-pixel plateau a hard binary step produces is
/// kept rather than erased.
pub fn non_max_suppression(gradient: &Gradient) -> ScalarField {
    let (w, h) = gradient.magnitude.dimensions();
    let mut thinned = ScalarField::new(w, h);
    if w < 3 || h < 3 {
        return thinned;
    }

    let magnitude = &gradient.magnitude;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mag = magnitude.get_pixel(x, y).0[0];
            if mag <= 0.0 {
                continue;
            }
            let bin = DirectionBin::from_radians(gradient.direction.get_pixel(x, y).0[0]);
            let is_max = bin.neighbour_offsets().iter().all(|&(dx, dy)| {
                let nx = (x as i64 + dx) as u32;
                let ny = (y as i64 + dy) as u32;
                mag >= magnitude.get_pixel(nx, ny).0[0]
            });
            if is_max {
                thinned.put_pixel(x, y, Luma([mag]));
            }
        }
    }

    thinned
}

/// Two-threshold edge classification with 8-connected promotion.
///
/// Thresholds are fractions of the maximum magnitude. Weak pixels touching a
/// strong pixel are promoted until a full pass promotes nothing; whatever is
/// still weak is then dropped. The result holds only 0 and 255.
#[instrument(skip(thinned), fields(width = thinned.width(), height = thinned.height()))]
pub fn hysteresis(thinned: &ScalarField, low_ratio: f32, high_ratio: f32) -> BinaryMask {
    let (w, h) = thinned.dimensions();
    let max = thinned.as_raw().iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        debug!("Flat gradient field; no edges");
        return BinaryMask::new(w, h);
    }

    let high = max * high_ratio;
    let low = max * low_ratio;
    let mut labels = BinaryMask::from_fn(w, h, |x, y| {
        let mag = thinned.get_pixel(x, y).0[0];
        Luma([if mag >= high {
            STRONG
        } else if mag >= low && mag > 0.0 {
            WEAK
        } else {
            0
        }])
    });

    let mut passes = 0usize;
    loop {
        // Alternate raster direction so chains running against the scan
        // order do not need one pass per pixel.
        let forward = passes % 2 == 0;
        let promoted = promote_weak(&mut labels, forward);
        passes += 1;
        if promoted == 0 {
            break;
        }
    }

    for pixel in labels.pixels_mut() {
        if pixel.0[0] != STRONG {
            pixel.0[0] = 0;
        }
    }

    debug!(max, low, high, passes, "Hysteresis complete");
    labels
}

/// One raster pass promoting weak pixels with a strong 8-neighbour.
/// Returns the number of promotions.
fn promote_weak(labels: &mut BinaryMask, forward: bool) -> usize {
    let (w, h) = labels.dimensions();
    let total = w as usize * h as usize;
    let mut promoted = 0;

    for step in 0..total {
        let idx = if forward { step } else { total - 1 - step };
        let x = (idx % w as usize) as u32;
        let y = (idx / w as usize) as u32;
        if labels.get_pixel(x, y).0[0] != WEAK {
            continue;
        }
        if has_strong_neighbour(labels, x, y) {
            labels.put_pixel(x, y, Luma([STRONG]));
            promoted += 1;
        }
    }

    promoted
}

fn has_strong_neighbour(labels: &BinaryMask, x: u32, y: u32) -> bool {
    let (w, h) = labels.dimensions();
    let xs = x.saturating_sub(1)..=(x + 1).min(w - 1);
    xs.flat_map(|nx| (y.saturating_sub(1)..=(y + 1).min(h - 1)).map(move |ny| (nx, ny)))
        .any(|(nx, ny)| (nx, ny) != (x, y) && labels.get_pixel(nx, ny).0[0] == STRONG)
}

/// Sobel, non-maximum suppression, and hysteresis in sequence.
pub fn canny(field: &ScalarField, low_ratio: f32, high_ratio: f32) -> BinaryMask {
    let gradient = sobel(field);
    let thinned = non_max_suppression(&gradient);
    hysteresis(&thinned, low_ratio, high_ratio)
}

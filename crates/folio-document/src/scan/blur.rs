// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 5x5 binomial (Gaussian-approximating) smoothing.

use super::ScalarField;

/// Outer product of [1, 4, 6, 4, 1] with itself.
const KERNEL: [[f32; 5]; 5] = [
    [1.0, 4.0, 6.0, 4.0, 1.0],
    [4.0, 16.0, 24.0, 16.0, 4.0],
    [6.0, 24.0, 36.0, 24.0, 6.0],
    [4.0, 16.0, 24.0, 16.0, 4.0],
    [1.0, 4.0, 6.0, 4.0, 1.0],
];

const KERNEL_SUM: f32 = 256.0;

/// Pixels within this distance of the frame are not filtered.
pub const BORDER: u32 = 2;

/// Smooth `input` with the fixed 5x5 kernel.
///
/// The 2-pixel frame is copied through from the input unchanged, so a
/// uniform field stays uniform everywhere and no step is introduced at the
/// image border.
pub fn gaussian_blur_5x5(input: &ScalarField) -> ScalarField {
    let (w, h) = input.dimensions();
    let mut output = input.clone();
    if w <= 2 * BORDER || h <= 2 * BORDER {
        return output;
    }

    let stride = w as usize;
    let src = input.as_raw();
    let dst: &mut [f32] = &mut output;

    for y in BORDER as usize..(h - BORDER) as usize {
        for x in BORDER as usize..(w - BORDER) as usize {
            let mut sum = 0.0f32;
            for (ky, kernel_row) in KERNEL.iter().enumerate() {
                let row = (y + ky - 2) * stride;
                for (kx, weight) in kernel_row.iter().enumerate() {
                    sum += src[row + x + kx - 2] * weight;
                }
            }
            dst[y * stride + x] = sum / KERNEL_SUM;
        }
    }

    output
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 3x3 morphological closing (dilate, then erode).

use image::Luma;

use super::BinaryMask;

/// Replace each interior pixel with the max (`dilate`) or min (`erode`) of
/// its 3x3 neighbourhood. The outermost row and column are copied as-is.
fn filter_3x3(mask: &BinaryMask, pick: fn(u8, u8) -> u8, seed: u8) -> BinaryMask {
    let (w, h) = mask.dimensions();
    let mut output = mask.clone();
    if w < 3 || h < 3 {
        return output;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = seed;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    acc = pick(acc, mask.get_pixel(nx, ny).0[0]);
                }
            }
            output.put_pixel(x, y, Luma([acc]));
        }
    }

    output
}

/// 3x3 maximum filter.
pub fn dilate_3x3(mask: &BinaryMask) -> BinaryMask {
    filter_3x3(mask, u8::max, u8::MIN)
}

/// 3x3 minimum filter.
pub fn erode_3x3(mask: &BinaryMask) -> BinaryMask {
    filter_3x3(mask, u8::min, u8::MAX)
}

/// Closing: fills gaps and pinholes narrower than the 3x3 window while
/// keeping the outline of larger shapes.
pub fn close_3x3(mask: &BinaryMask) -> BinaryMask {
    erode_3x3(&dilate_3x3(mask))
}

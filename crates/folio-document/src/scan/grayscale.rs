// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RGBA to luma conversion.

use image::{Luma, Rgba, RgbaImage};

use super::{BinaryMask, ScalarField};

/// Rec. 601 luma weights for R, G, B.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Luma of a single pixel. Alpha does not participate.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_WEIGHTS[0] * r as f32 + LUMA_WEIGHTS[1] * g as f32 + LUMA_WEIGHTS[2] * b as f32
}

/// Reduce an RGBA buffer to a single-channel intensity field.
pub fn to_luma_field(image: &RgbaImage) -> ScalarField {
    ScalarField::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        Luma([luma(r, g, b)])
    })
}

/// Reinterpret a byte mask as a float field (0 -> 0.0, 255 -> 255.0).
pub fn mask_to_field(mask: &BinaryMask) -> ScalarField {
    ScalarField::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([mask.get_pixel(x, y).0[0] as f32])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_use_luma_weights() {
        let mut image = RgbaImage::new(3, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        image.put_pixel(2, 0, Rgba([0, 0, 255, 255]));
        let field = to_luma_field(&image);
        assert!((field.get_pixel(0, 0).0[0] - 76.245).abs() < 1e-3);
        assert!((field.get_pixel(1, 0).0[0] - 149.685).abs() < 1e-3);
        assert!((field.get_pixel(2, 0).0[0] - 29.07).abs() < 1e-3);
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = RgbaImage::from_pixel(2, 2, Rgba([120, 60, 30, 255]));
        let clear = RgbaImage::from_pixel(2, 2, Rgba([120, 60, 30, 0]));
        assert_eq!(to_luma_field(&opaque), to_luma_field(&clear));
    }

    #[test]
    fn white_maps_to_full_scale() {
        let field = to_luma_field(&RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])));
        assert!((field.get_pixel(0, 0).0[0] - 255.0).abs() < 1e-3);
    }

    #[test]
    fn mask_values_carry_over() {
        let mut mask = BinaryMask::new(2, 1);
        mask.put_pixel(1, 0, Luma([255]));
        let field = mask_to_field(&mask);
        assert_eq!(field.as_raw(), &vec![0.0, 255.0]);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline stages — luma conversion, smoothing, adaptive
// binarization, morphological closing, Canny edge extraction, page-boundary
// detection, and crop/contrast normalisation.
//
// Each stage is a pure function from an owned or borrowed buffer to a freshly
// allocated one of the same dimensions.

pub mod blur;
pub mod contour;
pub mod edges;
pub mod grayscale;
pub mod morphology;
pub mod normalize;
pub mod threshold;

use image::{GrayImage, ImageBuffer, Luma};

/// One floating-point sample per pixel (luma, blurred luma, gradient data).
pub type ScalarField = ImageBuffer<Luma<f32>, Vec<f32>>;

/// One byte per pixel, holding only 0 or 255 once a stage has finished.
pub type BinaryMask = GrayImage;

pub use contour::detect_page;
pub use normalize::{ContrastDecision, stretch_contrast};

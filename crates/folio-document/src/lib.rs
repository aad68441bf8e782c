// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Page detection and normalisation for document photos.
//
// Takes a photo of a paper document, finds the page boundary on a
// downscaled copy, crops the full-resolution image to it (with a margin),
// levels low-contrast scans, and re-encodes the result for OCR.

pub mod cancel;
pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary entry points so callers can use
// `folio_document::normalize_document_image` etc.
pub use cancel::CancelToken;
pub use self::image::{ImageProcessor, ImageSource};
pub use pipeline::{
    DocumentNormalizer, NormalizedDocument, detect_document, normalize_document_image,
    normalize_document_image_async,
};

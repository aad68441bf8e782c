// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalisation pipeline — drives one photo from decode to re-encode.
//
// Detection runs on a downscaled copy (long side <= detection_max_dimension);
// the detected corners are mapped back to full resolution before cropping so
// the output keeps the original's detail. Every run owns its buffers, so
// concurrent runs never share mutable state.

use folio_core::error::{FolioError, Result};
use folio_core::{CropRect, DetectionResult, EncodedImage, NormalizeOptions, PipelineStage};
use image::RgbaImage;
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::image::{ImageProcessor, ImageSource};
use crate::scan::normalize::{self, ContrastDecision};
use crate::scan::{BinaryMask, blur, contour, edges, grayscale, morphology, threshold};

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// The re-encoded output image.
    pub image: EncodedImage,
    /// Detected page corners in full-resolution pixel coordinates.
    pub detection: DetectionResult,
    /// Region of the full-resolution image that was kept.
    pub crop: CropRect,
    /// Percentiles measured on the cropped image and whether they were applied.
    pub contrast: ContrastDecision,
}

// -- Detection ----------------------------------------------------------------

/// Grayscale, blur, adaptive threshold, closing, and Canny on one image.
///
/// Cancellation is checked between stages; a started stage always finishes.
pub fn find_edges(
    image: &RgbaImage,
    options: &NormalizeOptions,
    cancel: &CancelToken,
) -> Result<BinaryMask> {
    let blurred = blur::gaussian_blur_5x5(&grayscale::to_luma_field(image));
    cancel.check()?;

    let binary = threshold::adaptive_threshold(
        &blurred,
        options.adaptive_threshold_block_radius,
        options.adaptive_threshold_offset,
    );
    drop(blurred);
    let closed = morphology::close_3x3(&binary);
    drop(binary);
    cancel.check()?;

    let field = grayscale::mask_to_field(&closed);
    Ok(edges::canny(
        &field,
        options.canny_low_ratio,
        options.canny_high_ratio,
    ))
}

/// Locate the page in `image`, in that image's own pixel coordinates.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect_document(
    image: &RgbaImage,
    options: &NormalizeOptions,
    cancel: &CancelToken,
) -> Result<DetectionResult> {
    let edge_mask = find_edges(image, options, cancel)?;
    cancel.check()?;
    Ok(contour::detect_page(&edge_mask, &options.geometry))
}

/// Scale detection-space corners into full-resolution coordinates.
///
/// Each axis uses its own factor so rounding in the downscale does not skew
/// the result.
pub fn map_to_full_res(
    detection: &DetectionResult,
    detection_size: (u32, u32),
    full_size: (u32, u32),
) -> DetectionResult {
    let Some(quad) = detection.corners else {
        return DetectionResult::not_found();
    };
    let sx = full_size.0 as f32 / detection_size.0 as f32;
    let sy = full_size.1 as f32 / detection_size.1 as f32;
    DetectionResult::found(quad.scaled(sx, sy))
}

// -- Orchestrator -------------------------------------------------------------

/// Runs the pipeline and records which stage it reached.
///
/// ```text
/// Idle -> Decoding -> DetectingAtLowRes -> MappingToFullRes -> Cropping
///      -> Normalizing -> Encoding -> Done
/// ```
///
/// Any error moves the normaliser to `Failed`. Calling [`run`](Self::run)
/// again starts over from `Idle`.
#[derive(Debug)]
pub struct DocumentNormalizer {
    options: NormalizeOptions,
    cancel: CancelToken,
    stage: PipelineStage,
}

impl DocumentNormalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
            stage: PipelineStage::Idle,
        }
    }

    /// Use `cancel` instead of a private token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The stage the last (or current) run reached.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Normalise one photo.
    #[instrument(skip_all, fields(kind = source.kind()))]
    pub fn run(&mut self, source: ImageSource) -> Result<NormalizedDocument> {
        self.stage = PipelineStage::Idle;
        match self.run_stages(source) {
            Ok(document) => Ok(document),
            Err(err) => {
                warn!(stage = %self.stage, error = %err, "Normalisation failed");
                self.stage = PipelineStage::Failed;
                Err(err)
            }
        }
    }

    fn run_stages(&mut self, source: ImageSource) -> Result<NormalizedDocument> {
        self.options.validate()?;
        let options = self.options.clone();

        self.advance(PipelineStage::Decoding)?;
        let processor = ImageProcessor::from_source(source)?;
        let full_size = (processor.width(), processor.height());
        info!(width = full_size.0, height = full_size.1, "Source decoded");

        self.advance(PipelineStage::DetectingAtLowRes)?;
        // The downscaled copy and every intermediate buffer are dropped here,
        // before the full-resolution crop is allocated.
        let (detected, detection_size) = {
            let small = processor.downscaled_copy(options.detection_max_dimension);
            let size = small.dimensions();
            (detect_document(&small, &options, &self.cancel)?, size)
        };

        self.advance(PipelineStage::MappingToFullRes)?;
        let detection = map_to_full_res(&detected, detection_size, full_size);
        debug!(found = detection.is_found(), "Corners mapped to full resolution");

        self.advance(PipelineStage::Cropping)?;
        let crop = normalize::crop_rect(
            &detection,
            full_size.0,
            full_size.1,
            options.crop_margin_ratio,
        );
        let processor = processor
            .crop(crop)?
            .fit_within(options.output_max_dimension);

        self.advance(PipelineStage::Normalizing)?;
        let (levelled, contrast) = normalize::stretch_contrast(
            processor.into_rgba(),
            options.low_percentile,
            options.high_percentile,
            options.contrast_skip_range,
        );

        self.advance(PipelineStage::Encoding)?;
        let image = ImageProcessor::from_rgba(levelled)?
            .encode(options.output_format, options.quality_percent())?;

        self.advance(PipelineStage::Done)?;
        info!(
            width = image.width,
            height = image.height,
            bytes = image.bytes.len(),
            found = detection.is_found(),
            "Document normalised"
        );
        Ok(NormalizedDocument {
            image,
            detection,
            crop,
            contrast,
        })
    }

    fn advance(&mut self, next: PipelineStage) -> Result<()> {
        self.cancel.check()?;
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {} -> {}",
            self.stage,
            next
        );
        debug!(from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
        Ok(())
    }
}

// -- Entry points -------------------------------------------------------------

/// Normalise one photo on the current thread.
pub fn normalize_document_image(
    source: impl Into<ImageSource>,
    options: &NormalizeOptions,
) -> Result<NormalizedDocument> {
    DocumentNormalizer::new(options.clone()).run(source.into())
}

/// Normalise one photo on tokio's blocking pool.
///
/// The pipeline is CPU-bound, so it runs under `spawn_blocking` and the
/// calling task stays free to cancel through `cancel`.
pub async fn normalize_document_image_async(
    source: ImageSource,
    options: NormalizeOptions,
    cancel: CancelToken,
) -> Result<NormalizedDocument> {
    tokio::task::spawn_blocking(move || {
        DocumentNormalizer::new(options)
            .with_cancel(cancel)
            .run(source)
    })
    .await
    .map_err(|err| FolioError::TaskJoin(err.to_string()))?
}

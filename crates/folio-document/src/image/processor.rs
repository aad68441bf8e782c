// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, fit-to-size, crop, and re-encode. Operates on
// in-memory RGBA buffers using the `image` crate.

use std::io::Cursor;

use folio_core::error::{FolioError, Result};
use folio_core::{CropRect, EncodedImage, OutputFormat};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use tracing::{debug, info, instrument};

use super::source::{ImageSource, decode_data_url};

/// Largest working surface the pipeline will allocate (16384 x 16384).
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

/// A single decoded RGBA image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so a run
/// reads as a chain and no buffer is shared between steps.
pub struct ImageProcessor {
    /// The current working image.
    image: RgbaImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode any supported source into an RGBA buffer.
    #[instrument(skip(source), fields(kind = source.kind()))]
    pub fn from_source(source: ImageSource) -> Result<Self> {
        match source {
            ImageSource::Encoded(bytes) => Self::from_bytes(&bytes),
            ImageSource::DataUrl(url) => Self::from_bytes(&decode_data_url(&url)?),
            ImageSource::Bitmap(image) => Self::from_dynamic(image),
        }
    }

    /// Decode raw encoded bytes (JPEG, PNG, WebP, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| match err {
            ImageError::Limits(limit) => FolioError::RenderingContextUnavailable(limit.to_string()),
            other => FolioError::Decode(other.to_string()),
        })?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Self::from_dynamic(image)
    }

    /// Wrap an already-decoded image, converting it to RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        check_surface(image.width(), image.height())?;
        Ok(Self {
            image: image.into_rgba8(),
        })
    }

    /// Wrap an RGBA buffer as-is.
    pub fn from_rgba(image: RgbaImage) -> Result<Self> {
        check_surface(image.width(), image.height())?;
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying RGBA buffer.
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    /// Consume the processor and return the underlying RGBA buffer.
    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// A downscaled copy whose longer side is at most `max_dimension`.
    ///
    /// Leaves `self` untouched; used to build the detection-resolution copy
    /// while the full-resolution image is kept for cropping.
    pub fn downscaled_copy(&self, max_dimension: u32) -> RgbaImage {
        let (w, h) = fit_dimensions(self.width(), self.height(), max_dimension);
        if (w, h) == self.image.dimensions() {
            return self.image.clone();
        }
        imageops::resize(&self.image, w, h, FilterType::Triangle)
    }

    /// Shrink the image so its longer side is at most `max_dimension`,
    /// preserving aspect ratio. Never upscales. Uses Lanczos3 filtering.
    #[instrument(skip(self))]
    pub fn fit_within(self, max_dimension: u32) -> Self {
        let (w, h) = fit_dimensions(self.width(), self.height(), max_dimension);
        if (w, h) == self.image.dimensions() {
            return self;
        }
        info!(
            from_w = self.width(),
            from_h = self.height(),
            to_w = w,
            to_h = h,
            "Resizing image"
        );
        Self {
            image: imageops::resize(&self.image, w, h, FilterType::Lanczos3),
        }
    }

    /// Crop to `rect`, which must lie inside the image and be non-empty.
    #[instrument(skip(self), fields(x = rect.x, y = rect.y, width = rect.width, height = rect.height))]
    pub fn crop(self, rect: CropRect) -> Result<Self> {
        if rect.is_empty()
            || rect.x.saturating_add(rect.width) > self.width()
            || rect.y.saturating_add(rect.height) > self.height()
        {
            return Err(FolioError::DegenerateImage {
                width: rect.width,
                height: rect.height,
            });
        }
        if rect == CropRect::full(self.width(), self.height()) {
            return Ok(self);
        }
        let cropped = imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height)
            .to_image();
        Ok(Self { image: cropped })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image. `quality` (1-100) only affects JPEG; WebP
    /// and PNG are written lossless.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn encode(&self, format: OutputFormat, quality: u8) -> Result<EncodedImage> {
        let bytes = match format {
            OutputFormat::Jpeg => self.to_jpeg_bytes(quality)?,
            OutputFormat::Png => encode_to_format(&self.image, ImageFormat::Png)?,
            OutputFormat::Webp => encode_to_format(&self.image, ImageFormat::WebP)?,
        };
        debug!(bytes = bytes.len(), format = format.extension(), "Image encoded");
        Ok(EncodedImage {
            bytes,
            format,
            width: self.width(),
            height: self.height(),
        })
    }

    /// Encode as JPEG with the given quality (1-100). Alpha is dropped.
    fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| FolioError::Encoding(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Dimensions of `width` x `height` shrunk so the longer side is at most
/// `max_dimension`. Each side stays at least one pixel.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_dimension || longer == 0 {
        return (width, height);
    }
    let scale = max_dimension as f64 / longer as f64;
    let scale_side = |side: u32| -> u32 {
        if side == longer {
            max_dimension
        } else {
            ((side as f64 * scale).round() as u32).clamp(1, max_dimension)
        }
    };
    (scale_side(width), scale_side(height))
}

/// Refuse zero-sized images and surfaces too large to allocate.
fn check_surface(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FolioError::DegenerateImage { width, height });
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_SURFACE_PIXELS {
        return Err(FolioError::RenderingContextUnavailable(format!(
            "{width}x{height} exceeds the {MAX_SURFACE_PIXELS}-pixel surface limit"
        )));
    }
    Ok(())
}

/// Encode an RGBA buffer into the specified format, returning the raw bytes.
fn encode_to_format(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| FolioError::Encoding(format!("{:?} encoding failed: {}", format, err)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use image::Rgba;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([250, 250, 250, 255])
            } else {
                Rgba([10, 10, 10, 255])
            }
        })
    }

    #[test]
    fn fit_dimensions_caps_longer_side() {
        assert_eq!(fit_dimensions(4000, 3000, 2048), (2048, 1536));
        assert_eq!(fit_dimensions(3000, 4000, 640), (480, 640));
        assert_eq!(fit_dimensions(100, 50, 640), (100, 50));
        assert_eq!(fit_dimensions(10_000, 1, 100), (100, 1));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let original = checker(17, 9);
        let encoded = ImageProcessor::from_rgba(original.clone())
            .unwrap()
            .encode(OutputFormat::Png, 92)
            .unwrap();
        assert_eq!(encoded.format, OutputFormat::Png);
        assert_eq!((encoded.width, encoded.height), (17, 9));

        let decoded = ImageProcessor::from_bytes(&encoded.bytes).unwrap();
        assert_eq!(decoded.into_rgba(), original);
    }

    #[test]
    fn webp_output_has_riff_header() {
        let encoded = ImageProcessor::from_rgba(checker(8, 8))
            .unwrap()
            .encode(OutputFormat::Webp, 92)
            .unwrap();
        assert_eq!(&encoded.bytes[0..4], b"RIFF");
        assert_eq!(&encoded.bytes[8..12], b"WEBP");
    }

    #[test]
    fn jpeg_output_has_soi_marker() {
        let encoded = ImageProcessor::from_rgba(checker(8, 8))
            .unwrap()
            .encode(OutputFormat::Jpeg, 80)
            .unwrap();
        assert_eq!(&encoded.bytes[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn data_url_source_decodes() {
        let png = ImageProcessor::from_rgba(checker(5, 4))
            .unwrap()
            .encode(OutputFormat::Png, 100)
            .unwrap();
        let url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png.bytes)
        );
        let processor = ImageProcessor::from_source(ImageSource::DataUrl(url)).unwrap();
        assert_eq!((processor.width(), processor.height()), (5, 4));
    }

    #[test]
    fn corrupt_bytes_are_decode_errors() {
        let err = ImageProcessor::from_bytes(b"definitely not an image").err().unwrap();
        assert!(matches!(err, FolioError::Decode(_)));
    }

    #[test]
    fn empty_bitmap_is_degenerate() {
        let err = ImageProcessor::from_dynamic(DynamicImage::new_rgba8(0, 10))
            .err()
            .unwrap();
        assert!(matches!(err, FolioError::DegenerateImage { width: 0, height: 10 }));
    }

    #[test]
    fn oversized_surface_is_rejected_before_allocation() {
        assert!(matches!(
            check_surface(20_000, 20_000),
            Err(FolioError::RenderingContextUnavailable(_))
        ));
        assert!(check_surface(16_384, 16_384).is_ok());
    }

    #[test]
    fn crop_extracts_region() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        image.put_pixel(3, 4, Rgba([255, 0, 0, 255]));
        let cropped = ImageProcessor::from_rgba(image)
            .unwrap()
            .crop(CropRect { x: 3, y: 4, width: 2, height: 2 })
            .unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.as_rgba().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn crop_outside_bounds_is_degenerate() {
        let processor = ImageProcessor::from_rgba(checker(10, 10)).unwrap();
        let err = processor
            .crop(CropRect { x: 8, y: 0, width: 5, height: 5 })
            .err()
            .unwrap();
        assert!(matches!(err, FolioError::DegenerateImage { .. }));
    }

    #[test]
    fn fit_within_never_upscales() {
        let processor = ImageProcessor::from_rgba(checker(30, 20)).unwrap().fit_within(2048);
        assert_eq!((processor.width(), processor.height()), (30, 20));
        let processor = processor.fit_within(15);
        assert_eq!((processor.width(), processor.height()), (15, 10));
    }
}

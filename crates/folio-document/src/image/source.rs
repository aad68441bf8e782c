// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-supplied image handles.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use folio_core::error::{FolioError, Result};
use image::DynamicImage;

/// Anything the pipeline can decode into pixels.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Encoded file bytes (JPEG, PNG, WebP, ...). The format is sniffed.
    Encoded(Vec<u8>),
    /// `data:image/...;base64,...` URL, or a bare base64 string.
    DataUrl(String),
    /// An already-decoded in-memory bitmap.
    Bitmap(DynamicImage),
}

impl ImageSource {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encoded(_) => "encoded",
            Self::DataUrl(_) => "data-url",
            Self::Bitmap(_) => "bitmap",
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes)
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Bitmap(image)
    }
}

/// Decode the payload of a base64 data URL.
///
/// Anything up to the first comma is treated as the URL header; a string
/// without a comma is decoded as bare base64.
pub(crate) fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = match data_url.find(',') {
        Some(idx) => {
            let header = &data_url[..idx];
            if header.starts_with("data:") && !header.ends_with(";base64") {
                return Err(FolioError::Decode(format!(
                    "data URL is not base64-encoded: {header}"
                )));
            }
            &data_url[idx + 1..]
        }
        None => data_url,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|err| FolioError::Decode(format!("invalid base64 in data URL: {err}")))
}

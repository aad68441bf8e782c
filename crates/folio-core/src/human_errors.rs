// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the photo-upload flow.
//
// Every pipeline error is mapped to plain English with a clear suggestion,
// and tells the caller whether sending the untouched photo on to recognition
// is a sensible fallback.

use crate::error::FolioError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Momentary problem (busy device, cancelled run); trying again may work.
    Transient,
    /// The user must do something (take a new photo, pick another file).
    ActionRequired,
    /// Retrying with the same input will fail the same way.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether running the pipeline again could succeed.
    pub retriable: bool,
    /// Whether the caller should fall back to the unprocessed photo.
    pub use_original_image: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `FolioError` into a `HumanError` suitable for display.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        FolioError::Decode(detail) => humanize_decode_error(detail),

        FolioError::RenderingContextUnavailable(_) => HumanError {
            message: "This photo is too large to tidy up.".into(),
            suggestion: "We'll send the photo as it is. For better results, take the picture at a lower resolution.".into(),
            retriable: false,
            use_original_image: true,
            severity: Severity::Permanent,
        },

        FolioError::DegenerateImage { width, height } => HumanError {
            message: "This image has no visible content.".into(),
            suggestion: format!("Please take the photo again. (Image size: {width}x{height})"),
            retriable: false,
            use_original_image: false,
            severity: Severity::ActionRequired,
        },

        FolioError::Encoding(_) => HumanError {
            message: "We couldn't save the tidied-up page.".into(),
            suggestion: "We'll send your original photo instead.".into(),
            retriable: true,
            use_original_image: true,
            severity: Severity::Transient,
        },

        FolioError::InvalidOptions(detail) => HumanError {
            message: "The page clean-up settings are not valid.".into(),
            suggestion: format!("Reset the scan settings to their defaults. ({detail})"),
            retriable: false,
            use_original_image: true,
            severity: Severity::ActionRequired,
        },

        FolioError::Cancelled => HumanError {
            message: "Page clean-up was cancelled.".into(),
            suggestion: "Start the upload again when you're ready.".into(),
            retriable: true,
            use_original_image: false,
            severity: Severity::Transient,
        },

        FolioError::TaskJoin(_) => HumanError {
            message: "Page clean-up stopped unexpectedly.".into(),
            suggestion: "We'll send your original photo instead. If this keeps happening, please report it.".into(),
            retriable: true,
            use_original_image: true,
            severity: Severity::Transient,
        },

        FolioError::Io(_) => HumanError {
            message: "There was a problem reading or writing a file.".into(),
            suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
            retriable: true,
            use_original_image: false,
            severity: Severity::Transient,
        },

        FolioError::Serialization(_) => HumanError {
            message: "The scan settings file couldn't be read.".into(),
            suggestion: "Check the settings file is valid JSON, or remove it to use the defaults.".into(),
            retriable: false,
            use_original_image: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Decoder messages come from the image codecs; pick out the common cases.
fn humanize_decode_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("base64") || lower.contains("data url") {
        HumanError {
            message: "The uploaded image data was damaged.".into(),
            suggestion: "Try uploading the photo again.".into(),
            retriable: true,
            use_original_image: false,
            severity: Severity::Transient,
        }
    } else if lower.contains("unsupported") || lower.contains("format") {
        HumanError {
            message: "This type of image isn't supported.".into(),
            suggestion: "Please use a JPEG, PNG, or WebP photo.".into(),
            retriable: false,
            use_original_image: false,
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "We couldn't open this photo.".into(),
            suggestion: format!("The file may be damaged. Try taking the photo again. (Detail: {detail})"),
            retriable: false,
            use_original_image: false,
            severity: Severity::ActionRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_photo_falls_back_to_original() {
        let err = FolioError::RenderingContextUnavailable("20000x20000 exceeds limit".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.use_original_image);
        assert!(!human.retriable);
    }

    #[test]
    fn bad_base64_is_transient() {
        let err = FolioError::Decode("invalid base64 in data URL: Invalid byte 33".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn unknown_format_is_permanent() {
        let err = FolioError::Decode("The image format could not be determined".into());
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }

    #[test]
    fn degenerate_image_asks_for_new_photo() {
        let human = humanize_error(&FolioError::DegenerateImage { width: 0, height: 10 });
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("0x10"));
    }

    #[test]
    fn cancelled_does_not_send_original() {
        let human = humanize_error(&FolioError::Cancelled);
        assert!(!human.use_original_image);
        assert!(human.retriable);
    }
}

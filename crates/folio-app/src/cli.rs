// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: argument parsing and the file-level commands.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use folio_core::error::{FolioError, Result};
use folio_core::human_errors::humanize_error;
use folio_core::{CropRect, DetectionResult, NormalizeOptions, OutputFormat};
use folio_document::pipeline::map_to_full_res;
use folio_document::{
    CancelToken, ImageProcessor, ImageSource, detect_document, normalize_document_image_async,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Detect the page in a photo, crop to it, level contrast, and re-encode
    Normalize {
        /// Photo to normalise (JPEG, PNG, WebP, ...)
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the result; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,
        /// JSON options file (see `folio defaults`)
        #[arg(long)]
        options: Option<PathBuf>,
        /// Write the untouched input when normalisation fails recoverably
        #[arg(long)]
        keep_original: bool,
    },
    /// Print the detected page corners as JSON
    Detect {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Print the default options as JSON
    Defaults,
}

/// What `normalize` did, printed as JSON on stdout.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NormalizeReport {
    Normalized {
        output: PathBuf,
        format: OutputFormat,
        mime_type: &'static str,
        width: u32,
        height: u32,
        detection: DetectionResult,
        crop: CropRect,
        contrast_stretched: bool,
    },
    OriginalKept {
        output: PathBuf,
        reason: String,
    },
}

pub async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Normalize {
            input,
            output,
            options,
            keep_original,
        } => {
            let options = load_options(options.as_deref())?;
            let cancel = CancelToken::new();
            let ctrl_c = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupted; cancelling after the current stage");
                        cancel.cancel();
                    }
                }
            });
            let report = normalize_file(&input, &output, options, keep_original, cancel).await;
            ctrl_c.abort();
            println!("{}", serde_json::to_string_pretty(&report?)?);
        }
        Command::Detect { input, options } => {
            let options = load_options(options.as_deref())?;
            let detection = detect_file(&input, options).await?;
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        Command::Defaults => {
            println!("{}", NormalizeOptions::default().to_json_string()?);
        }
    }
    Ok(())
}

/// Defaults, or the validated contents of `path`.
pub fn load_options(path: Option<&Path>) -> Result<NormalizeOptions> {
    match path {
        Some(path) => NormalizeOptions::from_json_str(&std::fs::read_to_string(path)?),
        None => Ok(NormalizeOptions::default()),
    }
}

/// Normalise `input` into `output`. A known output extension overrides
/// `options.output_format`.
pub async fn normalize_file(
    input: &Path,
    output: &Path,
    mut options: NormalizeOptions,
    keep_original: bool,
    cancel: CancelToken,
) -> Result<NormalizeReport> {
    if let Some(format) = output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
    {
        options.output_format = format;
    }

    let bytes = tokio::fs::read(input).await?;
    match normalize_document_image_async(ImageSource::Encoded(bytes), options, cancel).await {
        Ok(document) => {
            tokio::fs::write(output, &document.image.bytes).await?;
            info!(output = %output.display(), bytes = document.image.bytes.len(), "Normalised image written");
            Ok(NormalizeReport::Normalized {
                output: output.to_path_buf(),
                format: document.image.format,
                mime_type: document.image.format.mime_type(),
                width: document.image.width,
                height: document.image.height,
                detection: document.detection,
                crop: document.crop,
                contrast_stretched: document.contrast.stretched,
            })
        }
        Err(err) if keep_original && humanize_error(&err).use_original_image => {
            warn!(error = %err, "Normalisation failed; keeping the original image");
            tokio::fs::write(output, tokio::fs::read(input).await?).await?;
            Ok(NormalizeReport::OriginalKept {
                output: output.to_path_buf(),
                reason: err.to_string(),
            })
        }
        Err(err) => Err(err),
    }
}

/// Page corners for `input` in its own pixel coordinates.
pub async fn detect_file(input: &Path, options: NormalizeOptions) -> Result<DetectionResult> {
    options.validate()?;
    let bytes = tokio::fs::read(input).await?;
    tokio::task::spawn_blocking(move || -> Result<DetectionResult> {
        let processor = ImageProcessor::from_bytes(&bytes)?;
        let small = processor.downscaled_copy(options.detection_max_dimension);
        let detected = detect_document(&small, &options, &CancelToken::new())?;
        Ok(map_to_full_res(
            &detected,
            small.dimensions(),
            (processor.width(), processor.height()),
        ))
    })
    .await
    .map_err(|err| FolioError::TaskJoin(err.to_string()))?
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

/// Top-level error type for all Folio operations.
///
/// Every variant is terminal for the invocation that raised it. The pipeline
/// never retries internally and never returns a partial result.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Boundary errors --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("rendering surface unavailable: {0}")]
    RenderingContextUnavailable(String),

    #[error("degenerate image: {width}x{height}")]
    DegenerateImage { width: u32, height: u32 },

    #[error("failed to encode image: {0}")]
    Encoding(String),

    // -- Run control --
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("normalisation cancelled")]
    Cancelled,

    #[error("pipeline worker failed: {0}")]
    TaskJoin(String),

    // -- Configuration / host I/O --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

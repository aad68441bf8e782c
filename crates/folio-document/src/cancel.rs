// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cooperative cancellation for normalisation runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use folio_core::error::{FolioError, Result};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so the caller keeps one clone and hands
/// another to the run. The pipeline checks it between stages; a stage that
/// has already started runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// `Err(FolioError::Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(FolioError::Cancelled)
        } else {
            Ok(())
        }
    }
}

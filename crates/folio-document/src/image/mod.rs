// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding of caller-supplied sources into RGBA pixel buffers,
// resizing, cropping, and final re-encoding.

pub mod processor;
pub mod source;

pub use processor::ImageProcessor;
pub use source::ImageSource;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-boundary detection from an edge mask.
//
// This is a density heuristic, not a contour tracer: it counts edge pixels per
// row and column and takes the outermost dense line on each side as the page
// border. It assumes a roughly axis-aligned page photographed close to
// fronto-parallel and does not attempt perspective correction.

use folio_core::{DetectionResult, GeometryLimits, Quad};
use tracing::{debug, info, instrument};

use super::BinaryMask;

/// Edge-pixel counts per row and per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDensity {
    pub rows: Vec<u32>,
    pub cols: Vec<u32>,
}

impl EdgeDensity {
    pub fn of(edges: &BinaryMask) -> Self {
        let (w, h) = edges.dimensions();
        let mut rows = vec![0u32; h as usize];
        let mut cols = vec![0u32; w as usize];
        for (x, y, pixel) in edges.enumerate_pixels() {
            if pixel.0[0] != 0 {
                rows[y as usize] += 1;
                cols[x as usize] += 1;
            }
        }
        Self { rows, cols }
    }
}

/// Which side of the image a boundary scan starts from.
#[derive(Debug, Clone, Copy)]
enum Side {
    Near,
    Far,
}

/// First line (scanning inwards from `side`) whose count exceeds `threshold`.
///
/// Near scans run from `start` to `end` of the axis; far scans mirror that
/// window from the opposite border.
fn scan_boundary(counts: &[u32], threshold: f32, limits: &GeometryLimits, side: Side) -> Option<usize> {
    let len = counts.len();
    if len == 0 {
        return None;
    }
    let at = |fraction: f32| ((len as f32 * fraction) as usize).min(len - 1);
    let dense = |&i: &usize| counts[i] as f32 > threshold;

    match side {
        Side::Near => (at(limits.edge_scan_start)..=at(limits.edge_scan_end)).find(dense),
        Side::Far => (at(1.0 - limits.edge_scan_end)..=at(1.0 - limits.edge_scan_start))
            .rev()
            .find(dense),
    }
}

/// Whether both boundary lines stand out against the lines they enclose.
fn boundaries_are_prominent(counts: &[u32], near: usize, far: usize, prominence: f32) -> bool {
    let Some(inner) = counts.get(near + 1..far) else {
        return false;
    };
    if inner.is_empty() {
        return true;
    }
    let mean = inner.iter().map(|&c| c as f32).sum::<f32>() / inner.len() as f32;
    let floor = mean * prominence;
    counts[near] as f32 >= floor && counts[far] as f32 >= floor
}

/// Locate the page in a finalized edge mask.
///
/// Returns `found` only for rectangles that pass every plausibility check in
/// `limits`: area fraction, minimum side fraction, aspect ratio, and edge
/// prominence.
#[instrument(skip(edges, limits), fields(width = edges.width(), height = edges.height()))]
pub fn detect_page(edges: &BinaryMask, limits: &GeometryLimits) -> DetectionResult {
    let (w, h) = edges.dimensions();
    if w < 3 || h < 3 {
        return DetectionResult::not_found();
    }

    let density = EdgeDensity::of(edges);
    let row_thresh = w as f32 * limits.density_ratio;
    let col_thresh = h as f32 * limits.density_ratio;

    let bounds = (
        scan_boundary(&density.rows, row_thresh, limits, Side::Near),
        scan_boundary(&density.rows, row_thresh, limits, Side::Far),
        scan_boundary(&density.cols, col_thresh, limits, Side::Near),
        scan_boundary(&density.cols, col_thresh, limits, Side::Far),
    );
    let (top, bottom, left, right) = match bounds {
        (Some(top), Some(bottom), Some(left), Some(right)) => (top, bottom, left, right),
        (top, bottom, left, right) => {
            debug!(?top, ?bottom, ?left, ?right, "No dense boundary on every side");
            return DetectionResult::not_found();
        }
    };

    // Overlapping scan windows on very thin images can pick the same line twice.
    if bottom <= top || right <= left {
        debug!(top, bottom, left, right, "Boundaries collapsed onto one line");
        return DetectionResult::not_found();
    }

    if !boundaries_are_prominent(&density.rows, top, bottom, limits.min_edge_prominence)
        || !boundaries_are_prominent(&density.cols, left, right, limits.min_edge_prominence)
    {
        debug!(top, bottom, left, right, "Boundaries do not stand out from the interior");
        return DetectionResult::not_found();
    }

    let quad = Quad::from_bounds(left as f32, top as f32, right as f32, bottom as f32);
    if !is_plausible(&quad, w, h, limits) {
        return DetectionResult::not_found();
    }

    info!(top, bottom, left, right, "Page boundary detected");
    DetectionResult::found(quad)
}

/// Geometric sanity checks against the image size.
pub fn is_plausible(quad: &Quad, width: u32, height: u32, limits: &GeometryLimits) -> bool {
    let (qw, qh) = (quad.width(), quad.height());
    let (w, h) = (width as f32, height as f32);
    if qw <= 0.0 || qh <= 0.0 {
        return false;
    }

    let area_ratio = (qw * qh) / (w * h);
    let aspect = qw / qh;
    let plausible = (limits.min_area_ratio..=limits.max_area_ratio).contains(&area_ratio)
        && qw >= w * limits.min_side_ratio
        && qh >= h * limits.min_side_ratio
        && (limits.min_aspect..=limits.max_aspect).contains(&aspect);

    if !plausible {
        debug!(area_ratio, aspect, qw, qh, "Rejected implausible page rectangle");
    }
    plausible
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the folio-document pipeline. Covers the
// detection pass on its own (the hot path at detection resolution) and a
// full normalisation run on a synthetic photo.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};

use folio_core::{NormalizeOptions, OutputFormat};
use folio_document::{CancelToken, ImageSource, detect_document, normalize_document_image};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Light page on a dark background, page inset by 10% on every side.
fn synthetic_photo(width: u32, height: u32) -> RgbaImage {
    let (inset_x, inset_y) = (width / 10, height / 10);
    RgbaImage::from_fn(width, height, |x, y| {
        let inside = (inset_x..width - inset_x).contains(&x) && (inset_y..height - inset_y).contains(&y);
        if inside {
            Rgba([235, 232, 225, 255])
        } else {
            Rgba([40, 38, 36, 255])
        }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Detection at the default working resolution (640 x 480).
fn bench_detection(c: &mut Criterion) {
    let photo = synthetic_photo(640, 480);
    let options = NormalizeOptions::default();
    let cancel = CancelToken::new();

    c.bench_function("detect_document (640x480)", |b| {
        b.iter(|| {
            let result = detect_document(black_box(&photo), &options, &cancel);
            black_box(result.ok());
        });
    });
}

/// Full run on a phone-sized photo, PNG output to keep encoding cost stable.
fn bench_full_pipeline(c: &mut Criterion) {
    let photo = DynamicImage::ImageRgba8(synthetic_photo(2400, 1800));
    let options = NormalizeOptions {
        output_format: OutputFormat::Png,
        ..NormalizeOptions::default()
    };

    let mut group = c.benchmark_group("normalize_document_image");
    group.sample_size(10);
    group.bench_function("2400x1800", |b| {
        b.iter(|| {
            let source = ImageSource::Bitmap(black_box(photo.clone()));
            black_box(normalize_document_image(source, &options).ok());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_detection, bench_full_pipeline);
criterion_main!(benches);

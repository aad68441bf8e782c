// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::types::OutputFormat;

/// Tunables for one normalisation run.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Longer side of the downscaled copy used for page detection.
    pub detection_max_dimension: u32,
    /// Longer side cap for the encoded output.
    pub output_max_dimension: u32,
    /// Encoder quality in (0, 1]. Only lossy formats honour it.
    pub output_quality: f32,
    pub output_format: OutputFormat,
    /// Margin added around the detected page, as a fraction of its size.
    pub crop_margin_ratio: f32,
    /// Radius `r` of the (2r+1)x(2r+1) adaptive-threshold window.
    pub adaptive_threshold_block_radius: u32,
    /// Offset `C` subtracted from the local mean.
    pub adaptive_threshold_offset: f32,
    /// Weak-edge threshold as a fraction of the maximum gradient magnitude.
    pub canny_low_ratio: f32,
    /// Strong-edge threshold as a fraction of the maximum gradient magnitude.
    pub canny_high_ratio: f32,
    /// Contrast stretching is skipped when the percentile range exceeds this.
    pub contrast_skip_range: u8,
    /// Lower luminance percentile (whole percent).
    pub low_percentile: u8,
    /// Upper luminance percentile (whole percent).
    pub high_percentile: u8,
    pub geometry: GeometryLimits,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            detection_max_dimension: 640,
            output_max_dimension: 2048,
            output_quality: 0.92,
            output_format: OutputFormat::Webp,
            crop_margin_ratio: 0.08,
            adaptive_threshold_block_radius: 7,
            adaptive_threshold_offset: 8.0,
            canny_low_ratio: 0.04,
            canny_high_ratio: 0.12,
            contrast_skip_range: 200,
            low_percentile: 1,
            high_percentile: 99,
            geometry: GeometryLimits::default(),
        }
    }
}

/// Plausibility bounds for a detected page, all relative to the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryLimits {
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    /// Each side must cover at least this fraction of the matching image side.
    pub min_side_ratio: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// A row (column) is a boundary candidate when its edge count exceeds
    /// this fraction of the image width (height).
    pub density_ratio: f32,
    /// Boundary scans start this far in from each border...
    pub edge_scan_start: f32,
    /// ...and give up once they pass this fraction of the image.
    pub edge_scan_end: f32,
    /// A boundary line must be this many times denser than the mean of the
    /// lines enclosed between the opposite boundaries.
    pub min_edge_prominence: f32,
}

impl Default for GeometryLimits {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.10,
            max_area_ratio: 0.97,
            min_side_ratio: 0.12,
            min_aspect: 0.25,
            max_aspect: 4.0,
            density_ratio: 0.04,
            edge_scan_start: 0.01,
            edge_scan_end: 0.45,
            min_edge_prominence: 2.0,
        }
    }
}

impl NormalizeOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encoder quality mapped onto the 1..=100 scale lossy codecs use.
    pub fn quality_percent(&self) -> u8 {
        (self.output_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.detection_max_dimension < 3 {
            return Err(invalid("detection_max_dimension must be at least 3"));
        }
        if self.output_max_dimension == 0 {
            return Err(invalid("output_max_dimension must be positive"));
        }
        if !(self.output_quality > 0.0 && self.output_quality <= 1.0) {
            return Err(invalid(format!(
                "output_quality must be in (0, 1], got {}",
                self.output_quality
            )));
        }
        if !(self.crop_margin_ratio >= 0.0 && self.crop_margin_ratio.is_finite()) {
            return Err(invalid("crop_margin_ratio must be a non-negative number"));
        }
        if !self.adaptive_threshold_offset.is_finite() {
            return Err(invalid("adaptive_threshold_offset must be finite"));
        }
        if !(self.canny_low_ratio > 0.0 && self.canny_low_ratio < self.canny_high_ratio) {
            return Err(invalid(format!(
                "canny ratios must satisfy 0 < low < high, got low={} high={}",
                self.canny_low_ratio, self.canny_high_ratio
            )));
        }
        if self.canny_high_ratio > 1.0 {
            return Err(invalid("canny_high_ratio must not exceed 1"));
        }
        if self.low_percentile >= self.high_percentile || self.high_percentile > 100 {
            return Err(invalid(format!(
                "percentiles must satisfy low < high <= 100, got {}..{}",
                self.low_percentile, self.high_percentile
            )));
        }
        self.geometry.validate()
    }
}

impl GeometryLimits {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_area_ratio)
            || !(0.0..=1.0).contains(&self.max_area_ratio)
            || self.min_area_ratio > self.max_area_ratio
        {
            return Err(invalid("area ratios must satisfy 0 <= min <= max <= 1"));
        }
        if !(self.min_aspect > 0.0 && self.min_aspect <= self.max_aspect) {
            return Err(invalid("aspect bounds must satisfy 0 < min <= max"));
        }
        if !(0.0..1.0).contains(&self.min_side_ratio) {
            return Err(invalid("min_side_ratio must be in [0, 1)"));
        }
        if !(self.density_ratio > 0.0 && self.density_ratio < 1.0) {
            return Err(invalid("density_ratio must be in (0, 1)"));
        }
        if !(0.0 <= self.edge_scan_start && self.edge_scan_start < self.edge_scan_end && self.edge_scan_end < 0.5) {
            return Err(invalid("edge scan window must satisfy 0 <= start < end < 0.5"));
        }
        if !(self.min_edge_prominence >= 0.0 && self.min_edge_prominence.is_finite()) {
            return Err(invalid("min_edge_prominence must be a non-negative number"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> FolioError {
    FolioError::InvalidOptions(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = NormalizeOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.detection_max_dimension, 640);
        assert_eq!(options.output_max_dimension, 2048);
        assert_eq!(options.output_format, OutputFormat::Webp);
        assert_eq!(options.adaptive_threshold_block_radius, 7);
        assert_eq!(options.quality_percent(), 92);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options = NormalizeOptions::from_json_str(
            r#"{ "output_format": "png", "geometry": { "max_aspect": 3.0 } }"#,
        )
        .unwrap();
        assert_eq!(options.output_format, OutputFormat::Png);
        assert_eq!(options.geometry.max_aspect, 3.0);
        assert_eq!(options.geometry.min_aspect, 0.25);
        assert_eq!(options.canny_high_ratio, 0.12);
    }

    #[test]
    fn json_round_trip_preserves_options() {
        let mut options = NormalizeOptions::default();
        options.crop_margin_ratio = 0.1;
        let json = options.to_json_string().unwrap();
        assert_eq!(NormalizeOptions::from_json_str(&json).unwrap(), options);
    }

    #[test]
    fn inverted_canny_ratios_rejected() {
        let options = NormalizeOptions {
            canny_low_ratio: 0.2,
            canny_high_ratio: 0.1,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(FolioError::InvalidOptions(_))));
    }

    #[test]
    fn zero_quality_rejected() {
        let options = NormalizeOptions {
            output_quality: 0.0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn bad_geometry_rejected() {
        let mut options = NormalizeOptions::default();
        options.geometry.min_area_ratio = 0.9;
        options.geometry.max_area_ratio = 0.5;
        assert!(options.validate().is_err());
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = NormalizeOptions::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, FolioError::Serialization(_)));
    }
}

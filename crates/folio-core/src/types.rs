// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio document pipeline.

use serde::{Deserialize, Serialize};

/// A pixel coordinate. Detection works on whole pixels but the values are
/// kept as floats so they survive rescaling between resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Multiply each axis by its own factor.
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }
}

/// Four corners of a detected page, always in TL, TR, BR, BL order.
///
/// The order is fixed at construction; cropping maths reads the corners by
/// position and never re-sorts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    corners: [Point; 4],
}

impl Quad {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    /// Axis-aligned quad spanning `left..right` x `top..bottom`.
    pub fn from_bounds(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        )
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Leftmost x of the two left corners.
    pub fn left(&self) -> f32 {
        self.top_left().x.min(self.bottom_left().x)
    }

    /// Rightmost x of the two right corners.
    pub fn right(&self) -> f32 {
        self.top_right().x.max(self.bottom_right().x)
    }

    /// Topmost y of the two top corners.
    pub fn top(&self) -> f32 {
        self.top_left().y.min(self.top_right().y)
    }

    /// Bottommost y of the two bottom corners.
    pub fn bottom(&self) -> f32 {
        self.bottom_left().y.max(self.bottom_right().y)
    }

    pub fn width(&self) -> f32 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    /// Rescale every corner, preserving order.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            corners: self.corners.map(|p| p.scaled(sx, sy)),
        }
    }
}

/// Outcome of page detection.
///
/// `corners == None` is the normal "no page found" outcome, not an error; the
/// pipeline then falls back to the full image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub corners: Option<Quad>,
}

impl DetectionResult {
    pub fn found(quad: Quad) -> Self {
        Self {
            corners: Some(quad),
        }
    }

    pub fn not_found() -> Self {
        Self { corners: None }
    }

    pub fn is_found(&self) -> bool {
        self.corners.is_some()
    }
}

/// Integer crop rectangle in full-resolution pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// The rectangle covering a whole `width` x `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Conventional file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Infer the output format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webp" => Some(Self::Webp),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Final encoded image handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

/// Stages of a single normalisation run.
///
/// A run walks the stages strictly in order and may drop into `Failed` from
/// any non-terminal stage. There is no retry edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Idle,
    Decoding,
    DetectingAtLowRes,
    MappingToFullRes,
    Cropping,
    Normalizing,
    Encoding,
    Done,
    Failed,
}

impl PipelineStage {
    /// The stage that follows this one on the success path.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Decoding),
            Self::Decoding => Some(Self::DetectingAtLowRes),
            Self::DetectingAtLowRes => Some(Self::MappingToFullRes),
            Self::MappingToFullRes => Some(Self::Cropping),
            Self::Cropping => Some(Self::Normalizing),
            Self::Normalizing => Some(Self::Encoding),
            Self::Encoding => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `to` is a legal transition from this stage.
    pub fn can_advance_to(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Decoding => "decoding",
            Self::DetectingAtLowRes => "detecting",
            Self::MappingToFullRes => "mapping",
            Self::Cropping => "cropping",
            Self::Normalizing => "normalizing",
            Self::Encoding => "encoding",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_keeps_corner_order() {
        let quad = Quad::from_bounds(10.0, 20.0, 110.0, 220.0);
        assert_eq!(quad.top_left(), Point::new(10.0, 20.0));
        assert_eq!(quad.top_right(), Point::new(110.0, 20.0));
        assert_eq!(quad.bottom_right(), Point::new(110.0, 220.0));
        assert_eq!(quad.bottom_left(), Point::new(10.0, 220.0));
        assert_eq!(quad.width(), 100.0);
        assert_eq!(quad.height(), 200.0);
    }

    #[test]
    fn quad_scaling_is_per_axis() {
        let quad = Quad::from_bounds(10.0, 10.0, 20.0, 20.0).scaled(2.0, 3.0);
        assert_eq!(quad.top_left(), Point::new(20.0, 30.0));
        assert_eq!(quad.bottom_right(), Point::new(40.0, 60.0));
    }

    #[test]
    fn success_path_walks_every_stage() {
        let mut stage = PipelineStage::Idle;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(stage.can_advance_to(next));
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(stage, PipelineStage::Done);
    }

    #[test]
    fn failed_reachable_from_any_running_stage() {
        for stage in [
            PipelineStage::Idle,
            PipelineStage::Decoding,
            PipelineStage::DetectingAtLowRes,
            PipelineStage::MappingToFullRes,
            PipelineStage::Cropping,
            PipelineStage::Normalizing,
            PipelineStage::Encoding,
        ] {
            assert!(stage.can_advance_to(PipelineStage::Failed), "{stage}");
        }
        assert!(!PipelineStage::Done.can_advance_to(PipelineStage::Failed));
        assert!(!PipelineStage::Failed.can_advance_to(PipelineStage::Decoding));
    }

    #[test]
    fn stages_cannot_be_skipped() {
        assert!(!PipelineStage::Decoding.can_advance_to(PipelineStage::Cropping));
        assert!(!PipelineStage::Encoding.can_advance_to(PipelineStage::Decoding));
    }

    #[test]
    fn output_format_serde_is_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Webp).unwrap();
        assert_eq!(json, "\"webp\"");
        let parsed: OutputFormat = serde_json::from_str("\"jpeg\"").unwrap();
        assert_eq!(parsed, OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("tiff"), None);
    }
}

//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what images to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0–100, default 85). Clamped on construction.
//! - [`Effort`]: WebP compression method (0–6, default 4). Clamped on construction.
//! - [`Geometry`]: Square center-crop or longest-side cap.
//! - [`TransformPolicy`]: Geometry plus encode parameters; one per batch job.
//! - [`ResizeParams`] / [`ThumbnailParams`]: Fully planned backend calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// WebP compression effort (libwebp `method`, 0 = fastest, 6 = smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Effort(pub u32);

impl Effort {
    pub const MAX: u32 = 6;

    pub fn new(value: u32) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Effort {
    fn default() -> Self {
        Self(4)
    }
}

/// Output container. WebP is the only target the portfolio serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
        }
    }
}

/// Encoder settings shared by every item of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
    pub effort: Effort,
}

/// Output geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Geometry {
    /// Largest centered square, resampled to `edge × edge`.
    CenterSquare { edge: u32 },
    /// Longer side capped at `limit`, aspect preserved, never upscaled.
    MaxDimension { limit: u32 },
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::CenterSquare { edge } => write!(f, "square {edge}px"),
            Geometry::MaxDimension { limit } => write!(f, "max {limit}px"),
        }
    }
}

/// Immutable description of the desired output for every item in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformPolicy {
    pub geometry: Geometry,
    pub encode: EncodeParams,
}

impl TransformPolicy {
    pub fn center_square(edge: u32, encode: EncodeParams) -> Self {
        Self {
            geometry: Geometry::CenterSquare { edge },
            encode,
        }
    }

    pub fn max_dimension(limit: u32, encode: EncodeParams) -> Self {
        Self {
            geometry: Geometry::MaxDimension { limit },
            encode,
        }
    }
}

impl fmt::Display for TransformPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} q{} e{}",
            self.geometry,
            self.encode.format.extension(),
            self.encode.quality.value(),
            self.encode.effort.value()
        )
    }
}

/// Parameters for a proportional resize (possibly to the source size).
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    /// Upright source dimensions as reported by identify.
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub encode: EncodeParams,
}

impl ResizeParams {
    /// True when no resample is needed.
    pub fn is_identity(&self) -> bool {
        self.width == self.source_width && self.height == self.source_height
    }
}

/// Parameters for a square thumbnail (center crop + resize).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub edge: u32,
    pub encode: EncodeParams,
}

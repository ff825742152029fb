//! Image processing: pure Rust decode/transform, libwebp encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageDecoder::dimensions` + EXIF orientation, no pixel decode |
//! | **Normalize** | alpha flattened onto white, RGB8, lossless orientation fix |
//! | **Square thumbnail** | center crop + Lanczos3 resize |
//! | **Longest-side cap** | Lanczos3 resize, skipped when the image already fits |
//! | **Encode** | lossy WebP via the `webp` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Pipeline**: Pure buffer → buffer transforms and the encoder
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod pipeline;
pub mod rust_backend;

pub use backend::{Dimensions, ImageBackend, TransformError};
pub use operations::{Rendered, get_dimensions, render};
pub use params::{
    Effort, EncodeParams, Geometry, OutputFormat, Quality, ResizeParams, ThumbnailParams,
    TransformPolicy,
};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};

//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a policy, compute parameters, and call the backend.

use super::backend::{ImageBackend, TransformError};
use super::calculations::fit_within_max;
use super::params::{EncodeParams, Geometry, ResizeParams, ThumbnailParams, TransformPolicy};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Get upright image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// An encoded image ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Plan a longest-side-capped resize without executing it.
pub fn plan_resize(
    source: &Path,
    dims: (u32, u32),
    limit: u32,
    encode: EncodeParams,
) -> ResizeParams {
    let (width, height) = fit_within_max(dims, limit);
    ResizeParams {
        source: source.to_path_buf(),
        source_width: dims.0,
        source_height: dims.1,
        width,
        height,
        encode,
    }
}

/// Plan a square thumbnail without executing it.
pub fn plan_thumbnail(source: &Path, edge: u32, encode: EncodeParams) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        edge,
        encode,
    }
}

/// Run one source through the policy and return the encoded result.
pub fn render(
    backend: &impl ImageBackend,
    source: &Path,
    policy: &TransformPolicy,
) -> Result<Rendered> {
    match policy.geometry {
        Geometry::CenterSquare { edge } => {
            let params = plan_thumbnail(source, edge, policy.encode);
            let bytes = backend.thumbnail(&params)?;
            Ok(Rendered {
                bytes,
                width: edge,
                height: edge,
            })
        }
        Geometry::MaxDimension { limit } => {
            let dims = get_dimensions(backend, source)?;
            let params = plan_resize(source, dims, limit, policy.encode);
            if params.is_identity() {
                log::debug!(
                    "{} already fits within {limit}px, re-encoding at {}x{}",
                    source.display(),
                    dims.0,
                    dims.1
                );
            }
            let bytes = backend.resize(&params)?;
            Ok(Rendered {
                bytes,
                width: params.width,
                height: params.height,
            })
        }
    }
}

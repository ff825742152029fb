//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use image::metadata::Orientation;

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub size: u32,
}

/// Largest centered square inside `(width, height)`.
///
/// Offsets are floored, so an odd surplus leaves the extra pixel on the
/// right/bottom.
///
/// # Examples
/// ```
/// # use portfolio_images::imaging::calculations::{center_square_rect, CropRect};
/// assert_eq!(center_square_rect(4000, 3000), CropRect { left: 500, top: 0, size: 3000 });
/// ```
pub fn center_square_rect(width: u32, height: u32) -> CropRect {
    let size = width.min(height);
    CropRect {
        left: (width - size) / 2,
        top: (height - size) / 2,
        size,
    }
}

/// Dimensions after capping the longer side at `limit`.
///
/// Never upscales: if both sides already fit, the input is returned unchanged.
/// Otherwise the longer side becomes exactly `limit` and the shorter side is
/// `short * limit / long`, truncated. A square source takes the portrait
/// branch, which yields `(limit, limit)` either way.
///
/// The shorter side is clamped to at least 1 so extreme slivers still encode.
///
/// # Examples
/// ```
/// # use portfolio_images::imaging::calculations::fit_within_max;
/// assert_eq!(fit_within_max((4000, 3000), 1920), (1920, 1440));
/// assert_eq!(fit_within_max((800, 600), 1920), (800, 600));
/// ```
pub fn fit_within_max(dims: (u32, u32), limit: u32) -> (u32, u32) {
    let (width, height) = dims;
    if width <= limit && height <= limit {
        return dims;
    }

    let scale = |short: u32, long: u32| -> u32 {
        ((short as u64 * limit as u64) / long as u64).max(1) as u32
    };

    if width > height {
        (limit, scale(height, width))
    } else {
        (scale(width, height), limit)
    }
}

/// Whether an orientation swaps the width and height axes.
pub fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Stored dimensions → upright dimensions for the given EXIF orientation.
pub fn oriented_dimensions(dims: (u32, u32), orientation: Orientation) -> (u32, u32) {
    if swaps_axes(orientation) {
        (dims.1, dims.0)
    } else {
        dims
    }
}

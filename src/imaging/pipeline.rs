//! The deterministic transform pipeline: normalize → geometry → encode.
//!
//! Every function here borrows its input and returns a freshly allocated
//! buffer. Nothing touches the filesystem; [`RustBackend`](super::RustBackend)
//! does the decoding and hands the buffers in.
//!
//! ```text
//! square:  encode(resize_to(center_crop_square(normalize(src)), edge, edge))
//! max-dim: encode(resize_to(normalize(src), fit_within_max(..)))   // resize skipped if unchanged
//! ```

use super::calculations::{center_square_rect, fit_within_max};
use super::params::{EncodeParams, Geometry, OutputFormat};
use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;

/// Encoder failure, without path context (the backend adds that).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("cannot encode an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
    #[error("webp encoder rejected the image: {0}")]
    Codec(String),
}

/// Flatten alpha onto white, convert to 8-bit RGB, and apply orientation.
///
/// Sources with an alpha channel (RGBA, LA; palette PNGs arrive as one of
/// those) are composited `src * a + 255 * (1 - a)`. Everything else is a plain
/// conversion, so grayscale is replicated across channels.
pub fn normalize(src: &DynamicImage, orientation: Orientation) -> RgbImage {
    let rgb = if src.color().has_alpha() {
        flatten_onto_white(src)
    } else {
        src.to_rgb8()
    };
    orient(rgb, orientation)
}

fn flatten_onto_white(src: &DynamicImage) -> RgbImage {
    let rgba = src.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Lossless rotate/mirror for the eight EXIF orientations.
fn orient(img: RgbImage, orientation: Orientation) -> RgbImage {
    match orientation {
        Orientation::NoTransforms => img,
        Orientation::Rotate90 => imageops::rotate90(&img),
        Orientation::Rotate180 => imageops::rotate180(&img),
        Orientation::Rotate270 => imageops::rotate270(&img),
        Orientation::FlipHorizontal => imageops::flip_horizontal(&img),
        Orientation::FlipVertical => imageops::flip_vertical(&img),
        Orientation::Rotate90FlipH => imageops::flip_horizontal(&imageops::rotate90(&img)),
        Orientation::Rotate270FlipH => imageops::flip_horizontal(&imageops::rotate270(&img)),
    }
}

/// Crop the largest centered square. A square input comes back unchanged.
pub fn center_crop_square(img: &RgbImage) -> RgbImage {
    if img.width() == img.height() {
        return img.clone();
    }
    let rect = center_square_rect(img.width(), img.height());
    imageops::crop_imm(img, rect.left, rect.top, rect.size, rect.size).to_image()
}

/// Lanczos3 resample to exactly `width × height`.
pub fn resize_to(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Apply a geometry to an already-normalized buffer.
///
/// Takes ownership so an image that already has the target shape is passed
/// through without a copy.
pub fn apply_geometry(img: RgbImage, geometry: Geometry) -> RgbImage {
    match geometry {
        Geometry::CenterSquare { edge } => {
            let square = if img.width() == img.height() {
                img
            } else {
                center_crop_square(&img)
            };
            if square.dimensions() == (edge, edge) {
                square
            } else {
                resize_to(&square, edge, edge)
            }
        }
        Geometry::MaxDimension { limit } => {
            let dims = img.dimensions();
            let (width, height) = fit_within_max(dims, limit);
            if (width, height) == dims {
                img
            } else {
                resize_to(&img, width, height)
            }
        }
    }
}

/// Encode an RGB buffer with the given parameters.
pub fn encode(img: &RgbImage, params: &EncodeParams) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || img.as_raw().is_empty() {
        return Err(EncodeError::EmptyImage { width, height });
    }

    match params.format {
        OutputFormat::Webp => encode_webp(img, params),
    }
}

fn encode_webp(img: &RgbImage, params: &EncodeParams) -> Result<Vec<u8>, EncodeError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| EncodeError::Codec("invalid libwebp config".into()))?;
    config.lossless = 0;
    config.quality = params.quality.value() as f32;
    config.method = params.effort.value() as i32;

    let encoder = webp::Encoder::from_rgb(img.as_raw(), img.width(), img.height());
    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|e| EncodeError::Codec(format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

/// Full pipeline on a decoded source: normalize, shape, encode.
pub fn transform(
    src: &DynamicImage,
    orientation: Orientation,
    geometry: Geometry,
    params: &EncodeParams,
) -> Result<(Vec<u8>, (u32, u32)), EncodeError> {
    let shaped = apply_geometry(normalize(src, orientation), geometry);
    let bytes = encode(&shaped, params)?;
    Ok((bytes, shaped.dimensions()))
}

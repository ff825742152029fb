//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate, format sniffed from content |
//! | EXIF orientation | `image::ImageDecoder::orientation` |
//! | Normalize / crop / resize | [`pipeline`](super::pipeline) (`Lanczos3`) |
//! | Encode → WebP | `webp` crate (libwebp, lossy, quality + method) |

use super::backend::{Dimensions, ImageBackend, TransformError};
use super::calculations::oriented_dimensions;
use super::params::{EncodeParams, Geometry, ResizeParams, ThumbnailParams};
use super::pipeline::{self, EncodeError};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Case-insensitive check against [`supported_input_extensions`].
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` and `webp` crates.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> TransformError {
    TransformError::Decode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn encode_error(path: &Path, err: EncodeError) -> TransformError {
    TransformError::Encode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Open a decoder for `path`, sniffing the format from the file contents.
///
/// The file handle lives inside the returned decoder and is released when it
/// is dropped, on success and error paths alike.
fn open_decoder(path: &Path) -> Result<impl ImageDecoder, TransformError> {
    let metadata = std::fs::metadata(path).map_err(|e| TransformError::io(path, e))?;
    if metadata.len() == 0 {
        return Err(decode_error(path, "file is empty"));
    }
    ImageReader::open(path)
        .map_err(|e| TransformError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| TransformError::io(path, e))?
        .into_decoder()
        .map_err(|e| decode_error(path, e))
}

fn read_orientation(decoder: &mut impl ImageDecoder, path: &Path) -> Orientation {
    decoder.orientation().unwrap_or_else(|e| {
        log::debug!("ignoring unreadable orientation in {}: {e}", path.display());
        Orientation::NoTransforms
    })
}

/// Decode an image together with its EXIF orientation.
fn load_image(path: &Path) -> Result<(DynamicImage, Orientation), TransformError> {
    let started = Instant::now();
    let mut decoder = open_decoder(path)?;
    let orientation = read_orientation(&mut decoder, path);
    let img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    log::debug!(
        "decoded {} ({}x{}, {:?}, {:?}) in {:?}",
        path.display(),
        img.width(),
        img.height(),
        img.color(),
        orientation,
        started.elapsed()
    );
    Ok((img, orientation))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, TransformError> {
        let mut decoder = open_decoder(path)?;
        let orientation = read_orientation(&mut decoder, path);
        let (width, height) = oriented_dimensions(decoder.dimensions(), orientation);
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, TransformError> {
        // The planned size came from fit_within_max over the upright
        // dimensions, so capping at its longer side reproduces it exactly.
        let limit = params.width.max(params.height);
        let (bytes, dims) = run_pipeline(
            &params.source,
            Geometry::MaxDimension { limit },
            &params.encode,
        )?;
        if dims != (params.width, params.height) {
            return Err(TransformError::Encode {
                path: params.source.clone(),
                reason: format!(
                    "planned {}x{} but source produced {}x{}",
                    params.width, params.height, dims.0, dims.1
                ),
            });
        }
        Ok(bytes)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, TransformError> {
        let (bytes, _) = run_pipeline(
            &params.source,
            Geometry::CenterSquare { edge: params.edge },
            &params.encode,
        )?;
        Ok(bytes)
    }
}

/// Decode `source` and run it through [`pipeline::transform`].
fn run_pipeline(
    source: &Path,
    geometry: Geometry,
    encode: &EncodeParams,
) -> Result<(Vec<u8>, (u32, u32)), TransformError> {
    let (img, orientation) = load_image(source)?;
    let started = Instant::now();
    let (bytes, (width, height)) = pipeline::transform(&img, orientation, geometry, encode)
        .map_err(|e| encode_error(source, e))?;
    log::debug!(
        "{geometry} of {} at {width}x{height} in {:?}",
        source.display(),
        started.elapsed()
    );
    Ok((bytes, (width, height)))
}

//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, resize, and thumbnail. Backends return encoded bytes and
//! never write output files; the batch runner persists them only once the
//! whole item has succeeded.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{ResizeParams, ThumbnailParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Per-item failure. Always names the offending file.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("failed to encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub fn path(&self) -> &Path {
        match self {
            TransformError::InputNotFound(path) => path,
            TransformError::Decode { path, .. }
            | TransformError::Encode { path, .. }
            | TransformError::Io { path, .. } => path,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            TransformError::InputNotFound(path.to_path_buf())
        } else {
            TransformError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Result of an identify operation (upright, orientation already applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get upright image dimensions without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, TransformError>;

    /// Normalize, resize to the planned dimensions, and encode.
    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, TransformError>;

    /// Normalize, center-crop, resize to a square, and encode.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, TransformError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::EncodeParams;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        /// Sources (by file name) whose operations should fail with a decode error.
        pub failing: Mutex<HashSet<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            width: u32,
            height: u32,
            quality: u32,
            effort: u32,
        },
        Thumbnail {
            source: String,
            edge: u32,
            quality: u32,
            effort: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn failing_on(self, file_name: &str) -> Self {
            self.failing.lock().unwrap().insert(file_name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn check_failure(&self, path: &Path) -> Result<(), TransformError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if self.failing.lock().unwrap().contains(&name) {
                return Err(TransformError::Decode {
                    path: path.to_path_buf(),
                    reason: "mock decode failure".into(),
                });
            }
            Ok(())
        }
    }

    /// Deterministic stand-in for encoded output.
    pub fn mock_bytes(width: u32, height: u32) -> Vec<u8> {
        format!("mock-webp {width}x{height}").into_bytes()
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, TransformError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));
            self.check_failure(path)?;

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| TransformError::Decode {
                    path: path.to_path_buf(),
                    reason: "no mock dimensions".into(),
                })
        }

        fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, TransformError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.encode.quality.value(),
                effort: params.encode.effort.value(),
            });
            self.check_failure(&params.source)?;
            Ok(mock_bytes(params.width, params.height))
        }

        fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, TransformError> {
            self.operations.lock().unwrap().push(RecordedOp::Thumbnail {
                source: params.source.to_string_lossy().to_string(),
                edge: params.edge,
                quality: params.encode.quality.value(),
                effort: params.encode.effort.value(),
            });
            self.check_failure(&params.source)?;
            Ok(mock_bytes(params.edge, params.edge))
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_records_thumbnail() {
        let backend = MockBackend::new();
        let bytes = backend
            .thumbnail(&ThumbnailParams {
                source: "/source.jpg".into(),
                edge: 256,
                encode: EncodeParams::default(),
            })
            .unwrap();
        assert_eq!(bytes, mock_bytes(256, 256));
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Thumbnail {
                edge: 256,
                quality: 85,
                effort: 4,
                ..
            }
        ));
    }

    #[test]
    fn mock_failure_is_decode_error_with_path() {
        let backend = MockBackend::new().failing_on("broken.jpg");
        let err = backend
            .thumbnail(&ThumbnailParams {
                source: "/in/broken.jpg".into(),
                edge: 10,
                encode: EncodeParams::default(),
            })
            .unwrap_err();
        assert!(matches!(err, TransformError::Decode { .. }));
        assert_eq!(err.path(), Path::new("/in/broken.jpg"));
    }

    #[test]
    fn io_not_found_maps_to_input_not_found() {
        let err = TransformError::io(
            Path::new("/missing.jpg"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, TransformError::InputNotFound(_)));
        assert_eq!(err.to_string(), "input not found: /missing.jpg");
    }
}

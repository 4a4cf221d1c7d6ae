//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the three operations the enhancement
//! engine delegates: decode, resize, and encode. The pixel passes themselves
//! (grayscale, contrast, sharpen) are pure functions in
//! [`operations`](super::operations) and never go through a backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) on the `image` crate.

use super::params::Quality;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image backends.
///
/// `Send + Sync` so one backend can be shared between the orchestrator and
/// capture sources behind an `Arc`.
pub trait ImageBackend: Send + Sync {
    /// Decode a compressed image (JPEG, PNG, ...) into an RGBA buffer.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Resample to exactly `width`×`height`.
    fn resize(&self, image: &RgbaImage, width: u32, height: u32)
    -> Result<RgbaImage, BackendError>;

    /// Encode as a compressed payload. Alpha is not carried.
    fn encode(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError>;

    /// MIME type of what [`encode`](Self::encode) produces.
    fn mime_type(&self) -> &'static str;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations and can be told to fail.
    ///
    /// `resize` is a nearest-neighbour sample so dimension checks stay
    /// meaningful; `encode` returns the raw RGBA buffer unchanged, so tests
    /// can inspect the pixels the pipeline produced. Uses Mutex (not
    /// RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Number of upcoming `encode` calls that fail.
        pub failing_encodes: Mutex<u32>,
        pub fail_resize: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Resize { width: u32, height: u32 },
        Encode { width: u32, height: u32, quality: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_encodes(n: u32) -> Self {
            Self {
                failing_encodes: Mutex::new(n),
                ..Self::default()
            }
        }

        pub fn failing_resize() -> Self {
            Self {
                fail_resize: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            Err(BackendError::ProcessingFailed(
                "mock backend cannot decode".into(),
            ))
        }

        fn resize(
            &self,
            image: &RgbaImage,
            width: u32,
            height: u32,
        ) -> Result<RgbaImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Resize { width, height });
            if self.fail_resize {
                return Err(BackendError::ProcessingFailed("mock resize failure".into()));
            }
            Ok(RgbaImage::from_fn(width, height, |x, y| {
                let sx = (x as u64 * image.width() as u64 / width as u64) as u32;
                let sy = (y as u64 * image.height() as u64 / height as u64) as u32;
                *image.get_pixel(sx, sy)
            }))
        }

        fn encode(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: image.width(),
                height: image.height(),
                quality: quality.value(),
            });
            let mut remaining = self.failing_encodes.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BackendError::ProcessingFailed("mock encode failure".into()));
            }
            Ok(image.as_raw().clone())
        }

        fn mime_type(&self) -> &'static str {
            "image/x-raw-rgba"
        }
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::new();
        let img = RgbaImage::new(4, 3);

        let bytes = backend.encode(&img, Quality::new(90)).unwrap();
        assert_eq!(bytes.len(), 4 * 3 * 4);

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Encode {
                width: 4,
                height: 3,
                quality: 90
            }]
        );
    }

    #[test]
    fn mock_fails_requested_number_of_encodes() {
        let backend = MockBackend::failing_encodes(1);
        let img = RgbaImage::new(2, 2);

        assert!(backend.encode(&img, Quality::default()).is_err());
        assert!(backend.encode(&img, Quality::default()).is_ok());
    }

    #[test]
    fn mock_resize_produces_requested_dimensions() {
        let backend = MockBackend::new();
        let img = RgbaImage::new(10, 20);

        let out = backend.resize(&img, 5, 10).unwrap();
        assert_eq!(out.dimensions(), (5, 10));
    }
}

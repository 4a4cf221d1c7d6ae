//! Capture device boundary.
//!
//! A capture produces exactly one [`RawCapture`]: an in-memory RGBA still at
//! whatever resolution the device delivered. The orchestrator never
//! configures the device; it only asks a [`CaptureSource`] for the next frame.
//!
//! [`FileCapture`] is the source the CLI uses: it reads a photo from disk and
//! decodes it through an [`ImageBackend`].

use crate::imaging::{ImageBackend, supported_input_extensions};
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    Unavailable(String),
    #[error("Capture permission denied")]
    Denied,
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not decode captured image: {0}")]
    Decode(#[from] crate::imaging::BackendError),
    #[error("Invalid pixel buffer: {width}x{height} with {len} bytes")]
    InvalidBuffer { width: u32, height: u32, len: usize },
}

/// A single still frame, RGBA, owned by whichever pipeline stage holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    image: RgbaImage,
}

impl RawCapture {
    /// Wrap a raw RGBA byte buffer. The buffer must hold exactly
    /// `width * height * 4` bytes and both dimensions must be non-zero.
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, CaptureError> {
        let len = bytes.len();
        if width == 0 || height == 0 || len != width as usize * height as usize * 4 {
            return Err(CaptureError::InvalidBuffer { width, height, len });
        }
        RgbaImage::from_raw(width, height, bytes)
            .map(|image| Self { image })
            .ok_or(CaptureError::InvalidBuffer { width, height, len })
    }

    /// Wrap an already-decoded image.
    pub fn from_image(image: RgbaImage) -> Result<Self, CaptureError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidBuffer {
                width,
                height,
                len: 0,
            });
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Anything that can deliver one still image on request.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn capture(&self) -> Result<RawCapture, CaptureError>;
}

/// Capture source reading a photo file.
pub struct FileCapture {
    path: PathBuf,
    backend: Arc<dyn ImageBackend>,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>, backend: Arc<dyn ImageBackend>) -> Self {
        Self {
            path: path.into(),
            backend,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

#[async_trait]
impl CaptureSource for FileCapture {
    async fn capture(&self) -> Result<RawCapture, CaptureError> {
        if !has_supported_extension(&self.path) {
            return Err(CaptureError::Unavailable(format!(
                "{} is not a supported photo ({})",
                self.path.display(),
                supported_input_extensions().join(", ")
            )));
        }
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "read capture file");
        let backend = Arc::clone(&self.backend);
        let image = tokio::task::spawn_blocking(move || backend.decode(&bytes))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
                CaptureError::Unavailable(format!(
                    "decode of {} was cancelled",
                    self.path.display()
                ))
            })??;
        RawCapture::from_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::ThreadTrackingBackend;
    use image::{DynamicImage, ImageFormat, Rgba};
    use tempfile::TempDir;

    #[test]
    fn from_rgba_accepts_matching_buffer() {
        let capture = RawCapture::from_rgba(3, 2, vec![0; 24]).unwrap();
        assert_eq!((capture.width(), capture.height()), (3, 2));
    }

    #[test]
    fn from_rgba_rejects_short_buffer() {
        let err = RawCapture::from_rgba(3, 2, vec![0; 23]).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidBuffer {
                width: 3,
                height: 2,
                len: 23
            }
        ));
    }

    #[test]
    fn from_rgba_rejects_zero_dimension() {
        assert!(RawCapture::from_rgba(0, 5, Vec::new()).is_err());
    }

    #[test]
    fn from_image_rejects_empty() {
        assert!(RawCapture::from_image(RgbaImage::new(0, 0)).is_err());
    }

    #[tokio::test]
    async fn file_capture_decodes_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("card.png");
        let img = RgbaImage::from_pixel(12, 7, Rgba([200, 10, 10, 255]));
        DynamicImage::ImageRgba8(img)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let source = FileCapture::new(&path, Arc::new(RustBackend::new()));
        let capture = source.capture().await.unwrap();
        assert_eq!((capture.width(), capture.height()), (12, 7));
        assert_eq!(capture.image().get_pixel(3, 3), &Rgba([200, 10, 10, 255]));
    }

    #[tokio::test]
    async fn file_capture_decodes_off_the_runtime_thread() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("card.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        let backend = Arc::new(ThreadTrackingBackend::new(RustBackend::new()));

        let source = FileCapture::new(&path, backend.clone());
        source.capture().await.unwrap();

        let threads = backend.threads();
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[tokio::test]
    async fn file_capture_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let source = FileCapture::new(
            tmp.path().join("missing.jpg"),
            Arc::new(RustBackend::new()),
        );
        assert!(matches!(
            source.capture().await,
            Err(CaptureError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn file_capture_rejects_unsupported_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let source = FileCapture::new(&path, Arc::new(RustBackend::new()));
        assert!(matches!(
            source.capture().await,
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn file_capture_corrupt_image_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"\xFF\xD8garbage").unwrap();

        let source = FileCapture::new(&path, Arc::new(RustBackend::new()));
        assert!(matches!(
            source.capture().await,
            Err(CaptureError::Decode(_))
        ));
    }
}

//! Shared test utilities for the cardscan test suite.
//!
//! Canned collaborators for driving the orchestrator without a camera or a
//! network: capture sources, extraction clients, and review handlers.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let extractor = StaticExtractor::fields(acme_traders());
//! let outcome = orchestrator.capture(&FixedCapture::card()).await?;
//! assert_eq!(extractor.calls(), 1);
//! ```

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::ThreadId;
use tokio::sync::Notify;

use crate::capture::{CaptureError, CaptureSource, RawCapture};
use crate::extract::{ExtractionClient, ExtractionError, ExtractionResult};
use crate::imaging::{BackendError, EnhancedImage, ImageBackend, Quality};
use crate::orchestrator::{ReviewDecision, ReviewHandler};
use crate::record::{BusinessType, ContactRecord};
use crate::repository::{MemoryStore, RecordStore, StorageError};

// =========================================================================
// Records and field mappings
// =========================================================================

/// A minimal record with a fixed timestamp.
pub fn sample_record(id: &str, company: &str) -> ContactRecord {
    ContactRecord {
        id: id.to_string(),
        company_name: company.to_string(),
        address: String::new(),
        contact_person: String::new(),
        contact_number: "0000000000".to_string(),
        whatsapp_number: String::new(),
        email: String::new(),
        website: String::new(),
        nature_of_business: String::new(),
        business_type: BusinessType::Other,
        notes: String::new(),
        captured_at: 1_700_000_000_000,
    }
}

/// Two fields only: the rest must come out empty.
pub fn acme_traders() -> ExtractionResult {
    ExtractionResult {
        company_name: Some("Acme Traders".to_string()),
        contact_number: Some("9876543210".to_string()),
        ..Default::default()
    }
}

// =========================================================================
// Capture sources
// =========================================================================

/// A synthetic card: white background, dark band across the middle.
pub fn card_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, y| {
        if y >= height / 3 && y < 2 * height / 3 {
            Rgba([30, 30, 60, 255])
        } else {
            Rgba([245, 245, 240, 255])
        }
    })
}

/// Returns a clone of the same frame on every capture.
pub struct FixedCapture(pub RawCapture);

impl FixedCapture {
    pub fn card() -> Self {
        Self(RawCapture::from_image(card_image(40, 24)).unwrap())
    }
}

#[async_trait]
impl CaptureSource for FixedCapture {
    async fn capture(&self) -> Result<RawCapture, CaptureError> {
        Ok(self.0.clone())
    }
}

pub struct FailingCapture;

#[async_trait]
impl CaptureSource for FailingCapture {
    async fn capture(&self) -> Result<RawCapture, CaptureError> {
        Err(CaptureError::Denied)
    }
}

// =========================================================================
// Imaging
// =========================================================================

/// Wraps a backend and remembers which thread each call ran on.
pub struct ThreadTrackingBackend<B> {
    inner: B,
    threads: Mutex<Vec<ThreadId>>,
}

impl<B: ImageBackend> ThreadTrackingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            threads: Mutex::new(Vec::new()),
        }
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().unwrap().clone()
    }

    fn track(&self) {
        self.threads.lock().unwrap().push(std::thread::current().id());
    }
}

impl<B: ImageBackend> ImageBackend for ThreadTrackingBackend<B> {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        self.track();
        self.inner.decode(bytes)
    }

    fn resize(
        &self,
        image: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError> {
        self.track();
        self.inner.resize(image, width, height)
    }

    fn encode(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        self.track();
        self.inner.encode(image, quality)
    }

    fn mime_type(&self) -> &'static str {
        self.inner.mime_type()
    }
}

// =========================================================================
// Extraction clients
// =========================================================================

/// Answers every request with the same mapping, or the same failure.
pub struct StaticExtractor {
    result: Option<ExtractionResult>,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn fields(result: ExtractionResult) -> Self {
        Self {
            result: Some(result),
            calls: AtomicUsize::new(0),
        }
    }

    /// Behaves like an unreachable service.
    pub fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionClient for StaticExtractor {
    fn name(&self) -> &str {
        "static"
    }

    async fn extract(&self, image: &EnhancedImage) -> Result<ExtractionResult, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!image.is_empty(), "orchestrator sent an empty payload");
        self.result.clone().ok_or(ExtractionError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Signals `started` when a request arrives, then holds it until `release`.
pub struct GatedExtractor {
    result: ExtractionResult,
    pub started: Notify,
    pub release: Notify,
}

impl GatedExtractor {
    pub fn new(result: ExtractionResult) -> Self {
        Self {
            result,
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ExtractionClient for GatedExtractor {
    fn name(&self) -> &str {
        "gated"
    }

    async fn extract(&self, _image: &EnhancedImage) -> Result<ExtractionResult, ExtractionError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.result.clone())
    }
}

// =========================================================================
// Storage
// =========================================================================

/// In-memory store whose writes fail while `failing` is set.
pub struct FlakyStore {
    inner: MemoryStore,
    pub failing: AtomicBool,
}

impl FlakyStore {
    pub fn failing() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(true),
        }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: "flaky.json".into(),
                source: io::Error::other("disk full"),
            });
        }
        Ok(())
    }
}

impl RecordStore for FlakyStore {
    fn list_all(&self) -> Vec<ContactRecord> {
        self.inner.list_all()
    }

    fn upsert(&self, record: ContactRecord) -> Result<(), StorageError> {
        self.check()?;
        self.inner.upsert(record)
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.delete(id)
    }

    fn delete_all(&self) -> Result<(), StorageError> {
        self.check()?;
        self.inner.delete_all()
    }
}

// =========================================================================
// Review handlers
// =========================================================================

/// Confirms after overwriting the email field.
pub struct EditingReviewer {
    email: String,
}

impl EditingReviewer {
    pub fn set_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
        }
    }
}

#[async_trait]
impl ReviewHandler for EditingReviewer {
    async fn review(&self, record: &ContactRecord) -> ReviewDecision {
        let mut edited = record.clone();
        edited.email = self.email.clone();
        ReviewDecision::Confirm(edited)
    }
}

pub struct DiscardingReviewer;

#[async_trait]
impl ReviewHandler for DiscardingReviewer {
    async fn review(&self, _record: &ContactRecord) -> ReviewDecision {
        ReviewDecision::Discard
    }
}

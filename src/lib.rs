//! # cardscan
//!
//! Capture contact details from photos of business cards, shop signs, and
//! banners. A photo goes through one capture cycle and comes out as a
//! structured [`record::ContactRecord`] stored in a local, newest-first list.
//!
//! # Architecture: One Capture Cycle
//!
//! ```text
//! 1. Capture   camera / file      →  RawCapture       (RGBA still)
//! 2. Enhance   RawCapture         →  EnhancedImage    (bounded, gray, contrast, sharpen, JPEG)
//! 3. Extract   EnhancedImage      →  ExtractionResult (partial field mapping)
//! 4. Record    ExtractionResult   →  ContactRecord    (id + timestamp assigned)
//! 5. Persist   auto-save on: straight to the repository
//!              auto-save off: held for review, then confirm or discard
//! ```
//!
//! Every stage boundary is a trait, so the orchestrator runs the same way
//! against a real camera and network service or against in-memory test
//! doubles:
//!
//! - [`capture::CaptureSource`] delivers one still.
//! - [`imaging::ImageBackend`] decodes, resizes, and encodes pixels.
//! - [`extract::ExtractionClient`] talks to the extraction service.
//! - [`repository::RecordStore`] persists records.
//! - [`preferences::PreferenceSource`] answers the auto-save question.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`capture`] | Capture boundary and the file-backed source the CLI uses |
//! | [`imaging`] | Enhancement pipeline: resize, grayscale + contrast, sharpen, JPEG encode |
//! | [`extract`] | Field schema, instruction text, and the Gemini extraction client |
//! | [`record`] | `ContactRecord`, `BusinessType`, and construction from an extraction |
//! | [`repository`] | Newest-first record storage (JSON document or in-memory) |
//! | [`preferences`] | The persisted auto-save flag |
//! | [`orchestrator`] | The capture-cycle state machine |
//! | [`config`] | `cardscan.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting for records and cycle results |
//!
//! # Design Decisions
//!
//! ## Enhancement Never Fails the Cycle
//!
//! A photo that cannot be enhanced is still worth sending: the pipeline
//! falls back to re-encoding the original frame, and only if that also fails
//! does it hand over an empty payload (which the extraction client refuses).
//! Extraction is the one stage whose failure ends a cycle.
//!
//! ## Nothing Is Saved Without a Decision
//!
//! With auto-save off, the constructed record sits in a
//! [`orchestrator::PendingReview`] that holds the cycle open. Confirming
//! persists it (under the identifier and timestamp assigned at
//! construction); discarding or simply dropping it leaves storage untouched.
//!
//! ## A Started Cycle Finishes
//!
//! After the still is captured, the cycle runs on its own tokio task.
//! Dropping the future returned by [`orchestrator::Orchestrator::capture`]
//! stops the caller from waiting, not the extraction.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, and JPEG encoding all use the `image`
//! crate; the per-pixel passes run on rayon. No system libraries required.

pub mod capture;
pub mod config;
pub mod extract;
pub mod imaging;
pub mod orchestrator;
pub mod output;
pub mod preferences;
pub mod record;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_helpers;

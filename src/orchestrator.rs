//! Capture orchestrator: one photo in, one contact record out.
//!
//! ```text
//!          capture request
//! Idle ─────────────────────▶ Capturing ──▶ Enhancing ──▶ Extracting
//!  ▲                              │                           │
//!  │        CaptureError          │          ExtractionError  ▼
//!  ├──────────────────────────────┘               ┌──────── Failed
//!  │                                              │
//!  ├──────────────────────────────────────────────┘
//!  │                                     auto-save on         │ auto-save off
//!  ├──────────────────────── AutoSaving ◀────────────────────┤
//!  │                                                          ▼
//!  └──────────── confirm / discard ─────────────────── AwaitingReview
//! ```
//!
//! ## One cycle at a time
//!
//! A cycle holds an owned guard on the orchestrator's cycle lock from the
//! capture request until it is back at `Idle`. For the review branch the
//! guard travels inside [`PendingReview`], so a second capture is rejected
//! with [`CycleError::Busy`] until the review is confirmed, discarded, or
//! dropped.
//!
//! ## Cancellation
//!
//! Once the still is captured, the rest of the cycle runs on its own tokio
//! task that owns the guard, and [`Orchestrator::capture`] only awaits it.
//! Dropping the `capture` future (a timeout, `select!`, Ctrl-C) therefore
//! never aborts an extraction in flight: the task finishes, saves when
//! auto-save is on, and settles the state back to `Idle`. A review produced
//! by an abandoned cycle has no one to hand it to and is discarded.
//!
//! Enhancement runs on the blocking pool so the runtime keeps serving other
//! work while the pixel passes run.

use crate::capture::{CaptureError, CaptureSource, RawCapture};
use crate::extract::{ExtractionClient, ExtractionError};
use crate::imaging::{EnhanceParams, ImageBackend, enhance};
use crate::preferences::PreferenceSource;
use crate::record::ContactRecord;
use crate::repository::{RecordStore, StorageError};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Enhancing,
    Extracting,
    AutoSaving,
    AwaitingReview,
    Failed,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("A capture is already in progress")]
    Busy,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("The capture cycle was cancelled by runtime shutdown")]
    Interrupted,
}

/// A reviewed record that could not be saved.
///
/// Carries the review and the edits back so the caller can retry
/// [`Orchestrator::confirm`] or give up; the cycle stays open until the
/// review is dropped.
#[derive(Error, Debug)]
#[error("Could not save reviewed record: {source}")]
pub struct ConfirmError {
    pub review: PendingReview,
    pub edited: ContactRecord,
    #[source]
    pub source: StorageError,
}

impl ConfirmError {
    pub fn into_parts(self) -> (PendingReview, ContactRecord) {
        (self.review, self.edited)
    }
}

/// Callback fired on every state transition.
pub type StateObserver = Arc<dyn Fn(CaptureState) + Send + Sync>;

struct StateCell {
    current: Mutex<CaptureState>,
    observer: Option<StateObserver>,
}

impl StateCell {
    fn get(&self) -> CaptureState {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, next: CaptureState) {
        let prev = {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *current, next)
        };
        debug!(from = %prev, to = %next, "capture state");
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }
}

/// A constructed record waiting for the review collaborator.
///
/// Holds the cycle open. Dropping it without [`Orchestrator::confirm`] is
/// the same as [`Orchestrator::discard`].
pub struct PendingReview {
    record: ContactRecord,
    state: Arc<StateCell>,
    _cycle: OwnedMutexGuard<()>,
}

impl PendingReview {
    pub fn record(&self) -> &ContactRecord {
        &self.record
    }
}

impl fmt::Debug for PendingReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingReview")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl Drop for PendingReview {
    fn drop(&mut self) {
        // Runs before the cycle guard is released.
        self.state.set(CaptureState::Idle);
    }
}

/// Sets `Idle` when dropped, unless disarmed first. Covers the paths where
/// a cycle ends by unwinding or by its future being dropped.
struct SettleOnDrop(Option<Arc<StateCell>>);

impl SettleOnDrop {
    fn arm(state: &Arc<StateCell>) -> Self {
        Self(Some(Arc::clone(state)))
    }

    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        if let Some(state) = self.0.take() {
            state.set(CaptureState::Idle);
        }
    }
}

fn task_failure(e: JoinError) -> CycleError {
    if e.is_panic() {
        std::panic::resume_unwind(e.into_panic());
    }
    warn!(error = %e, "capture cycle task cancelled");
    CycleError::Interrupted
}

/// How a capture request ended.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Auto-save was on; the record is persisted and `records` is the
    /// refreshed listing.
    Saved {
        record: ContactRecord,
        records: Vec<ContactRecord>,
    },
    /// Auto-save was off; nothing is persisted yet.
    AwaitingReview(PendingReview),
}

/// What the review collaborator decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Save this (possibly edited) record.
    Confirm(ContactRecord),
    Discard,
}

/// The review/edit collaborator: sees one unsaved record, returns a decision.
#[async_trait]
pub trait ReviewHandler: Send + Sync {
    async fn review(&self, record: &ContactRecord) -> ReviewDecision;
}

/// Final result of a cycle driven through a [`ReviewHandler`].
#[derive(Debug)]
pub enum CycleResult {
    Saved {
        record: ContactRecord,
        records: Vec<ContactRecord>,
    },
    Discarded,
}

/// The collaborators one cycle needs, cloned into the task that runs it.
#[derive(Clone)]
struct Stages {
    backend: Arc<dyn ImageBackend>,
    extractor: Arc<dyn ExtractionClient>,
    repository: Arc<dyn RecordStore>,
    preferences: Arc<dyn PreferenceSource>,
    params: EnhanceParams,
    state: Arc<StateCell>,
}

impl Stages {
    /// Enhance through to a saved record or a pending review.
    async fn run(
        self,
        raw: RawCapture,
        cycle: OwnedMutexGuard<()>,
    ) -> Result<CaptureOutcome, CycleError> {
        let settle = SettleOnDrop::arm(&self.state);

        self.state.set(CaptureState::Enhancing);
        let backend = Arc::clone(&self.backend);
        let params = self.params;
        let enhanced =
            tokio::task::spawn_blocking(move || enhance(backend.as_ref(), raw, &params))
                .await
                .map_err(task_failure)?;

        self.state.set(CaptureState::Extracting);
        let extracted = self.extractor.extract(&enhanced).await;
        drop(enhanced);
        let result = match extracted {
            Ok(result) => result,
            Err(e) => {
                warn!(extractor = self.extractor.name(), error = %e, "extraction failed");
                self.state.set(CaptureState::Failed);
                drop(settle);
                return Err(e.into());
            }
        };

        let record = ContactRecord::new_from_extraction(result);

        if self.preferences.auto_save() {
            self.state.set(CaptureState::AutoSaving);
            let saved = self.repository.upsert(record.clone());
            let records = self.repository.list_all();
            drop(settle);
            saved?;
            info!(id = %record.id, company = %record.display_name(), "record saved");
            Ok(CaptureOutcome::Saved { record, records })
        } else {
            settle.disarm();
            self.state.set(CaptureState::AwaitingReview);
            info!(id = %record.id, company = %record.display_name(), "record awaiting review");
            Ok(CaptureOutcome::AwaitingReview(PendingReview {
                record,
                state: self.state,
                _cycle: cycle,
            }))
        }
    }
}

pub struct Orchestrator {
    stages: Stages,
    cycle: Arc<tokio::sync::Mutex<()>>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        extractor: Arc<dyn ExtractionClient>,
        repository: Arc<dyn RecordStore>,
        preferences: Arc<dyn PreferenceSource>,
    ) -> Self {
        Self {
            stages: Stages {
                backend,
                extractor,
                repository,
                preferences,
                params: EnhanceParams::default(),
                state: Arc::new(StateCell {
                    current: Mutex::new(CaptureState::Idle),
                    observer: None,
                }),
            },
            cycle: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn with_params(mut self, params: EnhanceParams) -> Self {
        self.stages.params = params;
        self
    }

    pub fn with_observer(mut self, observer: StateObserver) -> Self {
        self.stages.state = Arc::new(StateCell {
            current: Mutex::new(self.stages.state.get()),
            observer: Some(observer),
        });
        self
    }

    pub fn state(&self) -> CaptureState {
        self.stages.state.get()
    }

    pub fn records(&self) -> Vec<ContactRecord> {
        self.stages.repository.list_all()
    }

    /// Run one capture cycle up to either a saved record or a pending review.
    ///
    /// Cancel-safe: if this future is dropped after the capture step, the
    /// cycle still runs to completion in the background.
    pub async fn capture(&self, source: &dyn CaptureSource) -> Result<CaptureOutcome, CycleError> {
        let cycle = self
            .cycle
            .clone()
            .try_lock_owned()
            .map_err(|_| CycleError::Busy)?;

        let state = &self.stages.state;
        state.set(CaptureState::Capturing);
        let settle = SettleOnDrop::arm(state);
        let raw = match source.capture().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "capture failed");
                drop(settle);
                return Err(e.into());
            }
        };
        settle.disarm();

        tokio::spawn(self.stages.clone().run(raw, cycle))
            .await
            .unwrap_or_else(|e| Err(task_failure(e)))
    }

    /// Persist a reviewed record and close the cycle.
    ///
    /// The identifier and `captured_at` always come from the pending record,
    /// whatever the reviewer did to them. On a storage failure the review
    /// comes back inside the error, still holding the cycle.
    pub fn confirm(
        &self,
        review: PendingReview,
        edited: ContactRecord,
    ) -> Result<Vec<ContactRecord>, ConfirmError> {
        self.save_reviewed(review, edited).map(|(_, records)| records)
    }

    fn save_reviewed(
        &self,
        review: PendingReview,
        mut edited: ContactRecord,
    ) -> Result<(ContactRecord, Vec<ContactRecord>), ConfirmError> {
        edited.id = review.record.id.clone();
        edited.captured_at = review.record.captured_at;
        let repository = &self.stages.repository;
        if let Err(source) = repository.upsert(edited.clone()) {
            warn!(id = %edited.id, error = %source, "reviewed record not saved");
            return Err(ConfirmError {
                review,
                edited,
                source,
            });
        }
        info!(id = %edited.id, company = %edited.display_name(), "reviewed record saved");
        let records = repository.list_all();
        drop(review);
        Ok((edited, records))
    }

    /// Drop a reviewed record without touching the repository.
    pub fn discard(&self, review: PendingReview) {
        info!(id = %review.record.id, "reviewed record discarded");
        drop(review);
    }

    /// Capture, then hand the record to `reviewer` if auto-save is off.
    ///
    /// A failed save ends the cycle with [`CycleError::Storage`]; callers
    /// that want to retry drive [`capture`](Self::capture) and
    /// [`confirm`](Self::confirm) themselves.
    pub async fn capture_with_review(
        &self,
        source: &dyn CaptureSource,
        reviewer: &dyn ReviewHandler,
    ) -> Result<CycleResult, CycleError> {
        match self.capture(source).await? {
            CaptureOutcome::Saved { record, records } => Ok(CycleResult::Saved { record, records }),
            CaptureOutcome::AwaitingReview(pending) => {
                match reviewer.review(pending.record()).await {
                    ReviewDecision::Confirm(edited) => {
                        let (record, records) = self
                            .save_reviewed(pending, edited)
                            .map_err(|e| CycleError::Storage(e.source))?;
                        Ok(CycleResult::Saved { record, records })
                    }
                    ReviewDecision::Discard => {
                        self.discard(pending);
                        Ok(CycleResult::Discarded)
                    }
                }
            }
        }
    }

    /// Edit-and-confirm of an existing record, outside any capture cycle.
    ///
    /// Keeps the stored `captured_at` when the record already exists.
    pub fn update_record(
        &self,
        mut record: ContactRecord,
    ) -> Result<Vec<ContactRecord>, StorageError> {
        let repository = &self.stages.repository;
        if let Some(existing) = repository.get(&record.id) {
            record.captured_at = existing.captured_at;
        }
        repository.upsert(record)?;
        Ok(repository.list_all())
    }
}

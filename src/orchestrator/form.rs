//! Form controller.
//!
//! Holds the record snapshot and submission status, and mediates between user
//! input, validation, and the document store. A submission is split into
//! `begin_submit` (validate, stamp, hand out the write) and `finish_submit`
//! (apply the outcome) so the write can run off the UI thread; `submit` runs
//! both back to back.

use crate::clock::{iso_timestamp, Clock};
use crate::error::{StoreError, SubmitError};
use crate::model::{DocumentRef, FieldId, RegistrationRecord, StoredRegistration, SubmitStatus};
use crate::store::{DocumentStore, REGISTRATIONS_COLLECTION};
use crate::validate;
use std::sync::Arc;

/// A validated document waiting to be written.
pub struct PendingSubmission {
    pub document: StoredRegistration,
    collection: &'static str,
    store: Arc<dyn DocumentStore>,
}

impl PendingSubmission {
    /// Issue the single create-document call for this submission.
    pub async fn write(self) -> Result<DocumentRef, StoreError> {
        self.store
            .create_document(self.collection, &self.document)
            .await
    }
}

impl std::fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("collection", &self.collection)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

pub struct FormController {
    record: RegistrationRecord,
    submitting: bool,
    status: SubmitStatus,
    error_message: String,
    last_document: Option<DocumentRef>,
    /// Snapshot handed to the store by the outstanding write.
    sending: Option<StoredRegistration>,
    last_stored: Option<StoredRegistration>,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl FormController {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            record: RegistrationRecord::default(),
            submitting: false,
            status: SubmitStatus::Idle,
            error_message: String::new(),
            last_document: None,
            sending: None,
            last_stored: None,
            store,
            clock,
        }
    }

    /// Start from a pre-filled snapshot (non-interactive submissions).
    pub fn with_record(mut self, record: RegistrationRecord) -> Self {
        self.record = record;
        self
    }

    pub fn record(&self) -> &RegistrationRecord {
        &self.record
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn last_document(&self) -> Option<&DocumentRef> {
        self.last_document.as_ref()
    }

    /// The document written by the most recent successful submission.
    pub fn last_stored(&self) -> Option<&StoredRegistration> {
        self.last_stored.as_ref()
    }

    /// Replace one field. Only the payment method can fail (unknown value).
    pub fn update_field(&mut self, field: FieldId, value: &str) -> Result<(), String> {
        self.record = self.record.with_field(field, value)?;
        Ok(())
    }

    /// Back to idle after the user dismisses a banner.
    pub fn dismiss_status(&mut self) {
        self.status = SubmitStatus::Idle;
        self.error_message.clear();
    }

    /// Validate the current snapshot and prepare its write.
    ///
    /// Rejects with `InProgress` (state untouched) while a write is outstanding.
    /// On a validation failure the error status is already applied when this returns.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitError> {
        if self.submitting {
            tracing::warn!("submit ignored: a submission is already in progress");
            return Err(SubmitError::InProgress);
        }

        self.submitting = true;
        self.status = SubmitStatus::Idle;
        self.error_message.clear();

        if let Err(e) = validate::validate(&self.record) {
            let err = SubmitError::from(e);
            self.fail(&err);
            return Err(err);
        }

        let document = StoredRegistration {
            record: self.record.clone(),
            timestamp: iso_timestamp(self.clock.now_utc()),
        };
        tracing::debug!(team = %document.record.team_name, "submission validated");
        self.sending = Some(document.clone());

        Ok(PendingSubmission {
            document,
            collection: REGISTRATIONS_COLLECTION,
            store: self.store.clone(),
        })
    }

    /// Apply the outcome of a write started with `begin_submit`.
    pub fn finish_submit(&mut self, outcome: Result<DocumentRef, StoreError>) {
        match outcome {
            Ok(doc) => {
                tracing::info!(document = %doc.name, "registration stored");
                self.record = RegistrationRecord::default();
                self.status = SubmitStatus::Success;
                self.last_document = Some(doc);
                self.last_stored = self.sending.take();
                self.submitting = false;
            }
            Err(e) => self.fail(&SubmitError::from(e)),
        }
    }

    /// Validate, write once, and apply the outcome.
    pub async fn submit(&mut self) -> Result<DocumentRef, SubmitError> {
        let pending = self.begin_submit()?;
        let outcome = pending.write().await;
        self.finish_submit(outcome.clone());
        outcome.map_err(SubmitError::from)
    }

    fn fail(&mut self, err: &SubmitError) {
        tracing::warn!(error = %err, "submission failed");
        self.status = SubmitStatus::Error;
        self.error_message = err.display_message();
        self.sending = None;
        self.submitting = false;
    }
}

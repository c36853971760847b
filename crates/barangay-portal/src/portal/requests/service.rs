use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{
    DocumentRequest, RequestId, RequestStatus, RequestSubmission, SubmissionError,
};
use super::issuance::IssuedDocument;
use super::policy::{self, Actor, RequestAction, TransitionError};
use super::repository::{DocumentRequestRepository, RepositoryError};
use super::view::RequestStats;
use crate::portal::audit::domain::{ActorContext, AuditAction, AuditSink, NewAuditEntry};

/// Server-side cap applied to unscoped listings.
pub const LIST_CAP: usize = 1000;

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

/// Admin status update delivered by the set-status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub proof_of_payment: Option<String>,
}

/// Service composing the transition policy, repository, and issuance gate.
///
/// Every mutation goes through [`policy::evaluate`] first; repository
/// failures leave the stored record untouched, and audit emission is a
/// best-effort side channel that never affects the primary outcome.
pub struct DocumentRequestService<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
    verify_base_url: String,
}

impl<R, A> DocumentRequestService<R, A>
where
    R: DocumentRequestRepository + 'static,
    A: AuditSink + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>, verify_base_url: impl Into<String>) -> Self {
        Self {
            repository,
            audit,
            verify_base_url: verify_base_url.into(),
        }
    }

    /// Open a new request in `pending`. No audit entry is written here.
    pub fn submit(
        &self,
        submission: RequestSubmission,
        now: DateTime<Utc>,
    ) -> Result<DocumentRequest, RequestServiceError> {
        submission.validate()?;

        let request = DocumentRequest {
            id: next_request_id(),
            user_id: submission.user_id,
            document_type: submission.document_type,
            form: submission.form,
            status: RequestStatus::Pending,
            pickup_option: submission.pickup_option,
            proof_of_payment: None,
            admin_notes: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(request)?;
        Ok(stored)
    }

    /// Generic admin move to any canonical status, with the
    /// `DOCUMENT_STATUS_CHANGE` audit side effect.
    pub fn set_status(
        &self,
        actor: &ActorContext,
        id: &RequestId,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<DocumentRequest, RequestServiceError> {
        let mut request = self.fetch(id)?;
        let previous = request.status.clone();
        let next = policy::evaluate(
            &request,
            Actor::Admin,
            &RequestAction::AdvanceTo(update.status),
        )?;

        request.status = next;
        if update.admin_notes.is_some() {
            request.admin_notes = update.admin_notes.clone();
        }
        if update.rejection_reason.is_some() {
            request.rejection_reason = update.rejection_reason.clone();
        }
        if update.proof_of_payment.is_some() {
            request.proof_of_payment = update.proof_of_payment.clone();
        }
        request.updated_at = now;

        self.repository.update(request.clone())?;

        let mut details = format!(
            "Status of {} request {} changed from {} to {}",
            request.document_type, request.id, previous, request.status,
        );
        if let Some(reason) = &request.rejection_reason {
            details.push_str(&format!("; reason: {reason}"));
        } else if let Some(notes) = &request.admin_notes {
            details.push_str(&format!("; notes: {notes}"));
        }
        self.record(actor.entry(AuditAction::DocumentStatusChange, details));

        Ok(request)
    }

    /// Accept an uploaded payment proof: `payment_sent -> ready_to_claim`.
    pub fn approve_payment(
        &self,
        actor: &ActorContext,
        id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<DocumentRequest, RequestServiceError> {
        self.review_payment(actor, id, RequestAction::ApprovePayment, now)
    }

    /// Turn down an uploaded payment proof: `payment_sent -> rejected`.
    pub fn reject_payment(
        &self,
        actor: &ActorContext,
        id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<DocumentRequest, RequestServiceError> {
        self.review_payment(actor, id, RequestAction::RejectPayment, now)
    }

    fn review_payment(
        &self,
        actor: &ActorContext,
        id: &RequestId,
        action: RequestAction,
        now: DateTime<Utc>,
    ) -> Result<DocumentRequest, RequestServiceError> {
        let mut request = self.fetch(id)?;
        let previous = request.status.clone();
        let next = policy::evaluate(&request, Actor::Admin, &action)?;

        request.status = next;
        request.updated_at = now;
        self.repository.update(request.clone())?;

        self.record(actor.entry(
            AuditAction::DocumentStatusChange,
            format!(
                "Payment review moved {} request {} from {} to {}",
                request.document_type, request.id, previous, request.status,
            ),
        ));
        Ok(request)
    }

    /// Resident attaches proof of an online payment:
    /// `approved -> payment_sent`.
    pub fn submit_payment_proof(
        &self,
        id: &RequestId,
        url: String,
        now: DateTime<Utc>,
    ) -> Result<DocumentRequest, RequestServiceError> {
        let mut request = self.fetch(id)?;
        let next = policy::evaluate(
            &request,
            Actor::Resident,
            &RequestAction::SubmitPaymentProof { url: url.clone() },
        )?;

        request.status = next;
        request.proof_of_payment = Some(url);
        request.updated_at = now;
        self.repository.update(request.clone())?;
        Ok(request)
    }

    /// Release the generated certificate.
    ///
    /// The completed transition is persisted before anything is released: a
    /// failed write issues no artifact, so there is never a downloaded file
    /// whose request the store still shows as claimable. Re-downloading a
    /// completed request skips the write entirely.
    pub fn download(
        &self,
        actor: &ActorContext,
        id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<IssuedDocument, RequestServiceError> {
        let mut request = self.fetch(id)?;
        let next = policy::evaluate(&request, Actor::Resident, &RequestAction::IssueDocument)?;

        if request.status != next {
            request.status = next;
            request.updated_at = now;
            self.repository.update(request.clone())?;
        }

        let issued = IssuedDocument::new(&self.verify_base_url, request.document_type, &request.id);
        self.record(actor.entry(
            AuditAction::PdfDownload,
            format!("Issued {} for request {}", issued.file_name, request.id),
        ));
        Ok(issued)
    }

    pub fn get(&self, id: &RequestId) -> Result<DocumentRequest, RequestServiceError> {
        self.fetch(id)
    }

    pub fn list_all(&self) -> Result<Vec<DocumentRequest>, RequestServiceError> {
        Ok(self.repository.list_all(LIST_CAP)?)
    }

    pub fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<DocumentRequest>, RequestServiceError> {
        Ok(self.repository.list_for_user(user_id)?)
    }

    /// Per-status counts over the full stored set.
    pub fn stats(&self) -> Result<RequestStats, RequestServiceError> {
        let requests = self.repository.list_all(LIST_CAP)?;
        Ok(RequestStats::from_requests(&requests))
    }

    fn fetch(&self, id: &RequestId) -> Result<DocumentRequest, RequestServiceError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn record(&self, entry: NewAuditEntry) {
        if let Err(err) = self.audit.append(entry) {
            warn!(error = %err, "audit append failed; continuing");
        }
    }
}

/// Error raised by the document request service.
#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

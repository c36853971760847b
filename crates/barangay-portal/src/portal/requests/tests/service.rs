use std::sync::Arc;

use super::common::*;
use crate::portal::audit::domain::AuditAction;
use crate::portal::requests::domain::{
    DocumentType, PickupOption, RequestId, RequestStatus, SubmissionError,
};
use crate::portal::requests::policy::TransitionError;
use crate::portal::requests::repository::{DocumentRequestRepository, RepositoryError};
use crate::portal::requests::service::{DocumentRequestService, StatusUpdate};

#[test]
fn submit_creates_pending_request() {
    let (service, repository, audit) = build_service();

    let stored = service.submit(submission(), now()).expect("submit succeeds");
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(stored.created_at, now());

    let fetched = repository
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(fetched, stored);
    assert!(audit.entries().is_empty(), "submission writes no audit entry");
}

#[test]
fn submit_rejects_incomplete_forms() {
    let (service, _, _) = build_service();

    let mut missing = submission();
    missing.form.remove("purpose");
    match service.submit(missing, now()) {
        Err(err) => assert!(err.to_string().contains("purpose")),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let mut permit = submission();
    permit.document_type = DocumentType::BusinessPermit;
    match service.submit(permit, now()) {
        Err(crate::portal::requests::service::RequestServiceError::Submission(
            SubmissionError::MissingField("business_name"),
        )) => {}
        other => panic!("expected missing business name, got {other:?}"),
    }

    let mut bad_date = submission();
    bad_date
        .form
        .insert("birth_date".to_string(), "31-02-1990".to_string());
    match service.submit(bad_date, now()) {
        Err(crate::portal::requests::service::RequestServiceError::Submission(
            SubmissionError::InvalidBirthDate(_),
        )) => {}
        other => panic!("expected invalid birth date, got {other:?}"),
    }
}

#[test]
fn set_status_persists_and_audits() {
    let (service, repository, audit) = build_service();
    let id = seed(&repository, RequestStatus::Pending, PickupOption::Online);

    let updated = service
        .set_status(
            &admin(),
            &id,
            StatusUpdate {
                status: RequestStatus::Processing,
                admin_notes: Some("ID on file".to_string()),
                rejection_reason: None,
                proof_of_payment: None,
            },
            now(),
        )
        .expect("status update succeeds");

    assert_eq!(updated.status, RequestStatus::Processing);
    assert_eq!(updated.admin_notes.as_deref(), Some("ID on file"));

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::DocumentStatusChange);
    assert!(entries[0].details.contains("pending"));
    assert!(entries[0].details.contains("processing"));
    assert!(entries[0].details.contains("notes: ID on file"));
    assert_eq!(entries[0].user_id.as_deref(), Some("admin-1"));
}

#[test]
fn rejection_reason_lands_in_the_audit_details() {
    let (service, repository, audit) = build_service();
    let id = seed(&repository, RequestStatus::Processing, PickupOption::Online);

    service
        .set_status(
            &admin(),
            &id,
            StatusUpdate {
                status: RequestStatus::Rejected,
                admin_notes: None,
                rejection_reason: Some("Incomplete requirements".to_string()),
                proof_of_payment: None,
            },
            now(),
        )
        .expect("rejection succeeds");

    let entries = audit.entries();
    assert!(entries[0].details.contains("reason: Incomplete requirements"));
}

#[test]
fn failed_backend_write_leaves_status_unchanged() {
    let inner = MemoryRepository::default();
    let id = seed(&inner, RequestStatus::Pending, PickupOption::Online);
    let repository = Arc::new(ReadOnlyRepository { inner: inner.clone() });
    let audit = Arc::new(MemoryAudit::default());
    let service = DocumentRequestService::new(repository, audit.clone(), VERIFY_BASE);

    match service.set_status(
        &admin(),
        &id,
        StatusUpdate {
            status: RequestStatus::Processing,
            admin_notes: None,
            rejection_reason: None,
            proof_of_payment: None,
        },
        now(),
    ) {
        Err(crate::portal::requests::service::RequestServiceError::Repository(
            RepositoryError::Unavailable(_),
        )) => {}
        other => panic!("expected unavailable error, got {other:?}"),
    }

    // No optimistic commit: the stored record did not move, and the failed
    // transition produced no audit entry either.
    let stored = inner.fetch(&id).expect("fetch succeeds").expect("present");
    assert_eq!(stored.status, RequestStatus::Pending);
    assert!(audit.entries().is_empty());
}

#[test]
fn audit_failure_never_blocks_the_primary_action() {
    let repository = Arc::new(MemoryRepository::default());
    let id = seed(&repository, RequestStatus::Pending, PickupOption::Online);
    let service =
        DocumentRequestService::new(repository.clone(), Arc::new(FailingAudit), VERIFY_BASE);

    let updated = service
        .set_status(
            &admin(),
            &id,
            StatusUpdate {
                status: RequestStatus::Processing,
                admin_notes: None,
                rejection_reason: None,
                proof_of_payment: None,
            },
            now(),
        )
        .expect("primary action succeeds despite failing sink");

    assert_eq!(updated.status, RequestStatus::Processing);
    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("present");
    assert_eq!(stored.status, RequestStatus::Processing);
}

#[test]
fn approve_payment_scenario() {
    let (service, repository, audit) = build_service();
    let id = seed(&repository, RequestStatus::PaymentSent, PickupOption::Online);

    let updated = service
        .approve_payment(&admin(), &id, now())
        .expect("payment approval succeeds");
    assert_eq!(updated.status, RequestStatus::ReadyToClaim);

    let entries = audit.entries();
    assert_eq!(entries.len(), 1, "exactly one audit entry attempted");
    assert_eq!(entries[0].action, AuditAction::DocumentStatusChange);
}

#[test]
fn reject_payment_terminates_the_request() {
    let (service, repository, _) = build_service();
    let id = seed(&repository, RequestStatus::PaymentSent, PickupOption::Online);

    let updated = service
        .reject_payment(&admin(), &id, now())
        .expect("payment rejection succeeds");
    assert_eq!(updated.status, RequestStatus::Rejected);
}

#[test]
fn payment_proof_attaches_url() {
    let (service, repository, _) = build_service();
    let id = seed(&repository, RequestStatus::Approved, PickupOption::Online);

    let updated = service
        .submit_payment_proof(&id, "/uploads/3-proof.png".to_string(), now())
        .expect("proof accepted");
    assert_eq!(updated.status, RequestStatus::PaymentSent);
    assert_eq!(updated.proof_of_payment.as_deref(), Some("/uploads/3-proof.png"));

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("present");
    assert_eq!(stored.proof_of_payment.as_deref(), Some("/uploads/3-proof.png"));
}

#[test]
fn download_marks_completed_before_release() {
    let (service, repository, audit) = build_service();
    let id = seed(&repository, RequestStatus::ReadyToClaim, PickupOption::Pickup);

    let issued = service
        .download(&admin(), &id, now())
        .expect("download succeeds");
    assert!(issued.file_name.ends_with(".pdf"));
    assert!(issued.verify_url.contains("/verify/"));

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("present");
    assert_eq!(stored.status, RequestStatus::Completed);

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::PdfDownload);
}

#[test]
fn download_is_withheld_when_the_completed_write_fails() {
    let inner = MemoryRepository::default();
    let id = seed(&inner, RequestStatus::ReadyToClaim, PickupOption::Pickup);
    let audit = Arc::new(MemoryAudit::default());
    let service = DocumentRequestService::new(
        Arc::new(ReadOnlyRepository { inner: inner.clone() }),
        audit.clone(),
        VERIFY_BASE,
    );

    match service.download(&admin(), &id, now()) {
        Err(crate::portal::requests::service::RequestServiceError::Repository(
            RepositoryError::Unavailable(_),
        )) => {}
        other => panic!("expected withheld artifact, got {other:?}"),
    }
    assert!(audit.entries().is_empty(), "no download event without a release");

    let stored = inner.fetch(&id).expect("fetch succeeds").expect("present");
    assert_eq!(stored.status, RequestStatus::ReadyToClaim);
}

#[test]
fn redownload_of_completed_request_is_idempotent() {
    let inner = MemoryRepository::default();
    let id = seed(&inner, RequestStatus::Completed, PickupOption::Online);
    // A read-only store proves no write is even attempted.
    let service = DocumentRequestService::new(
        Arc::new(ReadOnlyRepository { inner: inner.clone() }),
        Arc::new(MemoryAudit::default()),
        VERIFY_BASE,
    );

    let issued = service
        .download(&admin(), &id, now())
        .expect("re-download succeeds");
    assert!(issued.file_name.ends_with(".pdf"));

    let stored = inner.fetch(&id).expect("fetch succeeds").expect("present");
    assert_eq!(stored.status, RequestStatus::Completed);
}

#[test]
fn pickup_download_is_gated_until_ready() {
    let (service, repository, _) = build_service();
    let id = seed(&repository, RequestStatus::Approved, PickupOption::Pickup);

    match service.download(&admin(), &id, now()) {
        Err(crate::portal::requests::service::RequestServiceError::Transition(
            TransitionError::NotReadyForClaim,
        )) => {}
        other => panic!("expected claim gate, got {other:?}"),
    }
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _) = build_service();
    match service.get(&RequestId("missing".to_string())) {
        Err(crate::portal::requests::service::RequestServiceError::Repository(
            RepositoryError::NotFound,
        )) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn stats_count_the_stored_set() {
    let (service, repository, _) = build_service();
    for (index, status) in [
        RequestStatus::Pending,
        RequestStatus::Pending,
        RequestStatus::PaymentSent,
        RequestStatus::Completed,
    ]
    .into_iter()
    .enumerate()
    {
        let mut request = request(status, PickupOption::Online);
        request.id = RequestId(format!("req-stat-{index}"));
        repository
            .records
            .lock()
            .expect("repository mutex poisoned")
            .insert(request.id.clone(), request);
    }

    let stats = service.stats().expect("stats compute");
    assert_eq!(stats.total, 4);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.payment, 1);
    assert_eq!(stats.completed, 1);
}

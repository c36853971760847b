use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::portal::audit::domain::{
    ActorContext, AuditError, AuditLogEntry, AuditSink, NewAuditEntry,
};
use crate::portal::requests::domain::{
    DocumentRequest, DocumentType, PickupOption, RequestId, RequestStatus, RequestSubmission,
};
use crate::portal::requests::repository::{DocumentRequestRepository, RepositoryError};
use crate::portal::requests::service::DocumentRequestService;
use crate::portal::requests::view::RequestRow;

pub(super) const VERIFY_BASE: &str = "https://portal.example.gov.ph";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 8, 0, 0).single().expect("valid timestamp")
}

pub(super) fn admin() -> ActorContext {
    ActorContext {
        user_id: Some("admin-1".to_string()),
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("test-suite".to_string()),
    }
}

pub(super) fn form() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("full_name".to_string(), "Juan Dela Cruz".to_string()),
        ("purpose".to_string(), "Employment requirement".to_string()),
        ("address".to_string(), "Purok 4, Poblacion".to_string()),
    ])
}

pub(super) fn request(status: RequestStatus, pickup: PickupOption) -> DocumentRequest {
    DocumentRequest {
        id: RequestId("req-fixture".to_string()),
        user_id: "res-000001".to_string(),
        document_type: DocumentType::BarangayClearance,
        form: form(),
        status,
        pickup_option: pickup,
        proof_of_payment: None,
        admin_notes: None,
        rejection_reason: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub(super) fn submission() -> RequestSubmission {
    RequestSubmission {
        user_id: "res-000001".to_string(),
        document_type: DocumentType::BarangayClearance,
        pickup_option: PickupOption::Online,
        form: form(),
    }
}

pub(super) fn row(request: DocumentRequest, name: &str, email: &str) -> RequestRow {
    RequestRow {
        request,
        requester_name: name.to_string(),
        requester_email: email.to_string(),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<RequestId, DocumentRequest>>>,
}

impl DocumentRequestRepository for MemoryRepository {
    fn insert(&self, request: DocumentRequest) -> Result<DocumentRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update(&self, request: DocumentRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&request.id) {
            guard.insert(request.id.clone(), request);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<DocumentRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_all(&self, limit: usize) -> Result<Vec<DocumentRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut requests: Vec<DocumentRequest> = guard.values().cloned().collect();
        requests.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        requests.truncate(limit);
        Ok(requests)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<DocumentRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Accepts fetches but refuses writes, for the no-optimistic-commit checks.
pub(super) struct ReadOnlyRepository {
    pub(super) inner: MemoryRepository,
}

impl DocumentRequestRepository for ReadOnlyRepository {
    fn insert(&self, _request: DocumentRequest) -> Result<DocumentRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _request: DocumentRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<DocumentRequest>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list_all(&self, limit: usize) -> Result<Vec<DocumentRequest>, RepositoryError> {
        self.inner.list_all(limit)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<DocumentRequest>, RepositoryError> {
        self.inner.list_for_user(user_id)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    entries: Arc<Mutex<Vec<NewAuditEntry>>>,
}

impl MemoryAudit {
    pub(super) fn entries(&self) -> Vec<NewAuditEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn append(&self, entry: NewAuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn recent(&self, _limit: usize) -> Result<Vec<AuditLogEntry>, AuditError> {
        Ok(Vec::new())
    }
}

/// Sink that always fails, for the best-effort isolation checks.
pub(super) struct FailingAudit;

impl AuditSink for FailingAudit {
    fn append(&self, _entry: NewAuditEntry) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("sink offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<AuditLogEntry>, AuditError> {
        Err(AuditError::Unavailable("sink offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    DocumentRequestService<MemoryRepository, MemoryAudit>,
    Arc<MemoryRepository>,
    Arc<MemoryAudit>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = DocumentRequestService::new(repository.clone(), audit.clone(), VERIFY_BASE);
    (service, repository, audit)
}

pub(super) fn seed(
    repository: &MemoryRepository,
    status: RequestStatus,
    pickup: PickupOption,
) -> RequestId {
    let request = request(status, pickup);
    let id = request.id.clone();
    repository
        .records
        .lock()
        .expect("repository mutex poisoned")
        .insert(id.clone(), request);
    id
}

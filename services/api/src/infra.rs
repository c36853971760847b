use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use barangay_portal::portal::audit::{AuditError, AuditLogEntry, AuditSink, NewAuditEntry};
use barangay_portal::portal::requests::{
    DocumentRequest, DocumentRequestRepository, RepositoryError, RequestId,
};
use barangay_portal::portal::residents::{Resident, ResidentRepository};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentRequestRepository {
    records: Arc<Mutex<HashMap<RequestId, DocumentRequest>>>,
}

impl DocumentRequestRepository for InMemoryDocumentRequestRepository {
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
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        requests.truncate(limit);
        Ok(requests)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<DocumentRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut requests: Vec<DocumentRequest> = guard
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryResidentRepository {
    records: Arc<Mutex<HashMap<String, Resident>>>,
}

impl ResidentRepository for InMemoryResidentRepository {
    fn insert(&self, resident: Resident) -> Result<Resident, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&resident.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(resident.id.clone(), resident.clone());
        Ok(resident)
    }

    fn update(&self, resident: Resident) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&resident.id) {
            guard.insert(resident.id.clone(), resident);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &str) -> Result<Option<Resident>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_email(&self, email: &str) -> Result<Option<Resident>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|resident| resident.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Resident>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut residents: Vec<Resident> = guard.values().cloned().collect();
        residents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(residents)
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Append-only audit store. Ids are sequential and entries are stamped at
/// append time; `recent` returns newest first.
#[derive(Default)]
pub(crate) struct InMemoryAuditSink {
    sequence: AtomicU64,
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, entry: NewAuditEntry) -> Result<(), AuditError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let mut guard = self.entries.lock().expect("audit mutex poisoned");
        guard.push(AuditLogEntry {
            id: format!("audit-{id:06}"),
            user_id: entry.user_id,
            action: entry.action,
            details: entry.details,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, AuditError> {
        let guard = self.entries.lock().expect("audit mutex poisoned");
        let mut newest_first: Vec<AuditLogEntry> = guard.iter().rev().cloned().collect();
        newest_first.truncate(limit);
        Ok(newest_first)
    }
}

/// Blob store backing `/api/upload`. Every upload gets a fresh URL; two
/// uploads of the same bytes never collide.
#[derive(Default)]
pub(crate) struct InMemoryUploadStore {
    sequence: AtomicU64,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryUploadStore {
    pub(crate) fn store(&self, filename: &str, bytes: Vec<u8>) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("/uploads/{id}-{}", sanitize_filename(filename));
        self.files
            .lock()
            .expect("upload mutex poisoned")
            .insert(url.clone(), bytes);
        url
    }

    #[cfg(test)]
    pub(crate) fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.files.lock().expect("upload mutex poisoned").get(url).cloned()
    }
}

fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

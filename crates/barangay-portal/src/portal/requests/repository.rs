use super::domain::{DocumentRequest, RequestId};

/// Storage abstraction over the external data store so the service module
/// can be exercised in isolation. Writes are last-writer-wins; the store is
/// the sole source of truth and nothing is cached ahead of confirmation.
pub trait DocumentRequestRepository: Send + Sync {
    fn insert(&self, request: DocumentRequest) -> Result<DocumentRequest, RepositoryError>;
    fn update(&self, request: DocumentRequest) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<DocumentRequest>, RepositoryError>;
    /// All requests, capped server-side. Requests are never hard-deleted.
    fn list_all(&self, limit: usize) -> Result<Vec<DocumentRequest>, RepositoryError>;
    fn list_for_user(&self, user_id: &str) -> Result<Vec<DocumentRequest>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

//! Document request lifecycle: submission intake, the status transition
//! policy, the issuance gate, and the aggregation view the admin table
//! renders.

pub mod domain;
pub mod issuance;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod view;

#[cfg(test)]
mod tests;

pub use domain::{
    DocumentRequest, DocumentType, FormPayload, PickupOption, RequestId, RequestStatus,
    RequestSubmission, SubmissionError,
};
pub use issuance::{can_download, download_label, DownloadLabel, IssuedDocument};
pub use policy::{Actor, RequestAction, TransitionError};
pub use repository::{DocumentRequestRepository, RepositoryError};
pub use router::document_router;
pub use service::{DocumentRequestService, RequestServiceError, StatusUpdate, LIST_CAP};
pub use view::{
    filter_requests, RequestPage, RequestQuery, RequestRow, RequestStats, SearchDebouncer,
    SortOrder, PAGE_SIZE,
};

use serde::Serialize;

use super::domain::{DocumentType, PickupOption, RequestId, RequestStatus};

/// Whether a download/claim control is currently permitted.
///
/// Online-delivery requests are downloadable as soon as the certificate can
/// be generated; pickup-delivery requests stay gated until the payment and
/// approval cycle has finished.
pub fn can_download(pickup: PickupOption, status: &RequestStatus) -> bool {
    pickup != PickupOption::Pickup
        || matches!(
            status,
            RequestStatus::ReadyToClaim | RequestStatus::Completed
        )
}

/// Label the portal shows on the download control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadLabel {
    Claim,
    Download,
    PickupOnly,
}

impl DownloadLabel {
    pub const fn text(self) -> &'static str {
        match self {
            DownloadLabel::Claim => "Claim",
            DownloadLabel::Download => "Download",
            DownloadLabel::PickupOnly => "Pickup Only",
        }
    }
}

pub fn download_label(pickup: PickupOption, status: &RequestStatus) -> DownloadLabel {
    if !can_download(pickup, status) {
        return DownloadLabel::PickupOnly;
    }
    if *status == RequestStatus::ReadyToClaim {
        DownloadLabel::Claim
    } else {
        DownloadLabel::Download
    }
}

/// Metadata for a released certificate. The PDF itself is produced by a
/// rendering collaborator; the gate only decides eligibility and derives the
/// stable verification link the embedded QR code encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedDocument {
    pub request_id: RequestId,
    pub file_name: String,
    pub verify_url: String,
}

impl IssuedDocument {
    pub fn new(base_url: &str, document_type: DocumentType, id: &RequestId) -> Self {
        Self {
            request_id: id.clone(),
            file_name: file_name(document_type, id),
            verify_url: verify_url(base_url, id),
        }
    }
}

/// Stable URL the QR code embedded in the certificate resolves to.
pub fn verify_url(base_url: &str, id: &RequestId) -> String {
    format!("{}/verify/{}", base_url.trim_end_matches('/'), id.0)
}

pub fn file_name(document_type: DocumentType, id: &RequestId) -> String {
    format!("{}-{}.pdf", document_type.slug().replace('_', "-"), id.0)
}

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted document requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Certificate and permit types issued by the barangay office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BarangayClearance,
    CertificateOfResidency,
    CertificateOfIndigency,
    CertificateOfGoodMoralCharacter,
    BusinessPermit,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentType::BarangayClearance => "Barangay Clearance",
            DocumentType::CertificateOfResidency => "Certificate of Residency",
            DocumentType::CertificateOfIndigency => "Certificate of Indigency",
            DocumentType::CertificateOfGoodMoralCharacter => {
                "Certificate of Good Moral Character"
            }
            DocumentType::BusinessPermit => "Business Permit",
        }
    }

    /// Slug used in generated file names and wire payloads.
    pub const fn slug(self) -> &'static str {
        match self {
            DocumentType::BarangayClearance => "barangay_clearance",
            DocumentType::CertificateOfResidency => "certificate_of_residency",
            DocumentType::CertificateOfIndigency => "certificate_of_indigency",
            DocumentType::CertificateOfGoodMoralCharacter => {
                "certificate_of_good_moral_character"
            }
            DocumentType::BusinessPermit => "business_permit",
        }
    }

    pub const fn all() -> [DocumentType; 5] {
        [
            DocumentType::BarangayClearance,
            DocumentType::CertificateOfResidency,
            DocumentType::CertificateOfIndigency,
            DocumentType::CertificateOfGoodMoralCharacter,
            DocumentType::BusinessPermit,
        ]
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a document request.
///
/// The canonical vocabulary is the resident-facing lower/snake-case set. A
/// legacy admin vocabulary (`under_review`, `payment_pending`,
/// `ready_for_claim`) still appears on older payloads and is normalized at
/// the parse boundary. Values outside both vocabularies are preserved as
/// [`RequestStatus::Unknown`] so listings and filters keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    Processing,
    Approved,
    PaymentSent,
    ReadyToClaim,
    Completed,
    Rejected,
    Unknown(String),
}

impl RequestStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => RequestStatus::Pending,
            "processing" | "under_review" => RequestStatus::Processing,
            "approved" => RequestStatus::Approved,
            "payment_sent" | "payment_pending" => RequestStatus::PaymentSent,
            "ready_to_claim" | "ready_for_claim" => RequestStatus::ReadyToClaim,
            "completed" => RequestStatus::Completed,
            "rejected" => RequestStatus::Rejected,
            _ => RequestStatus::Unknown(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Processing => "processing",
            RequestStatus::Approved => "approved",
            RequestStatus::PaymentSent => "payment_sent",
            RequestStatus::ReadyToClaim => "ready_to_claim",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Unknown(_) => "unknown",
        }
    }

    /// Rejected and completed requests accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RequestStatus::Unknown(_))
    }

    /// Canonical states in lifecycle order, rejection last.
    pub const fn ordered() -> [RequestStatus; 7] {
        [
            RequestStatus::Pending,
            RequestStatus::Processing,
            RequestStatus::Approved,
            RequestStatus::PaymentSent,
            RequestStatus::ReadyToClaim,
            RequestStatus::Completed,
            RequestStatus::Rejected,
        ]
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Unknown(raw) => write!(f, "unknown ({raw})"),
            other => f.write_str(other.label()),
        }
    }
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        RequestStatus::parse(&value)
    }
}

impl From<RequestStatus> for String {
    fn from(value: RequestStatus) -> Self {
        match value {
            RequestStatus::Unknown(raw) => raw,
            other => other.label().to_string(),
        }
    }
}

/// Delivery method chosen at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupOption {
    Online,
    Pickup,
}

impl PickupOption {
    pub const fn label(self) -> &'static str {
        match self {
            PickupOption::Online => "online",
            PickupOption::Pickup => "pickup",
        }
    }
}

impl fmt::Display for PickupOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Type-specific submitted fields, opaque to the status engine.
pub type FormPayload = BTreeMap<String, String>;

/// A resident's request for a barangay-issued document. Serialization
/// follows the wire contract of the document endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub id: RequestId,
    pub user_id: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    #[serde(rename = "formData")]
    pub form: FormPayload,
    pub status: RequestStatus,
    pub pickup_option: PickupOption,
    pub proof_of_payment: Option<String>,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRequest {
    /// Urgency is declared in the form payload and only used for filtering.
    pub fn is_urgent(&self) -> bool {
        self.form
            .get("urgent")
            .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
            .unwrap_or(false)
    }
}

/// Resident-submitted payload used to open a new request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSubmission {
    pub user_id: String,
    pub document_type: DocumentType,
    pub pickup_option: PickupOption,
    pub form: FormPayload,
}

/// Validation failures caught before a submission reaches the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("birth date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidBirthDate(String),
}

impl RequestSubmission {
    /// Required-field check mirroring the intake form rules. Business permits
    /// additionally require the registered business name.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        for field in ["full_name", "purpose"] {
            if self
                .form
                .get(field)
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
            {
                return Err(SubmissionError::MissingField(match field {
                    "full_name" => "full_name",
                    _ => "purpose",
                }));
            }
        }

        if self.document_type == DocumentType::BusinessPermit
            && self
                .form
                .get("business_name")
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
        {
            return Err(SubmissionError::MissingField("business_name"));
        }

        if let Some(raw) = self.form.get("birth_date") {
            if chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").is_err() {
                return Err(SubmissionError::InvalidBirthDate(raw.clone()));
            }
        }

        Ok(())
    }
}

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Portal access level for a resident account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResidentRole {
    Unverified,
    Verified,
    Admin,
    Rejected,
    Inactive,
    Unknown(String),
}

impl ResidentRole {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unverified" => ResidentRole::Unverified,
            "verified" => ResidentRole::Verified,
            "admin" => ResidentRole::Admin,
            "rejected" => ResidentRole::Rejected,
            "inactive" => ResidentRole::Inactive,
            _ => ResidentRole::Unknown(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ResidentRole::Unverified => "Unverified",
            ResidentRole::Verified => "Verified",
            ResidentRole::Admin => "Admin",
            ResidentRole::Rejected => "Rejected",
            ResidentRole::Inactive => "Inactive",
            ResidentRole::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for ResidentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResidentRole::Unknown(raw) => write!(f, "Unknown ({raw})"),
            other => f.write_str(other.label()),
        }
    }
}

impl From<String> for ResidentRole {
    fn from(value: String) -> Self {
        ResidentRole::parse(&value)
    }
}

impl From<ResidentRole> for String {
    fn from(value: ResidentRole) -> Self {
        match value {
            ResidentRole::Unknown(raw) => raw,
            other => other.label().to_string(),
        }
    }
}

/// Registered portal account. Archival (`Inactive`) preserves the record;
/// only the admin-confirmed permanent delete removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub address_line: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub contact_number: Option<String>,
    pub role: ResidentRole,
    pub created_at: DateTime<Utc>,
}

impl Resident {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Phrase an admin must type verbatim before a permanent delete proceeds.
pub fn deletion_phrase(email: &str) -> String {
    format!("DELETE {email}")
}

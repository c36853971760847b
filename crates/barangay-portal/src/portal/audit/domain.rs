use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Security- and state-relevant actions recorded in the audit trail.
///
/// Wire format is the SCREAMING_SNAKE action name; anything unrecognized is
/// carried through as [`AuditAction::Unknown`] so old entries keep listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    DocumentStatusChange,
    PdfDownload,
    UserVerification,
    RoleChange,
    PasswordReset,
    AccountDeletion,
    Unknown(String),
}

impl AuditAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DOCUMENT_STATUS_CHANGE" => AuditAction::DocumentStatusChange,
            "PDF_DOWNLOAD" => AuditAction::PdfDownload,
            "USER_VERIFICATION" => AuditAction::UserVerification,
            "ROLE_CHANGE" => AuditAction::RoleChange,
            "PASSWORD_RESET" => AuditAction::PasswordReset,
            "ACCOUNT_DELETION" => AuditAction::AccountDeletion,
            _ => AuditAction::Unknown(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AuditAction::DocumentStatusChange => "DOCUMENT_STATUS_CHANGE",
            AuditAction::PdfDownload => "PDF_DOWNLOAD",
            AuditAction::UserVerification => "USER_VERIFICATION",
            AuditAction::RoleChange => "ROLE_CHANGE",
            AuditAction::PasswordReset => "PASSWORD_RESET",
            AuditAction::AccountDeletion => "ACCOUNT_DELETION",
            AuditAction::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Unknown(raw) => f.write_str(raw),
            other => f.write_str(other.label()),
        }
    }
}

impl From<String> for AuditAction {
    fn from(value: String) -> Self {
        AuditAction::parse(&value)
    }
}

impl From<AuditAction> for String {
    fn from(value: AuditAction) -> Self {
        match value {
            AuditAction::Unknown(raw) => raw,
            other => other.label().to_string(),
        }
    }
}

/// Identity and client metadata attached to audited actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ActorContext {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn entry(&self, action: AuditAction, details: impl Into<String>) -> NewAuditEntry {
        NewAuditEntry {
            user_id: self.user_id.clone(),
            action,
            details: details.into(),
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Payload for a new append. `user_id` of `None` marks a system action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub user_id: Option<String>,
    pub action: AuditAction,
    pub details: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Immutable stored entry. The application never mutates or deletes these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub action: AuditAction,
    pub details: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only sink for the audit trail.
///
/// Appends are invoked best-effort by the services: a failing sink is logged
/// and must never roll back or block the primary action it trails.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: NewAuditEntry) -> Result<(), AuditError>;
    fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

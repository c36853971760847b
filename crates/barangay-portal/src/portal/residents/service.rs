use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{deletion_phrase, Resident, ResidentRole};
use super::repository::{RepositoryError, ResidentRepository};
use crate::portal::audit::domain::{ActorContext, AuditAction, AuditSink};

static RESIDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_resident_id() -> String {
    let id = RESIDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("res-{id:06}")
}

/// Registration payload; accounts always start Unverified.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<chrono::NaiveDate>,
    pub address_line: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub contact_number: Option<String>,
}

/// Admin-facing directory of resident accounts, with the audit trail as a
/// best-effort side channel on every state-changing action.
pub struct ResidentDirectory<R, A> {
    repository: Arc<R>,
    audit: Arc<A>,
}

impl<R, A> ResidentDirectory<R, A>
where
    R: ResidentRepository + 'static,
    A: AuditSink + 'static,
{
    pub fn new(repository: Arc<R>, audit: Arc<A>) -> Self {
        Self { repository, audit }
    }

    pub fn register(
        &self,
        registration: Registration,
        now: DateTime<Utc>,
    ) -> Result<Resident, DirectoryError> {
        if self
            .repository
            .fetch_by_email(&registration.email)?
            .is_some()
        {
            return Err(DirectoryError::EmailTaken(registration.email));
        }

        let resident = Resident {
            id: next_resident_id(),
            email: registration.email,
            first_name: registration.first_name,
            last_name: registration.last_name,
            birth_date: registration.birth_date,
            address_line: registration.address_line,
            barangay: registration.barangay,
            city: registration.city,
            contact_number: registration.contact_number,
            role: ResidentRole::Unverified,
            created_at: now,
        };

        let stored = self.repository.insert(resident)?;
        Ok(stored)
    }

    /// Verify or reject an Unverified account.
    pub fn set_verified(
        &self,
        actor: &ActorContext,
        id: &str,
        verified: bool,
    ) -> Result<Resident, DirectoryError> {
        let mut resident = self.fetch(id)?;
        if resident.role != ResidentRole::Unverified {
            return Err(DirectoryError::InvalidRoleChange {
                from: resident.role,
                to: if verified {
                    ResidentRole::Verified
                } else {
                    ResidentRole::Rejected
                },
            });
        }

        resident.role = if verified {
            ResidentRole::Verified
        } else {
            ResidentRole::Rejected
        };
        self.repository.update(resident.clone())?;

        self.record(actor.entry(
            AuditAction::UserVerification,
            format!(
                "Account {} ({}) marked {}",
                resident.id,
                resident.email,
                resident.role.label()
            ),
        ));
        Ok(resident)
    }

    /// Generic role move: privilege grants and archival.
    pub fn set_role(
        &self,
        actor: &ActorContext,
        id: &str,
        role: ResidentRole,
    ) -> Result<Resident, DirectoryError> {
        if let ResidentRole::Unknown(raw) = &role {
            return Err(DirectoryError::UnknownRole(raw.clone()));
        }

        let mut resident = self.fetch(id)?;
        let previous = resident.role.clone();
        if previous == role {
            return Ok(resident);
        }

        resident.role = role;
        self.repository.update(resident.clone())?;

        self.record(actor.entry(
            AuditAction::RoleChange,
            format!(
                "Role for {} changed from {} to {}",
                resident.email,
                previous.label(),
                resident.role.label()
            ),
        ));
        Ok(resident)
    }

    /// Permanent delete, gated on the typed confirmation phrase.
    pub fn delete(
        &self,
        actor: &ActorContext,
        id: &str,
        confirmation: &str,
    ) -> Result<(), DirectoryError> {
        let resident = self.fetch(id)?;
        if confirmation != deletion_phrase(&resident.email) {
            return Err(DirectoryError::ConfirmationMismatch);
        }

        self.repository.delete(id)?;
        self.record(actor.entry(
            AuditAction::AccountDeletion,
            format!("Account {} ({}) permanently deleted", id, resident.email),
        ));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Resident, DirectoryError> {
        self.fetch(id)
    }

    pub fn list(&self) -> Result<Vec<Resident>, DirectoryError> {
        Ok(self.repository.list()?)
    }

    fn fetch(&self, id: &str) -> Result<Resident, DirectoryError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn record(&self, entry: crate::portal::audit::domain::NewAuditEntry) {
        if let Err(err) = self.audit.append(entry) {
            warn!(error = %err, "audit append failed; continuing");
        }
    }
}

/// Error raised by the resident directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("an account already exists for {0}")]
    EmailTaken(String),
    #[error("cannot move account from {from} to {to}")]
    InvalidRoleChange {
        from: ResidentRole,
        to: ResidentRole,
    },
    #[error("'{0}' is not a recognized role")]
    UnknownRole(String),
    #[error("confirmation phrase did not match")]
    ConfirmationMismatch,
}

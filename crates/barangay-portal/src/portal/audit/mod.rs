//! Append-only audit trail: entry model, dashboard statistics, and the
//! client-side CSV export.

pub mod domain;
pub mod export;
pub mod stats;

pub use domain::{
    ActorContext, AuditAction, AuditError, AuditLogEntry, AuditSink, NewAuditEntry,
};
pub use export::{export_audit_entries, export_file_name, export_residents, ExportError};
pub use stats::{summarize, ActionCount, AuditStatistics, UserActivity};

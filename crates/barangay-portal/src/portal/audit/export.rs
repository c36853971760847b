use chrono::NaiveDate;

use super::domain::AuditLogEntry;
use crate::portal::residents::domain::Resident;

/// Failures while building a CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("export buffer was not valid UTF-8")]
    Encoding,
}

/// File name pattern shared by all exports: `<subject>-<ISO-date>.csv`.
pub fn export_file_name(subject: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", subject, date.format("%Y-%m-%d"))
}

/// Render audit entries as CSV with every field quoted.
pub fn export_audit_entries(entries: &[AuditLogEntry]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record([
        "ID",
        "User",
        "Action",
        "Details",
        "IP Address",
        "User Agent",
        "Created At",
    ])?;

    for entry in entries {
        writer.write_record([
            entry.id.as_str(),
            entry.user_id.as_deref().unwrap_or("system"),
            entry.action.label(),
            entry.details.as_str(),
            entry.ip_address.as_deref().unwrap_or(""),
            entry.user_agent.as_deref().unwrap_or(""),
            &entry.created_at.to_rfc3339(),
        ])?;
    }

    finish(writer)
}

/// Resident-directory counterpart of the audit export.
pub fn export_residents(residents: &[Resident]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record([
        "ID",
        "Email",
        "First Name",
        "Last Name",
        "Role",
        "Contact Number",
        "Created At",
    ])?;

    for resident in residents {
        writer.write_record([
            resident.id.as_str(),
            resident.email.as_str(),
            resident.first_name.as_str(),
            resident.last_name.as_str(),
            resident.role.label(),
            resident.contact_number.as_deref().unwrap_or(""),
            &resident.created_at.to_rfc3339(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let buffer = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;
    String::from_utf8(buffer).map_err(|_| ExportError::Encoding)
}

//! Tabular report of verification results.
//!
//! One [`ReportRow`] per address, with the literal column values of the
//! downloadable report. CSV reading and writing need the `with-csv` feature.

#[cfg(feature = "with-csv")]
use std::io::{Read, Write};

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "with-csv")]
use thiserror::Error;

use crate::verify::VerificationResult;

pub const REPORT_HEADERS: [&str; 5] = [
    "Email",
    "SyntaxValid",
    "DomainHasMX",
    "MailboxExists",
    "OverallStatus",
];

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    #[cfg_attr(feature = "with-serde", serde(rename = "Email"))]
    pub email: String,
    /// `Valid` or `Invalid`.
    #[cfg_attr(feature = "with-serde", serde(rename = "SyntaxValid"))]
    pub syntax_valid: String,
    /// `True` or `False`.
    #[cfg_attr(feature = "with-serde", serde(rename = "DomainHasMX"))]
    pub domain_has_mx: String,
    #[cfg_attr(feature = "with-serde", serde(rename = "MailboxExists"))]
    pub mailbox_exists: String,
    #[cfg_attr(feature = "with-serde", serde(rename = "OverallStatus"))]
    pub overall_status: String,
}

impl ReportRow {
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.email,
            &self.syntax_valid,
            &self.domain_has_mx,
            &self.mailbox_exists,
            &self.overall_status,
        ]
    }
}

impl From<&VerificationResult> for ReportRow {
    fn from(result: &VerificationResult) -> Self {
        Self {
            email: result.address().to_string(),
            syntax_valid: if result.syntax_valid() { "Valid" } else { "Invalid" }.to_string(),
            domain_has_mx: if result.has_mx() { "True" } else { "False" }.to_string(),
            mailbox_exists: result.mailbox_status().as_str().to_string(),
            overall_status: result.overall_status().label().to_string(),
        }
    }
}

#[cfg(feature = "with-csv")]
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("input has no 'Email' column (found: {})", .found.join(", "))]
    MissingEmailColumn { found: Vec<String> },
    #[error("write failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Header plus one record per row, CRLF line endings.
#[cfg(feature = "with-csv")]
pub fn write_csv_report<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    // en-tête écrit à la main: présent même sans ligne
    wtr.write_record(REPORT_HEADERS)?;
    for row in rows {
        wtr.write_record(row.fields())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Addresses of the `Email` column, trimmed. One entry per data row: blank
/// or missing cells come back as empty strings so the report keeps the
/// input's row count.
#[cfg(feature = "with-csv")]
pub fn read_csv_emails<R: Read>(reader: R) -> Result<Vec<String>, ReportError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = headers
        .iter()
        .position(|name| name.trim_start_matches('\u{feff}').trim() == "Email")
        .ok_or_else(|| ReportError::MissingEmailColumn {
            found: headers.iter().map(str::to_string).collect(),
        })?;

    let mut emails = Vec::new();
    for record in rdr.records() {
        let record = record?;
        emails.push(record.get(column).map(str::trim).unwrap_or_default().to_string());
    }
    Ok(emails)
}

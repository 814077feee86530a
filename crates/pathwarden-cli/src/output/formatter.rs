//! Output formatter trait for CLI results.

use crate::commands::allow::AllowChange;
use crate::commands::allow::AllowTestOutcome;
use crate::commands::archive::ArchiveCheckReport;
use crate::commands::check::CheckOutcome;
use anyhow::Result;
use pathwarden_core::StatusReport;
use pathwarden_core::allowlist::AllowListEntry;
use serde::Serialize;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the mode / roots / limits report
    fn format_status(&self, report: &StatusReport) -> Result<()>;

    /// Format a successful path check
    fn format_check(&self, outcome: &CheckOutcome) -> Result<()>;

    /// Format the allow-list
    fn format_allow_list(&self, entries: &[AllowListEntry]) -> Result<()>;

    /// Format an allow-list addition or removal
    fn format_allow_change(&self, change: &AllowChange) -> Result<()>;

    /// Format an allow-list lookup
    fn format_allow_test(&self, outcome: &AllowTestOutcome) -> Result<()>;

    /// Format an archive check
    fn format_archive_check(&self, report: &ArchiveCheckReport) -> Result<()>;

    /// Format error message
    fn format_error(&self, operation: &str, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    /// Envelope carrying both the data gathered and why the operation failed.
    pub fn failure(operation: impl Into<String>, data: T, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: Some(data),
            error: Some(error.into()),
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}

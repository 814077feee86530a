//! JSON output formatter for machine-readable results.
//!
//! Every command writes exactly one envelope to stdout. Warnings go to
//! stderr so they never break a consumer parsing stdout.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use crate::commands::allow::AllowChange;
use crate::commands::allow::AllowTestOutcome;
use crate::commands::archive::ArchiveCheckReport;
use crate::commands::check::CheckOutcome;
use anyhow::Result;
use pathwarden_core::StatusReport;
use pathwarden_core::allowlist::AllowListEntry;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_status(&self, report: &StatusReport) -> Result<()> {
        Self::output(&JsonOutput::success("status", report))
    }

    fn format_check(&self, outcome: &CheckOutcome) -> Result<()> {
        Self::output(&JsonOutput::success("check", outcome))
    }

    fn format_allow_list(&self, entries: &[AllowListEntry]) -> Result<()> {
        #[derive(Serialize)]
        struct AllowListOutput<'a> {
            count: usize,
            entries: &'a [AllowListEntry],
        }

        let data = AllowListOutput {
            count: entries.len(),
            entries,
        };
        Self::output(&JsonOutput::success("allow-list", data))
    }

    fn format_allow_change(&self, change: &AllowChange) -> Result<()> {
        let operation = if change.action == "added" { "allow-add" } else { "allow-remove" };
        Self::output(&JsonOutput::success(operation, change))
    }

    fn format_allow_test(&self, outcome: &AllowTestOutcome) -> Result<()> {
        Self::output(&JsonOutput::success("allow-test", outcome))
    }

    fn format_archive_check(&self, report: &ArchiveCheckReport) -> Result<()> {
        if report.is_safe() {
            Self::output(&JsonOutput::success("archive-check", report))
        } else {
            let error = format!("{} unsafe entries", report.rejected.len());
            Self::output(&JsonOutput::failure("archive-check", report, error))
        }
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        let output = JsonOutput::success("warning", WarningData { message });
        if let Ok(json) = serde_json::to_string(&output) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let output = JsonOutput::error("check", "ACCESS_DENIED: path is outside the permitted directories");
        let value: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["operation"], "check");
        assert_eq!(value["status"], "error");
        assert!(value.get("data").is_none());
        assert!(value["error"].as_str().unwrap().starts_with("ACCESS_DENIED"));
    }

    #[test]
    fn test_failure_envelope_keeps_data() {
        #[derive(Serialize)]
        struct Data {
            rejected: usize,
        }

        let output = JsonOutput::failure("archive-check", Data { rejected: 2 }, "2 unsafe entries");
        let value: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["data"]["rejected"], 2);
    }
}

//! Output formatter trait for CLI results.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use unnest_core::SessionReport;

/// Result of unpacking one planned input.
pub struct InputOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub result: std::result::Result<SessionReport, anyhow::Error>,
}

impl InputOutcome {
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Whether session narration should be printed while inputs run
    fn echo_narration(&self) -> bool;

    /// Format the result of one input, right after it finished
    fn format_input_result(&self, outcome: &InputOutcome) -> Result<()>;

    /// Format the result of the whole batch
    fn format_batch_result(&self, outcomes: &[InputOutcome]) -> Result<()>;

    /// Format informational message
    fn format_info(&self, message: &str);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Envelope of every JSON document the CLI prints.
///
/// `data` is present on failure too, so scripts see which inputs
/// succeeded.
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: &'static str,
    pub status: Status,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    /// Builds the envelope; `error` set means the operation failed.
    pub fn new(operation: &'static str, data: T, error: Option<String>) -> Self {
        let status = if error.is_some() {
            Status::Error
        } else {
            Status::Success
        };
        Self {
            operation,
            status,
            data,
            error,
        }
    }
}

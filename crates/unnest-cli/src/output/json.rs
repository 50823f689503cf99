//! JSON output formatter for machine-readable results.
//!
//! Nothing is printed until the batch ends; then one document describes
//! every input.

use super::formatter::InputOutcome;
use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

#[derive(Debug, Serialize)]
struct InputOutput {
    source: String,
    output: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    archives_extracted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files_placed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    directories_placed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbatim_copies: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth_limit_hits: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&InputOutcome> for InputOutput {
    fn from(outcome: &InputOutcome) -> Self {
        let mut out = Self {
            source: outcome.source.display().to_string(),
            output: outcome.output.display().to_string(),
            status: "success",
            archives_extracted: None,
            files_placed: None,
            directories_placed: None,
            verbatim_copies: None,
            depth_limit_hits: None,
            duration_ms: None,
            warnings: Vec::new(),
            error: None,
        };
        match &outcome.result {
            Ok(report) => {
                out.archives_extracted = Some(report.archives_extracted);
                out.files_placed = Some(report.files_placed);
                out.directories_placed = Some(report.directories_placed);
                out.verbatim_copies = Some(report.verbatim_copies);
                out.depth_limit_hits = Some(report.depth_limit_hits);
                out.duration_ms = Some(report.duration.as_millis());
                out.warnings.clone_from(&report.warnings);
            }
            Err(error) => {
                out.status = "error";
                out.error = Some(format!("{error:#}"));
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    inputs: Vec<InputOutput>,
    succeeded: usize,
    failed: usize,
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }

    fn document(outcomes: &[InputOutcome]) -> JsonOutput<BatchOutput> {
        let inputs: Vec<InputOutput> = outcomes.iter().map(InputOutput::from).collect();
        let failed = inputs.iter().filter(|i| i.error.is_some()).count();
        let data = BatchOutput {
            succeeded: inputs.len() - failed,
            failed,
            inputs,
        };
        let error = (failed > 0)
            .then(|| format!("{failed} of {} input(s) failed", data.inputs.len()));
        JsonOutput::new("unpack", data, error)
    }
}

impl OutputFormatter for JsonFormatter {
    fn echo_narration(&self) -> bool {
        false
    }

    fn format_input_result(&self, _outcome: &InputOutcome) -> Result<()> {
        Ok(())
    }

    fn format_batch_result(&self, outcomes: &[InputOutcome]) -> Result<()> {
        Self::output(&Self::document(outcomes))
    }

    fn format_info(&self, _message: &str) {}

    fn format_warning(&self, _message: &str) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::path::PathBuf;
    use unnest_core::SessionReport;

    fn outcome(ok: bool) -> InputOutcome {
        InputOutcome {
            source: PathBuf::from("a.zip"),
            output: PathBuf::from("a_Unpacked"),
            result: if ok {
                Ok(SessionReport {
                    archives_extracted: 2,
                    files_placed: 3,
                    ..SessionReport::default()
                })
            } else {
                Err(anyhow!("boom"))
            },
        }
    }

    #[test]
    fn test_successful_batch_document() {
        let json = serde_json::to_value(JsonFormatter::document(&[outcome(true)])).unwrap();
        assert_eq!(json["operation"], "unpack");
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["succeeded"], 1);
        assert_eq!(json["data"]["inputs"][0]["archives_extracted"], 2);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failed_batch_document() {
        let json =
            serde_json::to_value(JsonFormatter::document(&[outcome(true), outcome(false)]))
                .unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "1 of 2 input(s) failed");
        assert_eq!(json["data"]["inputs"][1]["status"], "error");
        assert_eq!(json["data"]["inputs"][1]["error"], "boom");
        assert!(json["data"]["inputs"][1].get("files_placed").is_none());
    }
}

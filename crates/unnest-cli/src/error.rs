//! Error conversion utilities for CLI.
//!
//! Converts unnest-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use unnest_core::ExtractionError;

/// Converts `ExtractionError` to user-friendly anyhow error with context
pub fn convert_session_error(err: ExtractionError, input: &Path) -> anyhow::Error {
    match err {
        ExtractionError::SourceNotFound { path } => {
            anyhow!(
                "Input not found: {}\n\
                 HINT: Check the path. Directories are expanded to the files directly inside them.",
                path.display()
            )
        }
        ExtractionError::MissingSplitFirstPart { part, expected } => {
            anyhow!(
                "Cannot open split volume '{}': first part '{}' is missing\n\
                 HINT: Put every volume of the set in the same directory and try again.",
                part.display(),
                expected.display()
            )
        }
        ExtractionError::InvalidConfig(reason) => {
            anyhow!(
                "Invalid configuration: {reason}\n\
                 HINT: Use --archiver to name a 7-Zip compatible program, or --no-fallback."
            )
        }
        ExtractionError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                input.display(),
                io_err
            )
        }
        ExtractionError::Cleanup { path, source } => {
            anyhow!(
                "Could not remove scratch directory '{}': {}\n\
                 HINT: It can be deleted by hand; the unpacked output is complete.",
                path.display(),
                source
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error processing '{}'", input.display())),
    }
}

/// Adds context to a settings-loading error.
pub fn convert_config_error(err: ExtractionError, file: &Path) -> anyhow::Error {
    anyhow!(
        "Could not load '{}': {err}\n\
         HINT: Settings files are JSON; password and extension lists are plain text, one entry per line.",
        file.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_missing_split_part() {
        let err = ExtractionError::MissingSplitFirstPart {
            part: PathBuf::from("demo.003"),
            expected: PathBuf::from("demo.001"),
        };
        let converted = convert_session_error(err, Path::new("demo.003"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("first part 'demo.001' is missing"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_source_not_found() {
        let err = ExtractionError::SourceNotFound {
            path: PathBuf::from("gone.zip"),
        };
        let msg = format!("{:?}", convert_session_error(err, Path::new("gone.zip")));
        assert!(msg.contains("Input not found: gone.zip"));
    }

    #[test]
    fn test_convert_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ExtractionError::Io(io_err);
        let converted = convert_session_error(err, Path::new("archive.zip"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("archive.zip"));
    }

    #[test]
    fn test_convert_config_error() {
        let err = ExtractionError::InvalidConfig("expected value".into());
        let msg = format!("{:?}", convert_config_error(err, Path::new("settings.json")));
        assert!(msg.contains("settings.json"));
        assert!(msg.contains("HINT"));
    }
}

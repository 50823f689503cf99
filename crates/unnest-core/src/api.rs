//! High-level public API.

use std::path::Path;

use crate::NoopReporter;
use crate::Reporter;
use crate::Result;
use crate::SessionReport;
use crate::Settings;
use crate::Unpacker;

/// Recursively unpacks `source` into `output_dir`.
///
/// This is the main high-level entry point. It runs one session with the
/// native decoding backend and discards the narration; use
/// [`unpack_with_reporter`] to observe it.
///
/// # Arguments
///
/// * `source` - The archive to unpack (any volume of a split set)
/// * `output_dir` - Directory receiving the final content
/// * `settings` - Passwords, disguised-extension and fallback settings
///
/// # Errors
///
/// Returns an error if:
/// - `source` does not exist
/// - `source` is a later split volume whose first part is missing
/// - The settings are inconsistent
/// - The output or scratch directory cannot be written
///
/// An archive that cannot be opened is not an error: it is copied to the
/// output unchanged.
///
/// # Examples
///
/// ```no_run
/// use unnest_core::Settings;
/// use unnest_core::unpack;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::default().with_passwords(["secret"]);
/// let report = unpack("bundle.zip", "bundle_Unpacked", &settings)?;
/// println!("Extracted {} archives", report.archives_extracted);
/// # Ok(())
/// # }
/// ```
pub fn unpack<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output_dir: Q,
    settings: &Settings,
) -> Result<SessionReport> {
    unpack_with_reporter(source, output_dir, settings, &mut NoopReporter)
}

/// Recursively unpacks `source` into `output_dir`, narrating to `reporter`.
///
/// # Errors
///
/// Same as [`unpack`].
///
/// # Examples
///
/// ```no_run
/// use unnest_core::MemoryReporter;
/// use unnest_core::Settings;
/// use unnest_core::unpack_with_reporter;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut reporter = MemoryReporter::new();
/// unpack_with_reporter("movie.003", "movie_Unpacked", &Settings::default(), &mut reporter)?;
/// for (level, line) in &reporter.messages {
///     println!("[{level}] {line}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn unpack_with_reporter<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output_dir: Q,
    settings: &Settings,
    reporter: &mut dyn Reporter,
) -> Result<SessionReport> {
    Unpacker::new(settings).process(source.as_ref(), output_dir.as_ref(), reporter)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use crate::test_utils::create_test_zip;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unpack_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = unpack(
            temp.path().join("nonexistent.zip"),
            temp.path().join("out"),
            &Settings::default(),
        );
        assert!(matches!(result, Err(ExtractionError::SourceNotFound { .. })));
    }

    #[test]
    fn test_unpack_zip() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.zip");
        fs::write(&source, create_test_zip(&[("hello.txt", b"hi")])).unwrap();
        let out = temp.path().join("a_Unpacked");

        let settings = Settings::default().with_archiver("unnest-test-no-such-archiver");
        let report = unpack(&source, &out, &settings).unwrap();

        assert_eq!(report.output_dir, out);
        assert_eq!(fs::read(out.join("hello.txt")).unwrap(), b"hi");
    }
}

//! Last-resort extraction through an external 7-Zip compatible program.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;

use crate::ExtractionError;
use crate::Result;

/// Longest tail of the archiver's stderr kept in error messages.
const STDERR_TAIL: usize = 512;

/// Invokes `<program> x <archive> -o<dest> -y [-p<password>]`.
#[derive(Debug, Clone, Copy)]
pub struct ExternalArchiver<'a> {
    program: &'a Path,
}

impl<'a> ExternalArchiver<'a> {
    /// Wraps the program to run.
    #[must_use]
    pub const fn new(program: &'a Path) -> Self {
        Self { program }
    }

    /// Returns the program's display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.program.display().to_string()
    }

    /// Builds the argument list. `-p` is only passed for a non-empty
    /// password, so that an empty one never triggers a prompt.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use unnest_core::strategy::external::ExternalArchiver;
    ///
    /// let archiver = ExternalArchiver::new(Path::new("7z"));
    /// let args: Vec<String> = archiver
    ///     .arguments(Path::new("a.rar"), Path::new("out"), "pw")
    ///     .iter()
    ///     .map(|a| a.to_string_lossy().into_owned())
    ///     .collect();
    /// assert_eq!(args, ["x", "a.rar", "-oout", "-y", "-ppw"]);
    ///
    /// let args = archiver.arguments(Path::new("a.rar"), Path::new("out"), "");
    /// assert_eq!(args.len(), 4);
    /// ```
    #[must_use]
    pub fn arguments(&self, archive: &Path, dest: &Path, password: &str) -> Vec<OsString> {
        let mut output_flag = OsString::from("-o");
        output_flag.push(dest.as_os_str());

        let mut args = vec![
            OsString::from("x"),
            archive.as_os_str().to_owned(),
            output_flag,
            OsString::from("-y"),
        ];
        if !password.is_empty() {
            args.push(OsString::from(format!("-p{password}")));
        }
        args
    }

    /// Runs the archiver and waits for it.
    ///
    /// Stdin is closed and output is captured, so the archiver can never
    /// block on a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Io`] if the program cannot be started and
    /// [`ExtractionError::ExternalProcess`] if it exits unsuccessfully.
    pub fn extract(&self, archive: &Path, dest: &Path, password: &str) -> Result<()> {
        let output = Command::new(self.program)
            .args(self.arguments(archive, dest, password))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let tail_start = stderr
            .char_indices()
            .rev()
            .nth(STDERR_TAIL)
            .map_or(0, |(i, _)| i);
        Err(ExtractionError::ExternalProcess {
            program: self.name(),
            reason: format!("{}: {}", output.status, &stderr[tail_start..]),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_program_is_io_error() {
        let temp = TempDir::new().unwrap();
        let archiver = ExternalArchiver::new(Path::new("unnest-test-no-such-archiver"));
        let err = archiver
            .extract(&temp.path().join("a.rar"), temp.path(), "")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_external_error() {
        let temp = TempDir::new().unwrap();
        let archiver = ExternalArchiver::new(Path::new("false"));
        let err = archiver
            .extract(&temp.path().join("a.rar"), temp.path(), "pw")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ExternalProcess { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_arguments_keep_spaces_intact() {
        let archiver = ExternalArchiver::new(Path::new("7z"));
        let args = archiver.arguments(
            Path::new("my files/a b.7z"),
            Path::new("scratch dir/x1"),
            "two words",
        );
        assert_eq!(args[1], OsString::from("my files/a b.7z"));
        assert_eq!(args[2], OsString::from("-oscratch dir/x1"));
        assert_eq!(args[4], OsString::from("-ptwo words"));
    }
}

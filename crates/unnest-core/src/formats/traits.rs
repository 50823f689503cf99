//! Capability contract for archive-decoding backends.

use std::path::Path;

use crate::Result;

use super::Format;

/// An archive opened with a particular password and format.
pub trait OpenedArchive {
    /// Runs a cheap integrity pass without writing anything.
    ///
    /// Returns `Ok(false)` when the password is wrong or the data is
    /// damaged. Errors are reserved for faults unrelated to the archive
    /// content (unreadable file, I/O failure).
    fn check_integrity(&mut self) -> Result<bool>;

    /// Extracts every entry beneath `dest`.
    ///
    /// `progress` receives percentages in `0..=100` as extraction proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::WrongPasswordOrCorrupt`] or
    /// [`ExtractionError::FormatMismatch`] for recoverable failures and
    /// [`ExtractionError::Io`] for unexpected faults.
    ///
    /// [`ExtractionError::WrongPasswordOrCorrupt`]: crate::ExtractionError::WrongPasswordOrCorrupt
    /// [`ExtractionError::FormatMismatch`]: crate::ExtractionError::FormatMismatch
    /// [`ExtractionError::Io`]: crate::ExtractionError::Io
    fn extract_all(&mut self, dest: &Path, progress: &mut dyn FnMut(u8)) -> Result<()>;

    /// Returns the format the archive was opened as.
    fn format(&self) -> Format;
}

/// Opens archives for the strategy selector.
///
/// Implementations must be shareable with the background worker that runs
/// password attempts, hence the `Send + Sync` bound.
pub trait ArchiveBackend: Send + Sync {
    /// Opens `path` with `password`.
    ///
    /// With `forced` set, the file is opened as that format regardless of
    /// its name. Otherwise the backend decides from the extension and, if
    /// needed, the file's signature.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] when no decoder
    /// exists for the format, so that callers can skip the remaining
    /// passwords for it.
    ///
    /// [`ExtractionError::UnsupportedFormat`]: crate::ExtractionError::UnsupportedFormat
    fn open(
        &self,
        path: &Path,
        password: &str,
        forced: Option<Format>,
    ) -> Result<Box<dyn OpenedArchive>>;

    /// Returns the backend name used in diagnostics.
    fn name(&self) -> &str;
}

//! Common extraction utilities shared between format handlers.
//!
//! Internal module: path sanitizing, buffered entry writes and the mapping
//! of decoder errors onto the engine's error taxonomy.

use std::fs::File;
use std::fs::create_dir_all;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::ExtractionError;
use crate::Format;

/// Buffer size for entry writes (64KB).
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Turns an entry name into a relative path that stays inside the
/// destination.
///
/// Root, prefix and `..` components are dropped, `.` is ignored and
/// backslashes are treated as separators. Returns `None` when nothing is
/// left.
pub fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                tracing::debug!(entry = name, "dropping parent component from entry path");
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Writes one file entry beneath `root`, creating parent directories.
///
/// Returns the number of bytes written.
pub fn write_entry<R: Read + ?Sized>(
    reader: &mut R,
    root: &Path,
    relative: &Path,
) -> crate::Result<u64> {
    let output_path = root.join(relative);
    if let Some(parent) = output_path.parent() {
        create_dir_all(parent)?;
    }

    let output_file = File::create(&output_path)?;
    let mut buffered_writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, output_file);
    let bytes_written = std::io::copy(reader, &mut buffered_writer).map_err(decode_error)?;
    buffered_writer.flush()?;
    Ok(bytes_written)
}

/// Creates a directory entry beneath `root` (idempotent).
pub fn create_entry_dir(root: &Path, relative: &Path) -> crate::Result<()> {
    create_dir_all(root.join(relative))?;
    Ok(())
}

/// Classifies an I/O error raised while decoding.
///
/// Decoders report checksum failures, truncated streams and bad keys as
/// `InvalidData`, `InvalidInput`, `UnexpectedEof` or `Other`. Those are
/// recoverable. Anything else (permissions, disk full) is a real fault.
pub fn decode_error(err: std::io::Error) -> ExtractionError {
    use std::io::ErrorKind;
    match err.kind() {
        ErrorKind::InvalidData
        | ErrorKind::InvalidInput
        | ErrorKind::UnexpectedEof
        | ErrorKind::Other => ExtractionError::WrongPasswordOrCorrupt {
            reason: err.to_string(),
        },
        _ => ExtractionError::Io(err),
    }
}

/// Builds a [`ExtractionError::FormatMismatch`] from a decoder message.
pub fn mismatch(format: Format, reason: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::FormatMismatch {
        format,
        reason: reason.to_string(),
    }
}

/// Folds the outcome of a verification pass into an integrity verdict.
///
/// Recoverable failures become `Ok(false)`; other errors propagate.
pub fn integrity_verdict(format: Format, outcome: crate::Result<()>) -> crate::Result<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(err) if err.is_recoverable() => {
            tracing::debug!(%format, error = %err, "integrity check failed");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Counts the regular files anywhere beneath `dir`.
///
/// Symbolic links are not followed and not counted.
#[must_use]
pub fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}

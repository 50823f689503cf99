//! Error types for recursive unpacking.

use std::path::PathBuf;
use thiserror::Error;

use crate::formats::Format;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur while unpacking.
///
/// Most variants describe the outcome of a single attempt and are consumed
/// inside the strategy selector. Only [`Io`](Self::Io) and the input-level
/// variants ever reach the caller of [`Unpacker::process`].
///
/// [`Unpacker::process`]: crate::Unpacker::process
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The password was rejected or the stream failed its integrity check.
    ///
    /// Decoders cannot reliably tell a wrong key from damaged data, so both
    /// share one variant.
    #[error("wrong password or corrupt data: {reason}")]
    WrongPasswordOrCorrupt {
        /// Decoder message.
        reason: String,
    },

    /// The file did not parse as the format it was opened with.
    #[error("not a valid {format} archive: {reason}")]
    FormatMismatch {
        /// Format the file was opened as.
        format: Format,
        /// Decoder message.
        reason: String,
    },

    /// The decoding backend has no codec for this format.
    #[error("no decoder available for {0} archives")]
    UnsupportedFormat(Format),

    /// The external archiver could not be run or reported failure.
    #[error("external archiver '{program}' failed: {reason}")]
    ExternalProcess {
        /// Program that was invoked.
        program: String,
        /// Exit status or spawn error.
        reason: String,
    },

    /// Every strategy and password was tried without success.
    #[error("no extraction possible for {path}")]
    AllStrategiesExhausted {
        /// The archive that could not be opened.
        path: PathBuf,
    },

    /// The nesting limit was reached before this file could be opened.
    #[error("recursion depth {depth} exceeded at {path}")]
    RecursionDepthExceeded {
        /// The still-packed file.
        path: PathBuf,
        /// Depth at which the file was found.
        depth: usize,
    },

    /// A later volume of a split set was given but the first one is absent.
    #[error("first part {} is missing (needed to open {})", display_name(.expected), display_name(.part))]
    MissingSplitFirstPart {
        /// The volume that was supplied.
        part: PathBuf,
        /// The first volume that was looked for.
        expected: PathBuf,
    },

    /// The input path does not name a regular file.
    #[error("input file not found: {path}")]
    SourceNotFound {
        /// The missing input.
        path: PathBuf,
    },

    /// Removing the scratch workspace failed.
    #[error("could not clean up {path}: {source}")]
    Cleanup {
        /// Scratch directory that was left behind.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Settings could not be loaded or are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

impl ExtractionError {
    /// Returns `true` if the next password, format or strategy may still
    /// succeed after this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use unnest_core::ExtractionError;
    /// use unnest_core::Format;
    ///
    /// let err = ExtractionError::WrongPasswordOrCorrupt {
    ///     reason: "bad key".into(),
    /// };
    /// assert!(err.is_recoverable());
    ///
    /// let err = ExtractionError::UnsupportedFormat(Format::Rar);
    /// assert!(err.is_recoverable());
    ///
    /// let err = ExtractionError::InvalidConfig("empty".into());
    /// assert!(!err.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::WrongPasswordOrCorrupt { .. }
                | Self::FormatMismatch { .. }
                | Self::UnsupportedFormat(_)
                | Self::ExternalProcess { .. }
        )
    }

    /// Returns `true` if this error ends one branch of the recursion but
    /// not the whole session.
    #[must_use]
    pub const fn is_branch_terminal(&self) -> bool {
        matches!(
            self,
            Self::AllStrategiesExhausted { .. } | Self::RecursionDepthExceeded { .. }
        )
    }

    /// Returns `true` if this error concerns the input itself rather than
    /// anything found inside it.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSplitFirstPart { .. } | Self::SourceNotFound { .. }
        )
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::WrongPasswordOrCorrupt { reason }
            | Self::FormatMismatch { reason, .. }
            | Self::ExternalProcess { reason, .. } => Some(reason),
            Self::InvalidConfig(msg) => Some(msg),
            _ => None,
        }
    }
}

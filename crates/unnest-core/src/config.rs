//! Engine settings.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::ExtractionError;
use crate::Result;

/// Extensions checked for hidden archive content by default.
pub const DEFAULT_DISGUISED_EXTENSIONS: [&str; 11] = [
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".pdf",
];

/// Settings consumed by the [`Unpacker`](crate::Unpacker).
///
/// An `Unpacker` takes its own copy when it is built, so changing a
/// `Settings` value afterwards never affects a running session.
///
/// # Examples
///
/// ```
/// use unnest_core::Settings;
///
/// let settings = Settings::default()
///     .with_passwords(["infected", "1234"])
///     .with_detect_disguised(true);
///
/// assert!(settings.is_disguised_extension("MP4"));
/// assert_eq!(settings.passwords.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Passwords tried after the empty password and the file stem.
    pub passwords: Vec<String>,

    /// Extensions that may hide an archive (leading dot optional).
    pub disguised_extensions: Vec<String>,

    /// Check signatures of files with disguised extensions and allow
    /// brute-force format detection for them.
    pub detect_disguised: bool,

    /// Treat files with unfamiliar extensions as archive candidates.
    pub auto_detect_unknown_extensions: bool,

    /// Enable brute-force detection, the external archiver fallback and
    /// progress ticks.
    pub extended_engine: bool,

    /// Program used for the external fallback.
    pub archiver: PathBuf,
}

impl Default for Settings {
    /// Default values:
    /// - `passwords`: empty
    /// - `disguised_extensions`: [`DEFAULT_DISGUISED_EXTENSIONS`]
    /// - `detect_disguised`: false
    /// - `auto_detect_unknown_extensions`: true
    /// - `extended_engine`: true
    /// - `archiver`: `7z`
    fn default() -> Self {
        Self {
            passwords: Vec::new(),
            disguised_extensions: DEFAULT_DISGUISED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            detect_disguised: false,
            auto_detect_unknown_extensions: true,
            extended_engine: true,
            archiver: PathBuf::from("7z"),
        }
    }
}

impl Settings {
    /// Replaces the password list.
    #[must_use]
    pub fn with_passwords<I, S>(mut self, passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passwords = passwords.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the disguised-extension list, normalizing each entry to a
    /// lowercase extension with a leading dot.
    #[must_use]
    pub fn with_disguised_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disguised_extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        self
    }

    /// Enables or disables disguised-archive detection.
    #[must_use]
    pub fn with_detect_disguised(mut self, enabled: bool) -> Self {
        self.detect_disguised = enabled;
        self
    }

    /// Enables or disables treating unfamiliar extensions as candidates.
    #[must_use]
    pub fn with_auto_detect_unknown(mut self, enabled: bool) -> Self {
        self.auto_detect_unknown_extensions = enabled;
        self
    }

    /// Enables or disables the brute-force and external-archiver tiers.
    #[must_use]
    pub fn with_extended_engine(mut self, enabled: bool) -> Self {
        self.extended_engine = enabled;
        self
    }

    /// Sets the external archiver program.
    #[must_use]
    pub fn with_archiver(mut self, program: impl Into<PathBuf>) -> Self {
        self.archiver = program.into();
        self
    }

    /// Returns `true` if `extension` is listed as a disguised extension.
    ///
    /// Comparison is case-insensitive and ignores a leading dot on either
    /// side. Whether detection is enabled is not considered.
    #[must_use]
    pub fn is_disguised_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.');
        !wanted.is_empty()
            && self
                .disguised_extensions
                .iter()
                .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }

    /// Returns `true` if `path` may be brute-forced as a disguised archive:
    /// detection is enabled and its extension is listed.
    #[must_use]
    pub fn allows_brute_force(&self, path: &Path) -> bool {
        self.detect_disguised
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| self.is_disguised_extension(ext))
    }

    /// Checks that the settings can drive a session.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidConfig`] if the archiver program
    /// is empty while the extended engine is enabled.
    pub fn validate(&self) -> Result<()> {
        if self.extended_engine && self.archiver.as_os_str().is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "archiver program must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Loads settings from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidConfig`] if the file cannot be read
    /// or parsed. The result is not validated, so that command-line
    /// overrides can still be applied; call [`validate`](Self::validate)
    /// once they are.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExtractionError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|e| {
            ExtractionError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        Ok(settings)
    }
}

/// Normalizes an extension to lowercase with a single leading dot.
///
/// Returns `None` for blank input.
///
/// # Examples
///
/// ```
/// use unnest_core::config::normalize_extension;
///
/// assert_eq!(normalize_extension("MP4").as_deref(), Some(".mp4"));
/// assert_eq!(normalize_extension(" .Tif ").as_deref(), Some(".tif"));
/// assert_eq!(normalize_extension("  "), None);
/// ```
#[must_use]
pub fn normalize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(format!(".{}", ext.to_ascii_lowercase()))
    }
}

/// Parses a plain-text list: one entry per line, surrounding whitespace
/// trimmed, blank lines and lines starting with `#` ignored.
#[must_use]
pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect()
}

/// Reads and parses a plain-text list file (see [`parse_list`]).
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidConfig`] if the file cannot be read.
pub fn parse_list_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ExtractionError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
    })?;
    Ok(parse_list(&text))
}

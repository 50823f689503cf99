//! Deciding which extracted files are worth opening.

use std::path::Path;

use crate::Format;
use crate::Settings;
use crate::formats::detect::is_disguised;

/// Extensions that always denote an archive (or the first volume of one).
const ARCHIVE_EXTENSIONS: [&str; 9] = ["7z", "rar", "zip", "tar", "gz", "iso", "bz2", "xz", "001"];

/// Extensions marking a directory as final, runnable content.
pub const EXECUTABLE_EXTENSIONS: [&str; 7] = ["exe", "msi", "bat", "cmd", "ps1", "vbs", "com"];

/// Extensions of ordinary documents and media.
const NON_ARCHIVE_EXTENSIONS: [&str; 17] = [
    "txt", "log", "png", "jpg", "jpeg", "bmp", "gif", "mp3", "mp4", "avi", "mkv", "wav", "pdf",
    "doc", "docx", "xls", "xlsx",
];

fn listed(set: &[&str], ext: &str) -> bool {
    set.iter().any(|known| known.eq_ignore_ascii_case(ext))
}

fn extension(path: &Path) -> Option<&str> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Returns `true` if the path has an executable extension.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    extension(path).is_some_and(|ext| listed(&EXECUTABLE_EXTENSIONS, ext))
}

/// Why a file was or was not classified as an archive candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The file has no extension.
    NoExtension,
    /// The extension is a known archive extension.
    ArchiveExtension,
    /// The extension is executable.
    Executable,
    /// The signature contradicts a disguised extension.
    Disguised,
    /// The extension is a known document or media type.
    NonArchive,
    /// The extension is listed as possibly disguised.
    ConfiguredExtension,
    /// The extension is unfamiliar; the setting decides.
    UnknownExtension,
}

/// Outcome of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether the file should be opened.
    pub potential: bool,
    /// Format to force when opening (set for disguised archives).
    pub forced: Option<Format>,
    /// Which rule decided.
    pub reason: Reason,
}

impl Classification {
    const fn new(potential: bool, reason: Reason) -> Self {
        Self {
            potential,
            forced: None,
            reason,
        }
    }
}

/// Archive-candidate classifier bound to a settings snapshot.
///
/// The rules are applied in order, first match wins:
///
/// 1. no extension: candidate
/// 2. archive extension (`7z rar zip tar gz iso bz2 xz 001`): candidate
/// 3. executable extension: not a candidate
/// 4. disguised extension, detection on, signature contradicts the
///    extension: candidate with the detected format forced
/// 5. document or media extension: not a candidate
/// 6. disguised extension: candidate
/// 7. otherwise: candidate iff `auto_detect_unknown_extensions`
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unnest_core::ArchivePolicy;
/// use unnest_core::Settings;
///
/// let settings = Settings::default();
/// let policy = ArchivePolicy::new(&settings);
///
/// assert!(policy.classify(Path::new("inner.7z")).potential);
/// assert!(!policy.classify(Path::new("setup.exe")).potential);
/// assert!(!policy.classify(Path::new("readme.txt")).potential);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArchivePolicy<'a> {
    settings: &'a Settings,
}

impl<'a> ArchivePolicy<'a> {
    /// Creates a classifier reading `settings`.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Classifies `path`.
    ///
    /// Only rule 4 reads the file; every other rule looks at the name.
    #[must_use]
    pub fn classify(&self, path: &Path) -> Classification {
        let classification = self.decide(path);
        tracing::debug!(
            file = %path.display(),
            potential = classification.potential,
            forced = ?classification.forced,
            reason = ?classification.reason,
            "classified"
        );
        classification
    }

    /// Shorthand for `classify(path).potential`.
    #[must_use]
    pub fn is_potential_archive(&self, path: &Path) -> bool {
        self.classify(path).potential
    }

    fn decide(&self, path: &Path) -> Classification {
        let Some(ext) = extension(path) else {
            return Classification::new(true, Reason::NoExtension);
        };
        if listed(&ARCHIVE_EXTENSIONS, ext) {
            return Classification::new(true, Reason::ArchiveExtension);
        }
        if listed(&EXECUTABLE_EXTENSIONS, ext) {
            return Classification::new(false, Reason::Executable);
        }

        let configured = self.settings.is_disguised_extension(ext);
        if configured && self.settings.detect_disguised {
            if let Some(format) = is_disguised(path) {
                return Classification {
                    potential: true,
                    forced: Some(format),
                    reason: Reason::Disguised,
                };
            }
        }
        if listed(&NON_ARCHIVE_EXTENSIONS, ext) {
            return Classification::new(false, Reason::NonArchive);
        }
        if configured {
            return Classification::new(true, Reason::ConfiguredExtension);
        }
        Classification::new(
            self.settings.auto_detect_unknown_extensions,
            Reason::UnknownExtension,
        )
    }
}

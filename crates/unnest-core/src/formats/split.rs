//! Multi-volume (split) archive naming.
//!
//! Only the first volume of a split set is a valid entry point; the decoder
//! pulls in the remaining volumes itself. This module recognises the three
//! naming families in common use and maps any volume back to its first
//! part:
//!
//! | family | first part | continuation |
//! |--------|------------|--------------|
//! | numeric | `name.001` | `name.002` ... `name.999` |
//! | RAR part | `name.part1.rar`, `name.part01.rar` | `name.part2.rar` ... |
//! | legacy RAR | `name.rar` | `name.r00`, `name.r01` ... |

use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// `name.partN.rar`, capturing the prefix and the digits.
static RAR_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*)\.part(\d+)\.rar$").unwrap_or_else(|e| unreachable!("{e}"))
});

/// Legacy RAR continuation extension, e.g. `r00`.
static LEGACY_RAR_EXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^r\d+$").unwrap_or_else(|e| unreachable!("{e}"))
});

/// Naming family of a split volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitVolume {
    /// Three-digit numeric extension, with its volume number.
    Numeric(u16),
    /// `name.partN.rar`, with N and the width N was written with.
    RarPart {
        /// Volume number.
        number: u32,
        /// Number of digits in the name (for zero padding).
        width: usize,
    },
    /// Legacy `.rNN` continuation of a `name.rar` set.
    LegacyRar,
}

impl SplitVolume {
    /// Classifies a path by its name alone.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        if ext.len() == 3 && ext.bytes().all(|b| b.is_ascii_digit()) {
            return ext.parse().ok().map(Self::Numeric);
        }

        if let Some(caps) = RAR_PART_RE.captures(name) {
            let digits = &caps[2];
            if let Ok(number) = digits.parse() {
                return Some(Self::RarPart {
                    number,
                    width: digits.len(),
                });
            }
        }

        if LEGACY_RAR_EXT_RE.is_match(ext) {
            return Some(Self::LegacyRar);
        }

        None
    }

    /// Returns `true` for volumes that must not be opened on their own.
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        match self {
            Self::Numeric(n) => n > 1,
            Self::RarPart { number, .. } => number != 1,
            Self::LegacyRar => true,
        }
    }
}

/// Returns `true` if the path names a later volume of a split set.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unnest_core::formats::split::is_non_first_part;
///
/// assert!(!is_non_first_part(Path::new("movie.001")));
/// assert!(is_non_first_part(Path::new("movie.002")));
/// assert!(!is_non_first_part(Path::new("set.part01.rar")));
/// assert!(is_non_first_part(Path::new("set.part02.rar")));
/// assert!(is_non_first_part(Path::new("set.r00")));
/// assert!(!is_non_first_part(Path::new("set.rar")));
/// ```
#[must_use]
pub fn is_non_first_part(path: &Path) -> bool {
    let verdict = SplitVolume::from_path(path).is_some_and(SplitVolume::is_continuation);
    if verdict {
        tracing::debug!(path = %path.display(), "split volume continuation, skipping");
    }
    verdict
}

/// Returns the first-volume path implied by a continuation's name.
///
/// Returns `None` when the path is not a continuation. Existence on disk is
/// not checked.
#[must_use]
pub fn expected_first_part(path: &Path) -> Option<PathBuf> {
    let volume = SplitVolume::from_path(path)?;
    if !volume.is_continuation() {
        return None;
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path.file_stem()?.to_string_lossy();
    let first = match volume {
        SplitVolume::Numeric(_) => format!("{stem}.001"),
        SplitVolume::RarPart { width, .. } => {
            let name = path.file_name()?.to_str()?;
            let caps = RAR_PART_RE.captures(name)?;
            format!("{}.part{:0width$}.rar", &caps[1], 1)
        }
        SplitVolume::LegacyRar => format!("{stem}.rar"),
    };
    Some(dir.join(first))
}

/// Resolves any volume to the first part of its set.
///
/// Returns the first part when it exists on disk, otherwise the input
/// unchanged. First parts and ordinary files resolve to themselves.
#[must_use]
pub fn canonical_first_part(path: &Path) -> PathBuf {
    expected_first_part(path)
        .filter(|first| first.is_file())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_numeric_volumes() {
        assert!(!is_non_first_part(Path::new("demo.001")));
        assert!(is_non_first_part(Path::new("demo.002")));
        assert!(is_non_first_part(Path::new("demo.999")));
        assert!(!is_non_first_part(Path::new("demo.000")));
    }

    #[test]
    fn test_numeric_requires_three_digits() {
        assert!(!is_non_first_part(Path::new("demo.02")));
        assert!(!is_non_first_part(Path::new("demo.0002")));
        assert!(!is_non_first_part(Path::new("demo.mp3")));
    }

    #[test]
    fn test_rar_part_volumes() {
        assert!(!is_non_first_part(Path::new("set.part1.rar")));
        assert!(!is_non_first_part(Path::new("set.part01.rar")));
        assert!(!is_non_first_part(Path::new("set.part001.rar")));
        assert!(is_non_first_part(Path::new("set.part2.rar")));
        assert!(is_non_first_part(Path::new("SET.PART10.RAR")));
    }

    #[test]
    fn test_rar_part_requires_digits() {
        assert!(!is_non_first_part(Path::new("my.partial.rar")));
    }

    #[test]
    fn test_legacy_rar_volumes() {
        assert!(is_non_first_part(Path::new("old.r00")));
        assert!(is_non_first_part(Path::new("old.R15")));
        assert!(!is_non_first_part(Path::new("old.rar")));
        assert!(!is_non_first_part(Path::new("old.rtf")));
    }

    #[test]
    fn test_expected_first_part() {
        assert_eq!(
            expected_first_part(Path::new("dl/demo.003")),
            Some(PathBuf::from("dl/demo.001"))
        );
        assert_eq!(
            expected_first_part(Path::new("dl/set.part07.rar")),
            Some(PathBuf::from("dl/set.part01.rar"))
        );
        assert_eq!(
            expected_first_part(Path::new("dl/set.part7.rar")),
            Some(PathBuf::from("dl/set.part1.rar"))
        );
        assert_eq!(
            expected_first_part(Path::new("dl/old.r03")),
            Some(PathBuf::from("dl/old.rar"))
        );
        assert_eq!(expected_first_part(Path::new("dl/demo.001")), None);
        assert_eq!(expected_first_part(Path::new("dl/notes.txt")), None);
    }

    #[test]
    fn test_canonical_first_part_when_present() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("demo.001");
        let third = temp.path().join("demo.003");
        fs::write(&first, b"a").unwrap();
        fs::write(&third, b"c").unwrap();

        assert_eq!(canonical_first_part(&third), first);
        assert_eq!(canonical_first_part(&first), first);
    }

    #[test]
    fn test_canonical_first_part_when_missing() {
        let temp = TempDir::new().unwrap();
        let third = temp.path().join("demo.003");
        fs::write(&third, b"c").unwrap();

        assert_eq!(canonical_first_part(&third), third);
    }
}

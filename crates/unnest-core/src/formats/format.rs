//! The closed set of container formats the engine reasons about.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// Container formats known to the engine.
///
/// The set is closed: anything else is [`Format::Unknown`]. Whether a format
/// can actually be decoded depends on the [`ArchiveBackend`] in use.
///
/// [`ArchiveBackend`]: super::ArchiveBackend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// 7z archive.
    SevenZip,
    /// RAR archive (v4 or v5).
    Rar,
    /// ZIP archive.
    Zip,
    /// Uncompressed tar archive.
    Tar,
    /// Gzip stream.
    GZip,
    /// Bzip2 stream.
    BZip2,
    /// XZ stream.
    Xz,
    /// Microsoft cabinet.
    Cab,
    /// ISO9660 disc image.
    Iso,
    /// ARJ archive.
    Arj,
    /// LHA/LZH archive.
    Lzh,
    /// Not identified.
    Unknown,
}

impl Format {
    /// Order in which formats are forced when guessing the real format of a
    /// disguised file.
    pub const BRUTE_FORCE_ORDER: [Self; 9] = [
        Self::Rar,
        Self::SevenZip,
        Self::Zip,
        Self::Tar,
        Self::GZip,
        Self::BZip2,
        Self::Xz,
        Self::Cab,
        Self::Iso,
    ];

    /// Returns the short human-readable name of the format.
    ///
    /// # Examples
    ///
    /// ```
    /// use unnest_core::Format;
    ///
    /// assert_eq!(Format::SevenZip.name(), "7z");
    /// assert_eq!(Format::Rar.name(), "RAR");
    /// ```
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SevenZip => "7z",
            Self::Rar => "RAR",
            Self::Zip => "ZIP",
            Self::Tar => "TAR",
            Self::GZip => "GZip",
            Self::BZip2 => "BZip2",
            Self::Xz => "XZ",
            Self::Cab => "CAB",
            Self::Iso => "ISO",
            Self::Arj => "ARJ",
            Self::Lzh => "LZH",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the format conventionally implied by a file extension.
    ///
    /// Matching is case-insensitive and accepts the extension with or
    /// without its leading dot. Split-volume `.001` files are treated as the
    /// container they slice, which is not knowable from the name, so they
    /// map to `None`.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let format = match ext.as_str() {
            "7z" => Self::SevenZip,
            "rar" => Self::Rar,
            "zip" => Self::Zip,
            "tar" => Self::Tar,
            "gz" | "tgz" => Self::GZip,
            "bz2" | "tbz" | "tbz2" => Self::BZip2,
            "xz" | "txz" => Self::Xz,
            "cab" => Self::Cab,
            "iso" => Self::Iso,
            "arj" => Self::Arj,
            "lzh" | "lha" => Self::Lzh,
            _ => return None,
        };
        Some(format)
    }

    /// Returns the format implied by a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats a file with the given extension is expected to contain.
///
/// Used to decide whether a detected signature contradicts the extension.
/// Extensions outside this table expect no archive format at all.
#[must_use]
pub fn expected_formats(ext: &str) -> &'static [Format] {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "7z" => &[Format::SevenZip],
        "rar" => &[Format::Rar],
        "zip" => &[Format::Zip],
        "tar" => &[Format::Tar],
        "gz" | "tgz" => &[Format::GZip],
        "bz2" => &[Format::BZip2],
        "xz" => &[Format::Xz],
        "cab" => &[Format::Cab],
        "iso" => &[Format::Iso],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(Format::from_extension("ZIP"), Some(Format::Zip));
        assert_eq!(Format::from_extension(".7Z"), Some(Format::SevenZip));
        assert_eq!(Format::from_extension("tgz"), Some(Format::GZip));
        assert_eq!(Format::from_extension("mp4"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Format::from_path(&PathBuf::from("backup.tar.gz")),
            Some(Format::GZip)
        );
        assert_eq!(Format::from_path(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_brute_force_order_excludes_undetectable() {
        assert_eq!(Format::BRUTE_FORCE_ORDER[0], Format::Rar);
        assert_eq!(Format::BRUTE_FORCE_ORDER[8], Format::Iso);
        assert!(!Format::BRUTE_FORCE_ORDER.contains(&Format::Arj));
        assert!(!Format::BRUTE_FORCE_ORDER.contains(&Format::Unknown));
    }

    #[test]
    fn test_expected_formats() {
        assert_eq!(expected_formats(".zip"), &[Format::Zip]);
        assert_eq!(expected_formats("TGZ"), &[Format::GZip]);
        assert!(expected_formats("tif").is_empty());
    }

    #[test]
    fn test_display_matches_name() {
        assert_eq!(Format::Xz.to_string(), "XZ");
        assert_eq!(Format::Unknown.to_string(), "unknown");
    }
}

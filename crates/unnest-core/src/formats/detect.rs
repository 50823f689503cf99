//! Archive format detection from leading bytes.
//!
//! Extensions lie. This module identifies the real container format of a
//! file by comparing its header with a table of magic-byte signatures,
//! which is what lets the engine open a `.tif` that is really a ZIP.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::format::Format;
use super::format::expected_formats;

/// Number of leading bytes read for signature matching.
///
/// Large enough for every table entry, including the tar magic at offset
/// 257. ISO9660 keeps its `CD001` marker at offset 32769, far outside this
/// window, so ISO images are never identified here and rely on the external
/// archiver instead.
pub const HEADER_WINDOW: usize = 512;

/// Files shorter than this are never classified.
const MIN_CLASSIFIABLE_LEN: usize = 2;

/// 7z signature: `"7z"` followed by `BC AF 27 1C`.
const SEVENZ_MAGIC: &[u8] = &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];

/// RAR 5.x signature: `"Rar!"` `1A 07 01 00`.
const RAR5_MAGIC: &[u8] = &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00];

/// RAR 1.5-4.x signature: `"Rar!"` `1A 07 00`.
const RAR4_MAGIC: &[u8] = &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

/// ZIP local file header.
const ZIP_LOCAL_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// ZIP end of central directory (empty archive).
const ZIP_EMPTY_MAGIC: &[u8] = &[0x50, 0x4B, 0x05, 0x06];

/// ZIP spanned-archive marker.
const ZIP_SPANNED_MAGIC: &[u8] = &[0x50, 0x4B, 0x07, 0x08];

const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];

/// `"BZh"`.
const BZIP2_MAGIC: &[u8] = &[0x42, 0x5A, 0x68];

const XZ_MAGIC: &[u8] = &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// POSIX `"ustar"` magic, found at offset 257 of the first tar header.
const TAR_MAGIC: &[u8] = b"ustar";
const TAR_MAGIC_OFFSET: usize = 257;

/// `"MSCF"`.
const CAB_MAGIC: &[u8] = &[0x4D, 0x53, 0x43, 0x46];

const ARJ_MAGIC: &[u8] = &[0x60, 0xEA];

/// LZH method id (`-lh0-`, `-lh5-`, ...) starting at offset 2.
const LZH_MAGIC: &[u8] = b"-lh";
const LZH_MAGIC_OFFSET: usize = 2;

/// A magic-byte pattern anchored at a fixed offset.
#[derive(Debug, Clone, Copy)]
struct Signature {
    magic: &'static [u8],
    offset: usize,
    format: Format,
}

impl Signature {
    const fn at_start(magic: &'static [u8], format: Format) -> Self {
        Self {
            magic,
            offset: 0,
            format,
        }
    }

    fn matches(&self, header: &[u8]) -> bool {
        header
            .get(self.offset..self.offset + self.magic.len())
            .is_some_and(|window| window == self.magic)
    }
}

/// Signature table in priority order. The first match wins, so the more
/// specific RAR5 pattern precedes RAR4.
const SIGNATURES: [Signature; 13] = [
    Signature::at_start(SEVENZ_MAGIC, Format::SevenZip),
    Signature::at_start(RAR5_MAGIC, Format::Rar),
    Signature::at_start(RAR4_MAGIC, Format::Rar),
    Signature::at_start(ZIP_LOCAL_MAGIC, Format::Zip),
    Signature::at_start(ZIP_EMPTY_MAGIC, Format::Zip),
    Signature::at_start(ZIP_SPANNED_MAGIC, Format::Zip),
    Signature::at_start(GZIP_MAGIC, Format::GZip),
    Signature::at_start(BZIP2_MAGIC, Format::BZip2),
    Signature::at_start(XZ_MAGIC, Format::Xz),
    Signature {
        magic: TAR_MAGIC,
        offset: TAR_MAGIC_OFFSET,
        format: Format::Tar,
    },
    Signature::at_start(CAB_MAGIC, Format::Cab),
    Signature::at_start(ARJ_MAGIC, Format::Arj),
    Signature {
        magic: LZH_MAGIC,
        offset: LZH_MAGIC_OFFSET,
        format: Format::Lzh,
    },
];

/// Identifies a format from an in-memory header.
///
/// Returns `None` for buffers shorter than two bytes and for headers that
/// match no signature.
///
/// # Examples
///
/// ```
/// use unnest_core::Format;
/// use unnest_core::formats::detect::detect_format_bytes;
///
/// assert_eq!(detect_format_bytes(b"PK\x03\x04rest"), Some(Format::Zip));
/// assert_eq!(detect_format_bytes(b"plain text"), None);
/// ```
#[must_use]
pub fn detect_format_bytes(header: &[u8]) -> Option<Format> {
    if header.len() < MIN_CLASSIFIABLE_LEN {
        return None;
    }
    SIGNATURES
        .iter()
        .find(|sig| sig.matches(header))
        .map(|sig| sig.format)
}

/// Identifies the real format of a file from its first 512 bytes.
///
/// Unreadable files are reported as unidentified rather than as errors; the
/// caller treats both the same way.
#[must_use]
pub fn detect_format(path: &Path) -> Option<Format> {
    let header = read_header(path).ok()?;
    let format = detect_format_bytes(&header);
    tracing::trace!(path = %path.display(), ?format, "signature check");
    format
}

/// Checks whether a file carries an archive signature its extension does not
/// account for.
///
/// Returns the detected format when the file is disguised. A `.tif` holding
/// ZIP bytes is disguised; a `.zip` holding ZIP bytes is not, and neither is
/// a `.tif` holding TIFF bytes.
#[must_use]
pub fn is_disguised(path: &Path) -> Option<Format> {
    let detected = detect_format(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if expected_formats(ext).contains(&detected) {
        return None;
    }
    Some(detected)
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_WINDOW);
    file.take(HEADER_WINDOW as u64).read_to_end(&mut header)?;
    Ok(header)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_detect_each_zero_offset_signature() {
        let cases: [(&[u8], Format); 11] = [
            (SEVENZ_MAGIC, Format::SevenZip),
            (RAR5_MAGIC, Format::Rar),
            (RAR4_MAGIC, Format::Rar),
            (ZIP_LOCAL_MAGIC, Format::Zip),
            (ZIP_EMPTY_MAGIC, Format::Zip),
            (ZIP_SPANNED_MAGIC, Format::Zip),
            (GZIP_MAGIC, Format::GZip),
            (BZIP2_MAGIC, Format::BZip2),
            (XZ_MAGIC, Format::Xz),
            (CAB_MAGIC, Format::Cab),
            (ARJ_MAGIC, Format::Arj),
        ];
        for (magic, expected) in cases {
            let mut header = magic.to_vec();
            header.extend_from_slice(&[0u8; 16]);
            assert_eq!(detect_format_bytes(&header), Some(expected), "{expected}");
        }
    }

    #[test]
    fn test_detect_tar_at_offset_257() {
        let mut header = vec![0u8; 512];
        header[257..262].copy_from_slice(b"ustar");
        assert_eq!(detect_format_bytes(&header), Some(Format::Tar));
    }

    #[test]
    fn test_detect_lzh_at_offset_2() {
        assert_eq!(detect_format_bytes(b"\x22\x1a-lh5-rest"), Some(Format::Lzh));
    }

    #[test]
    fn test_truncated_tar_header_not_detected() {
        let header = vec![0u8; 260];
        assert_eq!(detect_format_bytes(&header), None);
    }

    #[test]
    fn test_short_files_never_classified() {
        assert_eq!(detect_format_bytes(&[]), None);
        assert_eq!(detect_format_bytes(&[0x1F]), None);
        assert_eq!(detect_format_bytes(&[0x1F, 0x8B]), Some(Format::GZip));
    }

    #[test]
    fn test_iso_not_matched() {
        let mut image = vec![0u8; 512];
        image[1..6].copy_from_slice(b"CD001");
        assert_eq!(detect_format_bytes(&image), None);
    }

    #[test]
    fn test_detect_format_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "photo.tif", b"PK\x03\x04zipdata");
        assert_eq!(detect_format(&path), Some(Format::Zip));
    }

    #[test]
    fn test_detect_format_missing_file() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_format(&temp.path().join("absent.bin")), None);
    }

    #[test]
    fn test_disguised_zip_behind_tif() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "photo.tif", b"PK\x03\x04zipdata");
        assert_eq!(is_disguised(&path), Some(Format::Zip));
    }

    #[test]
    fn test_zip_named_zip_is_not_disguised() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "bundle.ZIP", b"PK\x03\x04zipdata");
        assert_eq!(is_disguised(&path), None);
    }

    #[test]
    fn test_plain_file_is_not_disguised() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "photo.tif", b"II*\x00tiffdata");
        assert_eq!(is_disguised(&path), None);
    }

    #[test]
    fn test_gzip_named_tgz_is_not_disguised() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "src.tgz", &[0x1F, 0x8B, 0x08, 0x00]);
        assert_eq!(is_disguised(&path), None);
    }
}

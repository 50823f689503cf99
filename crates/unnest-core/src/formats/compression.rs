//! Single-stream compression codecs.
//!
//! Gzip, bzip2 and xz wrap exactly one payload with no name or directory
//! structure of their own. Decoding yields a single file named after the
//! compressed one, with the codec extension removed:
//!
//! | input | output |
//! |-------|--------|
//! | `data.tar.gz` | `data.tar` |
//! | `data.tgz` | `data.tar` |
//! | `notes.txt.bz2` | `notes.txt` |
//! | `photo.jpg` (forced as xz) | `photo` |
//!
//! A `.tar` produced this way is unpacked on the next recursion level.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use xz2::read::XzDecoder;

use super::Format;
use super::OpenedArchive;
use super::common;
use super::detect::detect_format_bytes;
use crate::Result;
use crate::io::ProgressReader;

/// Compression codec of a single-stream file.
///
/// # Examples
///
/// ```
/// use unnest_core::Format;
/// use unnest_core::formats::compression::StreamCodec;
///
/// assert_eq!(StreamCodec::from_format(Format::GZip), Some(StreamCodec::Gzip));
/// assert_eq!(StreamCodec::from_format(Format::Zip), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamCodec {
    /// Gzip (deflate), including concatenated members.
    Gzip,
    /// Bzip2, including concatenated streams.
    Bzip2,
    /// XZ (LZMA2), including concatenated streams.
    Xz,
}

impl StreamCodec {
    /// Returns the codec for a stream format.
    #[must_use]
    pub const fn from_format(format: Format) -> Option<Self> {
        match format {
            Format::GZip => Some(Self::Gzip),
            Format::BZip2 => Some(Self::Bzip2),
            Format::Xz => Some(Self::Xz),
            _ => None,
        }
    }

    /// Returns the corresponding [`Format`].
    #[must_use]
    pub const fn format(self) -> Format {
        match self {
            Self::Gzip => Format::GZip,
            Self::Bzip2 => Format::BZip2,
            Self::Xz => Format::Xz,
        }
    }

    /// Wraps `reader` in this codec's decoder.
    pub fn decoder<'r, R: Read + 'r>(self, reader: R) -> Box<dyn Read + 'r> {
        match self {
            Self::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Self::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
            Self::Xz => Box::new(XzDecoder::new_multi_decoder(reader)),
        }
    }
}

/// Returns the name of the file a compressed stream decodes to.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unnest_core::formats::compression::decoded_name;
///
/// assert_eq!(decoded_name(Path::new("a/data.tar.gz")), "data.tar");
/// assert_eq!(decoded_name(Path::new("data.TGZ")), "data.tar");
/// assert_eq!(decoded_name(Path::new("notes.bz2")), "notes");
/// ```
#[must_use]
pub fn decoded_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if stem.is_empty() {
        return "data".to_owned();
    }
    match ext.as_str() {
        "tgz" | "tbz" | "tbz2" | "txz" => format!("{stem}.tar"),
        _ => stem,
    }
}

/// Single-stream file opened as a particular codec.
///
/// The password is ignored; none of these codecs carry encryption.
pub struct StreamHandler {
    codec: StreamCodec,
    path: PathBuf,
    size: u64,
}

impl StreamHandler {
    /// Checks that `path` starts with the codec's magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::FormatMismatch`] when the signature is
    /// absent, so that forcing a codec onto arbitrary data fails early.
    ///
    /// [`ExtractionError::FormatMismatch`]: crate::ExtractionError::FormatMismatch
    pub fn open(path: &Path, codec: StreamCodec) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        let mut header = Vec::with_capacity(16);
        File::open(path)?.take(16).read_to_end(&mut header)?;
        if detect_format_bytes(&header) != Some(codec.format()) {
            return Err(common::mismatch(
                codec.format(),
                "stream signature not found",
            ));
        }
        Ok(Self {
            codec,
            path: path.to_path_buf(),
            size,
        })
    }

    fn reader(&self) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}

impl OpenedArchive for StreamHandler {
    fn check_integrity(&mut self) -> Result<bool> {
        let outcome = (|| -> Result<()> {
            let mut decoder = self.codec.decoder(self.reader()?);
            std::io::copy(&mut decoder, &mut std::io::sink()).map_err(common::decode_error)?;
            Ok(())
        })();
        common::integrity_verdict(self.codec.format(), outcome)
    }

    fn extract_all(&mut self, dest: &Path, progress: &mut dyn FnMut(u8)) -> Result<()> {
        let name = decoded_name(&self.path);
        {
            let counted = ProgressReader::new(self.reader()?, self.size, &mut *progress);
            let mut decoder = self.codec.decoder(counted);
            common::write_entry(&mut decoder, dest, Path::new(&name))?;
        }
        progress(100);
        Ok(())
    }

    fn format(&self) -> Format {
        self.codec.format()
    }
}

//! Built-in decoding backend.

use std::path::Path;

use super::ArchiveBackend;
use super::Format;
use super::OpenedArchive;
use super::compression::StreamCodec;
use super::compression::StreamHandler;
use super::detect::detect_format;
use super::sevenz::SevenZHandler;
use super::tar::TarHandler;
use super::zip::ZipHandler;
use crate::ExtractionError;
use crate::Result;

/// Pure-Rust backend covering ZIP, 7z, tar, gzip, bzip2 and xz.
///
/// RAR, CAB, ISO, ARJ and LZH are recognised but have no decoder here;
/// opening them yields [`ExtractionError::UnsupportedFormat`], which sends
/// the strategy selector on to the external archiver.
///
/// Without a forced format the extension decides, and the file signature
/// is consulted only when the extension says nothing (`.001`, `.dat`, no
/// extension).
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl NativeBackend {
    /// Creates the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn resolve(path: &Path, forced: Option<Format>) -> Format {
        forced
            .or_else(|| Format::from_path(path))
            .or_else(|| detect_format(path))
            .unwrap_or(Format::Unknown)
    }
}

impl ArchiveBackend for NativeBackend {
    fn open(
        &self,
        path: &Path,
        password: &str,
        forced: Option<Format>,
    ) -> Result<Box<dyn OpenedArchive>> {
        let format = Self::resolve(path, forced);
        tracing::trace!(path = %path.display(), %format, forced = forced.is_some(), "opening");

        if let Some(codec) = StreamCodec::from_format(format) {
            return Ok(Box::new(StreamHandler::open(path, codec)?));
        }
        match format {
            Format::Zip => Ok(Box::new(ZipHandler::open(path, password)?)),
            Format::SevenZip => Ok(Box::new(SevenZHandler::open(path, password)?)),
            Format::Tar => Ok(Box::new(TarHandler::open(path)?)),
            other => Err(ExtractionError::UnsupportedFormat(other)),
        }
    }

    fn name(&self) -> &str {
        "native"
    }
}

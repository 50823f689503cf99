//! Uncompressed tar decoding.
//!
//! Tar carries no encryption, so the password is ignored. Compressed
//! tarballs (`.tar.gz`, `.tgz`) are first decoded by the stream handlers in
//! [`compression`](super::compression) and the resulting `.tar` is picked up
//! again on the next recursion level.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use tar::Archive;
use tar::EntryType;

use super::Format;
use super::OpenedArchive;
use super::common;
use crate::Result;
use crate::io::ProgressReader;

/// Tar archive bound to a file on disk.
///
/// Each pass reopens the file, since tar is a forward-only stream.
pub struct TarHandler {
    path: PathBuf,
    size: u64,
}

impl TarHandler {
    /// Prepares `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be inspected.
    pub fn open(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            size,
        })
    }

    fn reader(&self) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}

impl OpenedArchive for TarHandler {
    fn check_integrity(&mut self) -> Result<bool> {
        let outcome = (|| -> Result<()> {
            let mut archive = Archive::new(self.reader()?);
            for entry in archive.entries().map_err(common::decode_error)? {
                let mut entry = entry.map_err(common::decode_error)?;
                std::io::copy(&mut entry, &mut std::io::sink()).map_err(common::decode_error)?;
            }
            Ok(())
        })();
        common::integrity_verdict(Format::Tar, outcome)
    }

    fn extract_all(&mut self, dest: &Path, progress: &mut dyn FnMut(u8)) -> Result<()> {
        {
            let counted = ProgressReader::new(self.reader()?, self.size, &mut *progress);
            let mut archive = Archive::new(counted);
            for entry in archive.entries().map_err(common::decode_error)? {
                let mut entry = entry.map_err(common::decode_error)?;
                let raw = entry.path().map_err(common::decode_error)?.into_owned();
                let Some(relative) = common::sanitize_entry_path(&raw.to_string_lossy()) else {
                    tracing::warn!(entry = %raw.display(), "skipping tar entry with unusable name");
                    continue;
                };

                match entry.header().entry_type() {
                    EntryType::Directory => common::create_entry_dir(dest, &relative)?,
                    EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
                        common::write_entry(&mut entry, dest, &relative)?;
                    }
                    other => {
                        tracing::debug!(
                            entry = %relative.display(),
                            kind = ?other,
                            "skipping non-file tar entry"
                        );
                    }
                }
            }
        }
        // The end-of-archive padding is never read.
        progress(100);
        Ok(())
    }

    fn format(&self) -> Format {
        Format::Tar
    }
}

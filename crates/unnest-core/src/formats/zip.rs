//! ZIP decoding with optional `ZipCrypto`/AES passwords.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use super::Format;
use super::OpenedArchive;
use super::common;
use crate::ExtractionError;
use crate::Result;
use crate::io::percent;

/// ZIP archive opened with one candidate password.
///
/// Unencrypted entries are read normally; the password only applies to
/// entries flagged as encrypted.
pub struct ZipHandler {
    archive: ZipArchive<BufReader<File>>,
    password: Vec<u8>,
}

impl ZipHandler {
    /// Parses the central directory of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::FormatMismatch`] if the file is not a ZIP
    /// archive.
    pub fn open(path: &Path, password: &str) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| match e {
            ZipError::Io(io) => common::decode_error(io),
            other => common::mismatch(Format::Zip, other),
        })?;
        Ok(Self {
            archive,
            password: password.as_bytes().to_vec(),
        })
    }

    /// Returns `true` if entry `index` is flagged as encrypted.
    fn is_encrypted(&mut self, index: usize) -> Result<bool> {
        Ok(self
            .archive
            .by_index_raw(index)
            .map_err(map_zip_error)?
            .encrypted())
    }

    /// Decodes every file entry into a sink.
    fn verify(&mut self) -> Result<()> {
        for i in 0..self.archive.len() {
            let encrypted = self.is_encrypted(i)?;
            let mut entry = if encrypted {
                self.archive.by_index_decrypt(i, &self.password)
            } else {
                self.archive.by_index(i)
            }
            .map_err(map_zip_error)?;
            if !entry.is_dir() {
                std::io::copy(&mut entry, &mut std::io::sink()).map_err(common::decode_error)?;
            }
        }
        Ok(())
    }
}

impl OpenedArchive for ZipHandler {
    fn check_integrity(&mut self) -> Result<bool> {
        let outcome = self.verify();
        common::integrity_verdict(Format::Zip, outcome)
    }

    fn extract_all(&mut self, dest: &Path, progress: &mut dyn FnMut(u8)) -> Result<()> {
        let total = self.archive.len() as u64;
        for i in 0..self.archive.len() {
            let encrypted = self.is_encrypted(i)?;
            let mut entry = if encrypted {
                self.archive.by_index_decrypt(i, &self.password)
            } else {
                self.archive.by_index(i)
            }
            .map_err(map_zip_error)?;

            let relative = entry
                .enclosed_name()
                .and_then(|p| common::sanitize_entry_path(&p.to_string_lossy()));
            match relative {
                None => {
                    tracing::warn!(name = entry.name(), "skipping ZIP entry with unusable name");
                }
                Some(relative) if entry.is_dir() => common::create_entry_dir(dest, &relative)?,
                Some(relative) if entry.is_symlink() => {
                    tracing::debug!(entry = %relative.display(), "skipping symlink entry");
                }
                Some(relative) => {
                    common::write_entry(&mut entry, dest, &relative)?;
                }
            }
            progress(percent(i as u64 + 1, total));
        }
        Ok(())
    }

    fn format(&self) -> Format {
        Format::Zip
    }
}

/// Maps a read-time ZIP error.
///
/// A wrong key surfaces as `InvalidPassword`, a password-required
/// `UnsupportedArchive` or a checksum failure depending on the encryption
/// method. All of them are recoverable.
fn map_zip_error(err: ZipError) -> ExtractionError {
    match err {
        ZipError::Io(io) => common::decode_error(io),
        other => ExtractionError::WrongPasswordOrCorrupt {
            reason: other.to_string(),
        },
    }
}

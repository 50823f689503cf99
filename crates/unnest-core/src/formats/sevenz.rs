//! 7z decoding with AES-256 passwords.
//!
//! Headers are parsed once at open time so that a file which is not 7z at
//! all fails fast as a format mismatch. Each pass then reopens the file
//! with a fresh [`ArchiveReader`], since the reader consumes its blocks.
//!
//! With encrypted headers a wrong key already fails at open time; with
//! plain headers it only shows up once block data is decoded. Both cases
//! surface as [`ExtractionError::WrongPasswordOrCorrupt`].

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use sevenz_rust2::ArchiveEntry;
use sevenz_rust2::ArchiveReader;
use sevenz_rust2::Password;

use super::Format;
use super::OpenedArchive;
use super::common;
use crate::ExtractionError;
use crate::Result;
use crate::io::percent;

/// 7z archive opened with one candidate password.
pub struct SevenZHandler {
    path: PathBuf,
    password: String,
    file_count: usize,
}

impl SevenZHandler {
    /// Parses the archive headers of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::FormatMismatch`] if the file is not 7z and
    /// [`ExtractionError::WrongPasswordOrCorrupt`] if encrypted headers
    /// reject the password.
    pub fn open(path: &Path, password: &str) -> Result<Self> {
        let reader = Self::reader(path, password)?;
        let file_count = reader.archive().files.len();
        Ok(Self {
            path: path.to_path_buf(),
            password: password.to_owned(),
            file_count,
        })
    }

    fn reader(path: &Path, password: &str) -> Result<ArchiveReader<BufReader<File>>> {
        let file = File::open(path)?;
        ArchiveReader::new(BufReader::new(file), Password::from(password))
            .map_err(|e| map_open_error(&e))
    }

    /// Decodes every entry and hands it to `sink`.
    ///
    /// Errors raised by `sink` are kept intact; decoder errors are mapped
    /// to the recoverable variants.
    fn each_file(
        &self,
        mut sink: impl FnMut(&ArchiveEntry, &mut dyn Read) -> Result<()>,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        let mut reader = Self::reader(&self.path, &self.password)?;
        let total = self.file_count as u64;
        let mut seen = 0u64;
        let mut failure: Option<ExtractionError> = None;

        let outcome = reader.for_each_entries(|entry, data| {
            if let Err(err) = sink(entry, data) {
                let message = err.to_string();
                failure = Some(err);
                return Err(sevenz_rust2::Error::Other(message.into()));
            }
            seen += 1;
            progress(percent(seen, total));
            Ok(true)
        });

        match (failure, outcome) {
            (Some(err), _) => Err(err),
            (None, Err(err)) => Err(ExtractionError::WrongPasswordOrCorrupt {
                reason: err.to_string(),
            }),
            (None, Ok(())) => Ok(()),
        }
    }
}

impl OpenedArchive for SevenZHandler {
    fn check_integrity(&mut self) -> Result<bool> {
        let outcome = self.each_file(
            |entry, data| {
                if !entry.is_directory() {
                    std::io::copy(data, &mut std::io::sink()).map_err(common::decode_error)?;
                }
                Ok(())
            },
            &mut |_| {},
        );
        common::integrity_verdict(Format::SevenZip, outcome)
    }

    fn extract_all(&mut self, dest: &Path, progress: &mut dyn FnMut(u8)) -> Result<()> {
        self.each_file(
            |entry, data| {
                let Some(relative) = common::sanitize_entry_path(&entry.name) else {
                    tracing::warn!(name = %entry.name, "skipping 7z entry with unusable name");
                    // Drain so the solid block stays in sync.
                    std::io::copy(data, &mut std::io::sink()).map_err(common::decode_error)?;
                    return Ok(());
                };
                if entry.is_directory() {
                    common::create_entry_dir(dest, &relative)
                } else {
                    common::write_entry(data, dest, &relative).map(|_| ())
                }
            },
            progress,
        )?;
        // Archives holding only empty directories never tick.
        progress(100);
        Ok(())
    }

    fn format(&self) -> Format {
        Format::SevenZip
    }
}

fn map_open_error(err: &sevenz_rust2::Error) -> ExtractionError {
    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        ExtractionError::WrongPasswordOrCorrupt { reason: message }
    } else {
        common::mismatch(Format::SevenZip, message)
    }
}

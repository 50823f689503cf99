//! Test utilities for building archives in memory.
//!
//! Shared by the unit tests, the integration tests and the CLI tests.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

use crate::ArchiveBackend;
use crate::ExtractionError;
use crate::Format;
use crate::OpenedArchive;
use crate::Result;

/// Creates an in-memory ZIP archive from `(path, content)` pairs.
///
/// Entries are stored uncompressed.
///
/// # Examples
///
/// ```
/// use unnest_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(&[("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// assert_eq!(&zip_data[..2], b"PK");
/// ```
#[must_use]
pub fn create_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (path, data) in entries {
        zip.start_file(*path, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Creates a single-entry ZIP archive encrypted with AES-256.
#[must_use]
pub fn create_encrypted_zip(name: &str, data: &[u8], password: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .with_aes_encryption(zip::AesMode::Aes256, password);

    zip.start_file(name, options).unwrap();
    zip.write_all(data).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Creates a ZIP archive nested `levels` deep.
///
/// Level 1 is a ZIP holding `leaf`; level `n` is a ZIP holding
/// `level{n-1}.zip`.
///
/// # Examples
///
/// ```
/// use unnest_core::test_utils::create_nested_zip;
///
/// let outer = create_nested_zip(3, ("deep.txt", b"bottom"));
/// assert!(!outer.is_empty());
/// ```
#[must_use]
pub fn create_nested_zip(levels: usize, leaf: (&str, &[u8])) -> Vec<u8> {
    let mut current = create_test_zip(&[leaf]);
    for level in 2..=levels {
        let inner_name = format!("level{}.zip", level - 1);
        current = create_test_zip(&[(inner_name.as_str(), current.as_slice())]);
    }
    current
}

/// Creates an in-memory TAR archive from `(path, content)` pairs.
///
/// Files are created with mode 0o644.
#[must_use]
pub fn create_test_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut ar = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        ar.append_data(&mut header, path, *data).unwrap();
    }
    ar.into_inner().unwrap()
}

/// Gzip-compresses `data`.
#[must_use]
pub fn create_test_gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// In-memory backend that accepts exactly one format and one password.
///
/// Without a forced format the format is taken from the file extension.
/// Every `open` call is recorded as `(forced, password)`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unnest_core::ArchiveBackend;
/// use unnest_core::Format;
/// use unnest_core::test_utils::ScriptedBackend;
///
/// let backend = ScriptedBackend::new(Format::Zip, "pw", &[("a.txt", b"a")]);
/// let mut archive = backend.open(Path::new("x.zip"), "nope", None).unwrap();
/// assert!(!archive.check_integrity().unwrap());
/// assert!(backend.open(Path::new("x.rar"), "pw", None).is_err());
/// ```
#[derive(Debug)]
pub struct ScriptedBackend {
    format: Format,
    password: String,
    files: Vec<(String, Vec<u8>)>,
    opens: Mutex<Vec<(Option<Format>, String)>>,
}

impl ScriptedBackend {
    /// Creates a backend decoding `format` with `password` into `files`.
    #[must_use]
    pub fn new(format: Format, password: &str, files: &[(&str, &[u8])]) -> Self {
        Self {
            format,
            password: password.to_owned(),
            files: files
                .iter()
                .map(|(name, data)| ((*name).to_owned(), data.to_vec()))
                .collect(),
            opens: Mutex::new(Vec::new()),
        }
    }

    /// Returns the recorded `open` calls.
    #[must_use]
    pub fn opens(&self) -> Vec<(Option<Format>, String)> {
        self.opens.lock().unwrap().clone()
    }
}

impl ArchiveBackend for ScriptedBackend {
    fn open(
        &self,
        path: &Path,
        password: &str,
        forced: Option<Format>,
    ) -> Result<Box<dyn OpenedArchive>> {
        self.opens
            .lock()
            .unwrap()
            .push((forced, password.to_owned()));

        let format = forced
            .or_else(|| Format::from_path(path))
            .unwrap_or(Format::Unknown);
        if format != self.format {
            return Err(ExtractionError::FormatMismatch {
                format,
                reason: "scripted mismatch".into(),
            });
        }
        Ok(Box::new(ScriptedArchive {
            format,
            unlocked: password == self.password,
            files: self.files.clone(),
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedArchive {
    format: Format,
    unlocked: bool,
    files: Vec<(String, Vec<u8>)>,
}

impl OpenedArchive for ScriptedArchive {
    fn check_integrity(&mut self) -> Result<bool> {
        Ok(self.unlocked)
    }

    fn extract_all(&mut self, dest: &Path, progress: &mut dyn FnMut(u8)) -> Result<()> {
        if !self.unlocked {
            return Err(ExtractionError::WrongPasswordOrCorrupt {
                reason: "scripted wrong password".into(),
            });
        }
        for (name, data) in &self.files {
            let target = dest.join(name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, data)?;
        }
        progress(100);
        Ok(())
    }

    fn format(&self) -> Format {
        self.format
    }
}

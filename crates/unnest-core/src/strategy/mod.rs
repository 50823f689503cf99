//! Choosing how to open one archive.
//!
//! Three tiers are tried in order until one produces content:
//!
//! 1. **Typed**: the format implied by the extension (or the caller's
//!    forced format), once per password.
//! 2. **Brute force**: for files whose extension is configured as
//!    possibly disguised, every format in [`Format::BRUTE_FORCE_ORDER`] is
//!    forced in turn, each with the full password sequence.
//! 3. **External**: the configured archiver program, once per password.
//!
//! Tiers 1 and 2 run on a scoped worker thread. The calling thread relays
//! the worker's narration and progress to the session's reporter in the
//! order they were produced.

pub mod external;

use std::path::Path;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::Sender;

use tracing::Level;

use crate::ArchiveBackend;
use crate::ExtractionError;
use crate::Format;
use crate::PasswordSequencer;
use crate::Result;
use crate::Settings;
use crate::formats::common::count_files;
use crate::io::Scratch;
use crate::report::Narrator;
use external::ExternalArchiver;

/// Tier that produced an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Extension-implied or caller-forced format.
    Typed,
    /// Format found by forcing each candidate in turn.
    BruteForce,
    /// External archiver program.
    External,
}

/// A successful extraction.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Scratch directory holding the content.
    pub dir: PathBuf,
    /// Format the archive was decoded as (`None` for the external tier).
    pub format: Option<Format>,
    /// Tier that succeeded.
    pub tier: Tier,
}

/// Shortens a password for debug logs: `(empty)`, `**`, or the first two
/// characters followed by up to four stars.
///
/// # Examples
///
/// ```
/// use unnest_core::strategy::mask_password;
///
/// assert_eq!(mask_password(""), "(empty)");
/// assert_eq!(mask_password("ab"), "**");
/// assert_eq!(mask_password("secret-password"), "se****");
/// ```
#[must_use]
pub fn mask_password(password: &str) -> String {
    let len = password.chars().count();
    match len {
        0 => "(empty)".to_owned(),
        1 | 2 => "**".to_owned(),
        _ => {
            let head: String = password.chars().take(2).collect();
            format!("{head}{}", "*".repeat((len - 2).min(4)))
        }
    }
}

fn attempting_line(password: &str) -> String {
    if password.is_empty() {
        "Attempting: (No Password)".to_owned()
    } else {
        format!("Attempting password: {password}")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Runs the tiers for one archive.
pub struct StrategySelector<'a> {
    backend: &'a dyn ArchiveBackend,
    settings: &'a Settings,
    scratch: &'a Scratch,
}

impl<'a> StrategySelector<'a> {
    /// Creates a selector extracting into subdirectories of `scratch`.
    #[must_use]
    pub fn new(
        backend: &'a dyn ArchiveBackend,
        settings: &'a Settings,
        scratch: &'a Scratch,
    ) -> Self {
        Self {
            backend,
            settings,
            scratch,
        }
    }

    /// Extracts `path`, returning where the content landed.
    ///
    /// `Ok(None)` means every tier and password failed; that is an
    /// ordinary outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only when the scratch workspace itself fails.
    pub fn extract(
        &self,
        path: &Path,
        forced: Option<Format>,
        narrator: &mut Narrator<'_>,
    ) -> Result<Option<Extracted>> {
        let passwords = PasswordSequencer::new(self.settings).sequence(path);

        if let Some(found) = self.run_in_process(path, forced, &passwords, narrator)? {
            return Ok(Some(found));
        }
        if !self.settings.extended_engine {
            return Ok(None);
        }
        Ok(self
            .run_external(path, &passwords, narrator)?
            .map(|dir| Extracted {
                dir,
                format: None,
                tier: Tier::External,
            }))
    }

    /// Tiers 1 and 2 on a worker thread.
    fn run_in_process(
        &self,
        path: &Path,
        forced: Option<Format>,
        passwords: &[String],
        narrator: &mut Narrator<'_>,
    ) -> Result<Option<Extracted>> {
        let (events, inbox) = mpsc::channel();
        let attempts = Attempts {
            backend: self.backend,
            settings: self.settings,
            scratch: self.scratch,
            events,
        };

        std::thread::scope(|scope| {
            let worker = scope.spawn(move || attempts.run(path, forced, passwords));

            // Ends once the worker drops its sender.
            for event in inbox {
                match event {
                    WorkerEvent::Log(level, text) => narrator.say(level, &text),
                    WorkerEvent::Progress(pct) => narrator.progress(pct),
                }
            }

            worker.join().unwrap_or_else(|_| {
                Err(ExtractionError::Io(std::io::Error::other(
                    "extraction worker panicked",
                )))
            })
        })
    }

    /// Tier 3.
    fn run_external(
        &self,
        path: &Path,
        passwords: &[String],
        narrator: &mut Narrator<'_>,
    ) -> Result<Option<PathBuf>> {
        let archiver = ExternalArchiver::new(&self.settings.archiver);
        narrator.info(&format!(
            "Falling back to {} CLI for {}...",
            archiver.name(),
            file_name(path)
        ));

        for password in passwords {
            let dir = self.scratch.allocate()?;
            tracing::debug!(
                archiver = %archiver.name(),
                password = %mask_password(password),
                "running external archiver"
            );
            match archiver.extract(path, &dir, password) {
                Ok(()) if count_files(&dir) > 0 => {
                    narrator.info(&if password.is_empty() {
                        "CLI extraction succeeded (No Password)".to_owned()
                    } else {
                        format!("CLI extraction succeeded with password: {password}")
                    });
                    return Ok(Some(dir));
                }
                Ok(()) => {
                    tracing::debug!("external archiver succeeded but produced no files");
                    Scratch::discard(&dir);
                }
                Err(ExtractionError::Io(err)) => {
                    Scratch::discard(&dir);
                    narrator.warn(&format!("Could not run {}: {err}", archiver.name()));
                    break;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "external archiver failed");
                    Scratch::discard(&dir);
                }
            }
        }
        tracing::debug!("external fallback exhausted");
        Ok(None)
    }
}

/// Message from the attempt worker to the session thread.
enum WorkerEvent {
    Log(Level, String),
    Progress(u8),
}

/// Result of a single password/format attempt.
enum Attempt {
    Extracted(PathBuf, Format),
    Failed,
    /// The backend cannot decode this format at all.
    Unsupported,
}

/// Tier 1 and 2 state owned by the worker thread.
struct Attempts<'a> {
    backend: &'a dyn ArchiveBackend,
    settings: &'a Settings,
    scratch: &'a Scratch,
    events: Sender<WorkerEvent>,
}

impl Attempts<'_> {
    fn log(&self, level: Level, text: String) {
        let _ = self.events.send(WorkerEvent::Log(level, text));
    }

    fn run(
        &self,
        path: &Path,
        forced: Option<Format>,
        passwords: &[String],
    ) -> Result<Option<Extracted>> {
        if let Some((dir, format)) = self.try_passwords(path, forced, passwords)? {
            return Ok(Some(Extracted {
                dir,
                format: Some(format),
                tier: Tier::Typed,
            }));
        }

        let eligible = self.settings.extended_engine
            && forced.is_none()
            && self.settings.allows_brute_force(path);
        if !eligible {
            return Ok(None);
        }

        self.log(
            Level::INFO,
            format!("Trying brute-force format detection for {}...", file_name(path)),
        );
        for candidate in Format::BRUTE_FORCE_ORDER {
            tracing::debug!(format = %candidate, "brute-force candidate");
            if let Some((dir, format)) = self.try_passwords(path, Some(candidate), passwords)? {
                self.log(
                    Level::INFO,
                    format!("Detected as {candidate} via brute-force"),
                );
                return Ok(Some(Extracted {
                    dir,
                    format: Some(format),
                    tier: Tier::BruteForce,
                }));
            }
        }
        Ok(None)
    }

    fn try_passwords(
        &self,
        path: &Path,
        forced: Option<Format>,
        passwords: &[String],
    ) -> Result<Option<(PathBuf, Format)>> {
        for (index, password) in passwords.iter().enumerate() {
            match self.attempt(path, password, forced)? {
                Attempt::Extracted(dir, format) => {
                    tracing::debug!(
                        attempt = index + 1,
                        of = passwords.len(),
                        password = %mask_password(password),
                        %format,
                        "extraction succeeded"
                    );
                    return Ok(Some((dir, format)));
                }
                Attempt::Failed => {}
                Attempt::Unsupported => {
                    tracing::debug!(
                        forced = ?forced,
                        "format not supported by backend, skipping remaining passwords"
                    );
                    break;
                }
            }
        }
        Ok(None)
    }

    fn attempt(&self, path: &Path, password: &str, forced: Option<Format>) -> Result<Attempt> {
        let dir = self.scratch.allocate()?;
        match self.attempt_into(&dir, path, password, forced) {
            Ok(format) => Ok(Attempt::Extracted(dir, format)),
            Err(err) => {
                Scratch::discard(&dir);
                match err {
                    ExtractionError::UnsupportedFormat(_) => Ok(Attempt::Unsupported),
                    err if err.is_recoverable() => {
                        tracing::debug!(
                            password = %mask_password(password),
                            error = %err,
                            "attempt failed"
                        );
                        Ok(Attempt::Failed)
                    }
                    err => {
                        self.log(Level::WARN, format!("Error: {err}"));
                        Ok(Attempt::Failed)
                    }
                }
            }
        }
    }

    /// One attempt: open, verify (unless forced), extract.
    fn attempt_into(
        &self,
        dir: &Path,
        path: &Path,
        password: &str,
        forced: Option<Format>,
    ) -> Result<Format> {
        let mut archive = self.backend.open(path, password, forced)?;

        if forced.is_none() && !archive.check_integrity()? {
            return Err(ExtractionError::WrongPasswordOrCorrupt {
                reason: "integrity check failed".into(),
            });
        }
        self.log(Level::INFO, attempting_line(password));

        let report_progress = self.settings.extended_engine;
        let events = &self.events;
        archive.extract_all(dir, &mut |pct| {
            if report_progress {
                let _ = events.send(WorkerEvent::Progress(pct));
            }
        })?;

        if forced.is_some() && count_files(dir) == 0 {
            return Err(ExtractionError::FormatMismatch {
                format: archive.format(),
                reason: "no files produced".into(),
            });
        }
        Ok(archive.format())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::MemoryReporter;
    use crate::NativeBackend;
    use crate::test_utils::ScriptedBackend;
    use crate::test_utils::create_encrypted_zip;
    use crate::test_utils::create_test_zip;
    use std::fs;
    use tempfile::TempDir;

    fn hermetic() -> Settings {
        Settings::default().with_archiver("unnest-test-no-such-archiver")
    }

    #[test]
    fn test_typed_tier_with_password_list() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("locked.zip");
        fs::write(&path, create_encrypted_zip("a.txt", b"hidden", "hunter2")).unwrap();

        let settings = hermetic().with_passwords(["wrong", "hunter2"]);
        let scratch = Scratch::new().unwrap();
        let backend = NativeBackend::new();
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap()
            .unwrap();

        assert_eq!(found.tier, Tier::Typed);
        assert_eq!(found.format, Some(Format::Zip));
        assert_eq!(fs::read(found.dir.join("a.txt")).unwrap(), b"hidden");
        assert!(reporter.contains("Attempting password: hunter2"));
        assert!(!reporter.contains("Attempting password: wrong"));
    }

    #[test]
    fn test_exhaustion_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("locked.zip");
        fs::write(&path, create_encrypted_zip("a.txt", b"hidden", "unknown")).unwrap();

        let settings = hermetic();
        let scratch = Scratch::new().unwrap();
        let backend = NativeBackend::new();
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap();

        assert!(found.is_none());
        assert!(reporter.contains("Falling back to unnest-test-no-such-archiver CLI"));
        assert!(reporter.contains("Could not run"));
        // Only the empty-directory attempt dirs may remain, and they were discarded.
        assert_eq!(count_files(scratch.path()), 0);
    }

    #[test]
    fn test_brute_force_after_typed_tier_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("holiday.mp4");
        fs::write(&path, b"opaque").unwrap();

        let settings = hermetic().with_detect_disguised(true);
        let scratch = Scratch::new().unwrap();
        let backend = ScriptedBackend::new(Format::Tar, "", &[("inside.txt", b"x")]);
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap()
            .unwrap();

        assert_eq!(found.tier, Tier::BruteForce);
        assert_eq!(found.format, Some(Format::Tar));
        assert!(found.dir.join("inside.txt").exists());
        assert!(reporter.contains("Trying brute-force format detection for holiday.mp4..."));
        assert!(reporter.contains("Detected as TAR via brute-force"));

        // Typed tier with both passwords, then Rar, 7z and Zip with both,
        // then Tar succeeding on the first.
        let opens = backend.opens();
        assert_eq!(opens.len(), 2 + 3 * 2 + 1);
        assert_eq!(opens[0], (None, String::new()));
        assert_eq!(opens[1], (None, "holiday".to_owned()));
        assert_eq!(opens.last().unwrap().0, Some(Format::Tar));
    }

    #[test]
    fn test_forced_format_skips_brute_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("holiday.mp4");
        fs::write(&path, b"opaque").unwrap();

        let settings = hermetic().with_detect_disguised(true);
        let scratch = Scratch::new().unwrap();
        let backend = ScriptedBackend::new(Format::Tar, "", &[("inside.txt", b"x")]);
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, Some(Format::Zip), &mut Narrator::new(&mut reporter))
            .unwrap();

        assert!(found.is_none());
        assert!(backend.opens().iter().all(|(forced, _)| *forced == Some(Format::Zip)));
        assert!(!reporter.contains("brute-force"));
    }

    #[test]
    fn test_forced_extract_logs_attempt_before_extracting() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.tif");
        fs::write(&path, b"opaque").unwrap();

        let settings = hermetic().with_passwords(["pw"]);
        let scratch = Scratch::new().unwrap();
        let backend = ScriptedBackend::new(Format::Zip, "pw", &[("a.txt", b"a")]);
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, Some(Format::Zip), &mut Narrator::new(&mut reporter))
            .unwrap()
            .unwrap();

        assert_eq!(found.tier, Tier::Typed);
        // Forced attempts skip the integrity check, so every password is announced.
        assert!(reporter.contains("Attempting: (No Password)"));
        assert!(reporter.contains("Attempting password: scan"));
        assert!(reporter.contains("Attempting password: pw"));
    }

    #[test]
    fn test_no_brute_force_without_detection() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("holiday.mp4");
        fs::write(&path, b"\x00\x00\x00\x18ftypmp42 not an archive").unwrap();

        let settings = hermetic();
        let scratch = Scratch::new().unwrap();
        let backend = NativeBackend::new();
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap();

        assert!(found.is_none());
        assert!(!reporter.contains("brute-force"));
        assert!(reporter.contains("Falling back"));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_signature_opens_archive_under_media_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("holiday.mp4");
        fs::write(&path, create_test_zip(&[("inside.txt", b"x")])).unwrap();

        let settings = hermetic().with_extended_engine(false);
        let scratch = Scratch::new().unwrap();
        let backend = NativeBackend::new();
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap()
            .unwrap();

        assert_eq!(found.tier, Tier::Typed);
        assert_eq!(found.format, Some(Format::Zip));
        assert!(found.dir.join("inside.txt").is_file());
        assert!(!reporter.contains("brute-force"));
    }

    #[test]
    fn test_extended_engine_off_stops_after_typed_tier() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("holiday.mp4");
        fs::write(&path, b"\x00\x00\x00\x18ftypmp42 not an archive").unwrap();

        let settings = hermetic()
            .with_extended_engine(false)
            .with_detect_disguised(true);
        let scratch = Scratch::new().unwrap();
        let backend = NativeBackend::new();
        let selector = StrategySelector::new(&backend, &settings, &scratch);
        let mut reporter = MemoryReporter::new();

        let found = selector
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap();

        assert!(found.is_none());
        assert!(!reporter.contains("brute-force"));
        assert!(!reporter.contains("Falling back"));
    }

    #[test]
    fn test_progress_only_with_extended_engine() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.zip");
        fs::write(&path, create_test_zip(&[("a.txt", b"a"), ("b.txt", b"b")])).unwrap();
        let backend = NativeBackend::new();

        let settings = hermetic();
        let scratch = Scratch::new().unwrap();
        let mut reporter = MemoryReporter::new();
        StrategySelector::new(&backend, &settings, &scratch)
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap()
            .unwrap();
        assert_eq!(reporter.progress, vec![50, 100]);

        let settings = hermetic().with_extended_engine(false);
        let mut reporter = MemoryReporter::new();
        StrategySelector::new(&backend, &settings, &scratch)
            .extract(&path, None, &mut Narrator::new(&mut reporter))
            .unwrap()
            .unwrap();
        assert!(reporter.progress.is_empty());
    }

    #[test]
    fn test_mask_password_unicode() {
        assert_eq!(mask_password("päss"), "pä**");
    }
}

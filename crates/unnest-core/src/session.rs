//! The recursive unpacking session.
//!
//! An [`Unpacker`] owns a settings snapshot and a decoding backend. Each
//! call to [`Unpacker::process`] is one session: it gets its own scratch
//! workspace, walks the nested archives depth first with an explicit task
//! stack, copies the final content into the output directory and removes
//! the workspace again on every exit path.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::ArchiveBackend;
use crate::ArchivePolicy;
use crate::ExtractionError;
use crate::Format;
use crate::NativeBackend;
use crate::Result;
use crate::Settings;
use crate::formats::split::expected_first_part;
use crate::formats::split::is_non_first_part;
use crate::io::Scratch;
use crate::placement::merge_contents;
use crate::placement::place_dir;
use crate::placement::place_file;
use crate::policy::is_executable;
use crate::report::Narrator;
use crate::report::Reporter;
use crate::report::SessionReport;
use crate::strategy::StrategySelector;

/// Deepest nesting level that is still opened. The input itself is level 0.
pub const MAX_DEPTH: usize = 5;

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// A file waiting to be opened.
#[derive(Debug, Clone)]
struct Frame {
    path: PathBuf,
    depth: usize,
    forced: Option<Format>,
}

/// Unit of work on the session stack.
#[derive(Debug)]
enum Task {
    Extract(Frame),
    /// Copy one file into the output root.
    PlaceFile(PathBuf),
    /// Copy a directory to `output/<name>`.
    PlaceDir(PathBuf),
    /// Copy the contents of a directory into the output root.
    PlaceContents(PathBuf),
}

/// Top-level directory listing, sorted by name, symlinks left out.
struct Listing {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl Listing {
    fn read(dir: &Path) -> Result<Self> {
        let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut listing = Self {
            files: Vec::new(),
            dirs: Vec::new(),
        };
        for entry in entries {
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                listing.dirs.push(entry.path());
            } else if file_type.is_file() {
                listing.files.push(entry.path());
            } else {
                tracing::debug!(path = %entry.path().display(), "skipping non-regular entry");
            }
        }
        Ok(listing)
    }
}

/// Recursive unpacker.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use unnest_core::MemoryReporter;
/// use unnest_core::Settings;
/// use unnest_core::Unpacker;
///
/// let unpacker = Unpacker::new(&Settings::default().with_passwords(["secret"]));
/// let mut reporter = MemoryReporter::new();
/// let report = unpacker.process(
///     Path::new("bundle.zip"),
///     Path::new("bundle_Unpacked"),
///     &mut reporter,
/// )?;
/// assert!(reporter.contains("Starting process: bundle.zip"));
/// println!("{} files placed", report.files_placed);
/// # Ok::<(), unnest_core::ExtractionError>(())
/// ```
pub struct Unpacker {
    settings: Settings,
    backend: Box<dyn ArchiveBackend>,
}

impl Unpacker {
    /// Creates an unpacker using the [`NativeBackend`].
    ///
    /// The settings are cloned; later changes by the caller are not seen.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self::with_backend(settings, Box::new(NativeBackend::new()))
    }

    /// Creates an unpacker using a custom decoding backend.
    #[must_use]
    pub fn with_backend(settings: &Settings, backend: Box<dyn ArchiveBackend>) -> Self {
        Self {
            settings: settings.clone(),
            backend,
        }
    }

    /// Returns the settings snapshot.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Unpacks `source` into `output_root`.
    ///
    /// Archives that cannot be opened, and archives nested deeper than
    /// [`MAX_DEPTH`], are copied to the output unchanged; neither is an
    /// error.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::SourceNotFound`] if `source` is not a file
    /// - [`ExtractionError::MissingSplitFirstPart`] if `source` is a later
    ///   split volume whose first part is absent
    /// - [`ExtractionError::InvalidConfig`] if the settings are inconsistent
    /// - [`ExtractionError::Io`] if the scratch workspace or the output
    ///   directory cannot be written
    pub fn process(
        &self,
        source: &Path,
        output_root: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<SessionReport> {
        let started = Instant::now();
        let mut narrator = Narrator::new(reporter);

        let outcome = self.begin(source, output_root, &mut narrator);
        let outcome = match outcome {
            Ok(start) => self.run(&start, output_root, &mut narrator),
            Err(err) => Err(err),
        };

        narrator.complete(outcome.is_ok());
        let mut report = outcome?;
        report.duration = started.elapsed();
        tracing::debug!(
            archives = report.archives_extracted,
            files = report.files_placed,
            duration_ms = report.duration.as_millis(),
            "session finished"
        );
        Ok(report)
    }

    /// Validates the input and resolves split volumes to their first part.
    fn begin(
        &self,
        source: &Path,
        output_root: &Path,
        narrator: &mut Narrator<'_>,
    ) -> Result<PathBuf> {
        self.settings.validate()?;

        if !source.is_file() {
            let err = ExtractionError::SourceNotFound {
                path: source.to_path_buf(),
            };
            narrator.error(&err.to_string());
            return Err(err);
        }

        let mut start = source.to_path_buf();
        if is_non_first_part(source) {
            if let Some(first) = expected_first_part(source) {
                if first.is_file() {
                    narrator.info(&format!(
                        "{} is a split volume part; automatically switched to first part {}",
                        display_name(source),
                        display_name(&first)
                    ));
                    start = first;
                } else {
                    narrator.error(&format!(
                        "{} is a split volume part, but first part {} is missing.",
                        display_name(source),
                        display_name(&first)
                    ));
                    return Err(ExtractionError::MissingSplitFirstPart {
                        part: source.to_path_buf(),
                        expected: first,
                    });
                }
            }
        }

        narrator.info(&format!("Starting process: {}", display_name(&start)));
        tracing::debug!(
            source = %start.display(),
            output = %output_root.display(),
            backend = self.backend.name(),
            "session starting"
        );
        Ok(start)
    }

    /// Runs the task stack inside a fresh scratch workspace.
    fn run(
        &self,
        start: &Path,
        output_root: &Path,
        narrator: &mut Narrator<'_>,
    ) -> Result<SessionReport> {
        fs::create_dir_all(output_root)?;
        let scratch = Scratch::new()?;
        tracing::debug!(scratch = %scratch.path().display(), "scratch workspace created");

        let (outcome, mut report) = {
            let mut session = Session {
                selector: StrategySelector::new(self.backend.as_ref(), &self.settings, &scratch),
                policy: ArchivePolicy::new(&self.settings),
                output: output_root,
                narrator: &mut *narrator,
                report: SessionReport::new(output_root.to_path_buf()),
                stack: vec![Task::Extract(Frame {
                    path: start.to_path_buf(),
                    depth: 0,
                    forced: None,
                })],
            };
            let outcome = session.drain();
            (outcome, session.report)
        };

        match scratch.close() {
            Ok(()) => narrator.info("Cleanup completed."),
            Err(err) => {
                narrator.warn(&format!("Cleanup failed: {err}"));
                report.add_warning(err.to_string());
            }
        }

        outcome.map(|()| report)
    }
}

/// State of one running session.
struct Session<'s, 'n, 'r> {
    selector: StrategySelector<'s>,
    policy: ArchivePolicy<'s>,
    output: &'s Path,
    narrator: &'n mut Narrator<'r>,
    report: SessionReport,
    stack: Vec<Task>,
}

impl Session<'_, '_, '_> {
    fn drain(&mut self) -> Result<()> {
        while let Some(task) = self.stack.pop() {
            match task {
                Task::Extract(frame) => self.visit(frame)?,
                Task::PlaceFile(path) => {
                    tracing::debug!(file = %display_name(&path), "placing leftover file");
                    self.place_file(&path)?;
                }
                Task::PlaceDir(path) => {
                    tracing::debug!(dir = %display_name(&path), "moving directory to output");
                    let placed = place_dir(&path, self.output)?;
                    self.report.files_placed += placed.files;
                    self.report.directories_placed += placed.directories;
                }
                Task::PlaceContents(path) => {
                    let placed = merge_contents(&path, self.output)?;
                    self.report.files_placed += placed.files;
                    self.report.directories_placed += placed.directories;
                }
            }
        }
        Ok(())
    }

    fn place_file(&mut self, path: &Path) -> Result<()> {
        place_file(path, self.output)?;
        self.report.files_placed += 1;
        Ok(())
    }

    fn visit(&mut self, frame: Frame) -> Result<()> {
        let name = display_name(&frame.path);
        if frame.depth > 0 {
            self.narrator.info(&format!("Recursing into: {name}"));
        }

        if frame.depth > MAX_DEPTH {
            self.narrator.warn("Max recursion depth reached. Stopping here.");
            let err = ExtractionError::RecursionDepthExceeded {
                path: frame.path.clone(),
                depth: frame.depth,
            };
            tracing::debug!(error = %err, "leaving file packed");
            self.report.add_warning(err.to_string());
            self.report.depth_limit_hits += 1;
            return self.place_file(&frame.path);
        }

        let dashes = "-".repeat(frame.depth * 2);
        self.narrator
            .info(format!("{dashes} Analysing: {name}").trim_start());

        let extracted = self
            .selector
            .extract(&frame.path, frame.forced, self.narrator)?;
        let Some(extracted) = extracted else {
            self.narrator
                .warn(&format!("Failed to extract {name} or no password matched."));
            let err = ExtractionError::AllStrategiesExhausted {
                path: frame.path.clone(),
            };
            self.report.add_warning(err.to_string());
            self.report.verbatim_copies += 1;
            return self.place_file(&frame.path);
        };
        self.report.archives_extracted += 1;
        tracing::debug!(
            tier = ?extracted.tier,
            format = ?extracted.format,
            dir = %extracted.dir.display(),
            "archive extracted"
        );

        let mut root = extracted.dir;
        let mut listing = Listing::read(&root)?;
        if listing.files.is_empty() && listing.dirs.len() == 1 {
            self.narrator.info("Found wrapper folder, drilling down...");
            root = listing.dirs.remove(0);
            listing = Listing::read(&root)?;
        }

        if listing.files.iter().any(|f| is_executable(f)) {
            self.narrator.info("Executable found! Target reached.");
            self.stack.push(Task::PlaceContents(root));
            return Ok(());
        }

        let mut nested = Vec::new();
        let mut leftovers = Vec::new();
        for file in listing.files {
            let continuation = is_non_first_part(&file);
            let class = self.policy.classify(&file);
            if class.potential {
                if let Some(format) = class.forced {
                    self.narrator.info(&format!(
                        "Disguised archive detected: {} is actually {format}",
                        display_name(&file)
                    ));
                }
                if !continuation {
                    nested.push(Frame {
                        path: file,
                        depth: frame.depth + 1,
                        forced: class.forced,
                    });
                }
            } else if !continuation {
                leftovers.push(Task::PlaceFile(file));
            }
        }

        if nested.is_empty() {
            self.narrator
                .info("Extracted content is generic. Moving to output.");
            self.stack.push(Task::PlaceContents(root));
            return Ok(());
        }

        self.narrator.info(&format!(
            "Found {} nested archive(s). Processing...",
            nested.len()
        ));
        // Leftovers run after every nested archive of this node.
        leftovers.extend(listing.dirs.into_iter().map(Task::PlaceDir));
        self.stack.extend(leftovers.into_iter().rev());
        self.stack
            .extend(nested.into_iter().rev().map(Task::Extract));
        Ok(())
    }
}

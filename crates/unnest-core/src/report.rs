//! Session reporting: the narration sink and the final summary.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::Level;

/// Summary of one [`Unpacker::process`](crate::Unpacker::process) call.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// Archives successfully extracted, at any depth.
    pub archives_extracted: usize,

    /// Archives copied as-is because no strategy could open them.
    pub verbatim_copies: usize,

    /// Files copied as-is because they sat below the nesting limit.
    pub depth_limit_hits: usize,

    /// Files copied into the output directory.
    pub files_placed: usize,

    /// Directories created in the output directory.
    pub directories_placed: usize,

    /// Output directory of the session.
    pub output_dir: PathBuf,

    /// Duration of the session.
    pub duration: Duration,

    /// Warnings generated during the session.
    pub warnings: Vec<String>,
}

impl SessionReport {
    /// Creates an empty report for `output_dir`.
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Self::default()
        }
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns `true` if at least one file was left packed.
    #[must_use]
    pub const fn left_packed(&self) -> bool {
        self.verbatim_copies > 0 || self.depth_limit_hits > 0
    }
}

/// Receives a session's narration and progress.
///
/// The trait requires `Send` so that a reporter can be handed to a session
/// running on another thread.
///
/// # Examples
///
/// ```
/// use tracing::Level;
/// use unnest_core::Reporter;
///
/// struct Printer;
///
/// impl Reporter for Printer {
///     fn on_message(&mut self, level: Level, text: &str) {
///         println!("[{level}] {text}");
///     }
/// }
/// ```
pub trait Reporter: Send {
    /// Called for every narration line.
    fn on_message(&mut self, level: Level, text: &str);

    /// Called with the progress of the current extraction, `0..=100`.
    fn on_progress(&mut self, _percent: u8) {}

    /// Called once when the session ends.
    fn on_complete(&mut self, _success: bool) {}
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn on_message(&mut self, _level: Level, _text: &str) {}
}

/// Event sent by a [`ChannelReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A narration line.
    Message {
        /// Severity.
        level: Level,
        /// Text of the line.
        text: String,
    },
    /// A progress tick.
    Progress(u8),
    /// End of the session.
    Complete {
        /// Whether the input was processed without failing.
        success: bool,
    },
}

/// Reporter that forwards every event over an `mpsc` channel.
///
/// Sending never blocks; events are dropped silently once the receiver is
/// gone.
///
/// # Examples
///
/// ```
/// use std::sync::mpsc;
/// use tracing::Level;
/// use unnest_core::ChannelReporter;
/// use unnest_core::Reporter;
/// use unnest_core::SessionEvent;
///
/// let (tx, rx) = mpsc::channel();
/// let mut reporter = ChannelReporter::new(tx);
/// reporter.on_message(Level::INFO, "Starting process: a.zip");
/// reporter.on_complete(true);
/// drop(reporter);
///
/// let events: Vec<SessionEvent> = rx.iter().collect();
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[1], SessionEvent::Complete { success: true });
/// ```
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: Sender<SessionEvent>,
}

impl ChannelReporter {
    /// Creates a reporter sending into `sender`.
    #[must_use]
    pub const fn new(sender: Sender<SessionEvent>) -> Self {
        Self { sender }
    }
}

impl Reporter for ChannelReporter {
    fn on_message(&mut self, level: Level, text: &str) {
        let _ = self.sender.send(SessionEvent::Message {
            level,
            text: text.to_owned(),
        });
    }

    fn on_progress(&mut self, percent: u8) {
        let _ = self.sender.send(SessionEvent::Progress(percent));
    }

    fn on_complete(&mut self, success: bool) {
        let _ = self.sender.send(SessionEvent::Complete { success });
    }
}

/// Reporter that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    /// Narration lines in arrival order.
    pub messages: Vec<(Level, String)>,
    /// Progress ticks in arrival order.
    pub progress: Vec<u8>,
    /// Outcome passed to `on_complete`, if it was called.
    pub completed: Option<bool>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, text)| text.contains(needle))
    }

    /// Returns the lines logged at `level`.
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(move |(l, _)| *l == level)
            .map(|(_, text)| text.as_str())
    }
}

impl Reporter for MemoryReporter {
    fn on_message(&mut self, level: Level, text: &str) {
        self.messages.push((level, text.to_owned()));
    }

    fn on_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn on_complete(&mut self, success: bool) {
        self.completed = Some(success);
    }
}

/// Session-side narration: every line goes to the [`Reporter`] and is
/// mirrored as a `tracing` event at the same level.
pub struct Narrator<'r> {
    reporter: &'r mut dyn Reporter,
}

impl<'r> Narrator<'r> {
    /// Wraps `reporter`.
    pub fn new(reporter: &'r mut dyn Reporter) -> Self {
        Self { reporter }
    }

    /// Emits one line at `level`.
    pub fn say(&mut self, level: Level, text: &str) {
        if level == Level::ERROR {
            tracing::error!(target: "unnest_core::session", "{text}");
        } else if level == Level::WARN {
            tracing::warn!(target: "unnest_core::session", "{text}");
        } else if level == Level::INFO {
            tracing::info!(target: "unnest_core::session", "{text}");
        } else {
            tracing::debug!(target: "unnest_core::session", "{text}");
        }
        self.reporter.on_message(level, text);
    }

    /// Emits an informational line.
    pub fn info(&mut self, text: &str) {
        self.say(Level::INFO, text);
    }

    /// Emits a warning.
    pub fn warn(&mut self, text: &str) {
        self.say(Level::WARN, text);
    }

    /// Emits an error line.
    pub fn error(&mut self, text: &str) {
        self.say(Level::ERROR, text);
    }

    /// Forwards a progress tick.
    pub fn progress(&mut self, percent: u8) {
        self.reporter.on_progress(percent);
    }

    /// Signals the end of the session.
    pub fn complete(&mut self, success: bool) {
        self.reporter.on_complete(success);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_narrator_forwards_levels() {
        let mut reporter = MemoryReporter::new();
        {
            let mut narrator = Narrator::new(&mut reporter);
            narrator.info("Analysing: a.zip");
            narrator.warn("Max recursion depth reached. Stopping here.");
            narrator.progress(55);
            narrator.complete(true);
        }
        assert_eq!(reporter.messages[0], (Level::INFO, "Analysing: a.zip".to_owned()));
        assert_eq!(reporter.at_level(Level::WARN).count(), 1);
        assert_eq!(reporter.progress, vec![55]);
        assert_eq!(reporter.completed, Some(true));
    }

    #[test]
    fn test_report_warnings() {
        let mut report = SessionReport::new(PathBuf::from("out"));
        assert!(!report.has_warnings());
        report.add_warning("scratch left behind".into());
        assert!(report.has_warnings());
        assert_eq!(report.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_left_packed() {
        let mut report = SessionReport::default();
        assert!(!report.left_packed());
        report.depth_limit_hits = 1;
        assert!(report.left_packed());
    }

    #[test]
    fn test_memory_reporter() {
        let mut reporter = MemoryReporter::new();
        reporter.on_message(Level::INFO, "Analysing a.zip");
        reporter.on_message(Level::WARN, "Max recursion depth reached");
        reporter.on_progress(40);
        reporter.on_complete(false);

        assert!(reporter.contains("recursion depth"));
        assert_eq!(reporter.at_level(Level::WARN).count(), 1);
        assert_eq!(reporter.progress, vec![40]);
        assert_eq!(reporter.completed, Some(false));
    }

    #[test]
    fn test_channel_reporter_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut reporter = ChannelReporter::new(tx);
        reporter.on_message(Level::INFO, "nobody listening");
        reporter.on_progress(10);
    }

    #[test]
    fn test_noop_reporter_is_object_safe() {
        let mut reporter: Box<dyn Reporter> = Box::new(NoopReporter);
        reporter.on_message(Level::ERROR, "ignored");
        reporter.on_complete(true);
    }
}

//! Terminal reporter: session narration and a progress bar.

use console::Term;
use console::style;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use tracing::Level;
use unnest_core::Reporter;

/// Prints a session's narration and drives a percentage bar.
///
/// The bar is only drawn on a TTY. Narration is printed above it so the two
/// never garble each other. Automatically cleans up on drop.
pub struct CliReporter {
    bar: Option<ProgressBar>,
    echo: bool,
    use_colors: bool,
    term: Term,
}

impl CliReporter {
    /// Creates a reporter for the input called `name`.
    ///
    /// With `echo` unset, narration is swallowed (quiet and JSON modes).
    #[must_use]
    pub fn new(name: &str, echo: bool) -> Self {
        let bar = (echo && Self::should_show()).then(|| {
            let bar = ProgressBar::new(100);
            // Template: "a.zip [████████░░░░]  42%"
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓░"),
            );
            bar.set_message(name.to_string());
            bar
        });

        Self {
            bar,
            echo,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }

    fn decorate(&self, level: Level, text: &str) -> String {
        if level == Level::ERROR {
            if self.use_colors {
                format!("{} {text}", style("✗").red().bold())
            } else {
                format!("ERROR: {text}")
            }
        } else if level == Level::WARN {
            if self.use_colors {
                format!("{} {text}", style("⚠").yellow().bold())
            } else {
                format!("WARNING: {text}")
            }
        } else {
            text.to_string()
        }
    }
}

impl Drop for CliReporter {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Reporter for CliReporter {
    fn on_message(&mut self, level: Level, text: &str) {
        if !self.echo {
            return;
        }
        let line = self.decorate(level, text);
        match &self.bar {
            Some(bar) => bar.println(line),
            None => {
                let _ = self.term.write_line(&line);
            }
        }
    }

    fn on_progress(&mut self, percent: u8) {
        if let Some(bar) = &self.bar {
            bar.set_position(u64::from(percent));
        }
    }

    fn on_complete(&mut self, _success: bool) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

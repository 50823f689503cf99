//! Human-readable output formatter with colors and styling.

use super::formatter::InputOutcome;
use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

fn name_of(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn write(&self, line: &str) {
        let _ = self.term.write_line(line);
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            self.write(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            self.write(&format!("ERROR: {error:?}"));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn echo_narration(&self) -> bool {
        !self.quiet
    }

    fn format_input_result(&self, outcome: &InputOutcome) -> Result<()> {
        let report = match &outcome.result {
            Ok(report) => report,
            Err(error) => {
                self.format_error(error);
                return Ok(());
            }
        };
        if self.quiet {
            return Ok(());
        }

        let headline = format!(
            "Unpacked {} -> {}",
            name_of(&outcome.source),
            outcome.output.display()
        );
        if self.use_colors {
            self.write(&format!("{} {headline}", style("✓").green().bold()));
        } else {
            self.write(&headline);
        }

        self.write(&format!(
            "  Archives extracted: {}",
            report.archives_extracted
        ));
        self.write(&format!("  Files placed: {}", report.files_placed));
        if report.left_packed() {
            self.write(&format!(
                "  Left packed: {} unopenable, {} too deep",
                report.verbatim_copies, report.depth_limit_hits
            ));
        }

        if self.verbose {
            self.write(&format!(
                "  Directories: {}",
                report.directories_placed
            ));
            self.write(&format!("  Duration: {:?}", report.duration));
            for warning in &report.warnings {
                self.write(&format!("  - {warning}"));
            }
        }

        Ok(())
    }

    fn format_batch_result(&self, outcomes: &[InputOutcome]) -> Result<()> {
        let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
        if self.quiet || outcomes.len() < 2 {
            return Ok(());
        }

        self.write("");
        let summary = format!(
            "{} input(s) processed, {} failed",
            outcomes.len(),
            failed
        );
        if !self.use_colors {
            self.write(&summary);
        } else if failed == 0 {
            self.write(&format!("{}", style(summary).green().bold()));
        } else {
            self.write(&format!("{}", style(summary).red().bold()));
        }
        Ok(())
    }

    fn format_info(&self, message: &str) {
        if !self.quiet {
            self.write(message);
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            self.write(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            self.write(&format!("WARNING: {message}"));
        }
    }
}

//! Unpack command implementation.

use crate::cli::Cli;
use crate::error::convert_config_error;
use crate::error::convert_session_error;
use crate::output::InputOutcome;
use crate::output::OutputFormatter;
use crate::progress::CliReporter;
use anyhow::Result;
use anyhow::bail;
use std::path::Path;
use unnest_core::Settings;
use unnest_core::Unpacker;
use unnest_core::batch::plan_inputs;
use unnest_core::config::parse_list_file;

/// Builds the session settings: config file first, then flags on top.
pub fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_json_file(path).map_err(|e| convert_config_error(e, path))?,
        None => Settings::default(),
    };

    if let Some(path) = &cli.passwords_file {
        let listed = parse_list_file(path).map_err(|e| convert_config_error(e, path))?;
        settings.passwords.extend(listed);
    }
    settings.passwords.extend(cli.passwords.iter().cloned());

    if let Some(path) = &cli.extensions_file {
        let listed = parse_list_file(path).map_err(|e| convert_config_error(e, path))?;
        settings = settings.with_disguised_extensions(listed);
    }
    if !cli.disguised_extensions.is_empty() {
        let mut extensions = settings.disguised_extensions.clone();
        extensions.extend(cli.disguised_extensions.iter().cloned());
        settings = settings.with_disguised_extensions(extensions);
    }

    if cli.detect_disguised {
        settings.detect_disguised = true;
    }
    if cli.no_auto_detect {
        settings.auto_detect_unknown_extensions = false;
    }
    if cli.no_fallback {
        settings.extended_engine = false;
    }
    if let Some(program) = &cli.archiver {
        settings.archiver.clone_from(program);
    }

    settings
        .validate()
        .map_err(|e| convert_session_error(e, Path::new("settings")))?;
    Ok(settings)
}

fn name_of(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

pub fn execute(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<()> {
    let settings = build_settings(cli)?;
    let plan = plan_inputs(&cli.paths, cli.output.as_deref())
        .map_err(|e| convert_session_error(e, Path::new(".")))?;

    for dir in &plan.empty_dirs {
        formatter.format_warning(&format!("Directory is empty: {}", dir.display()));
    }
    for duplicate in &plan.duplicates {
        formatter.format_info(&format!(
            "Skipping duplicate split-volume input: {}",
            name_of(duplicate)
        ));
    }

    let unpacker = Unpacker::new(&settings);
    let mut outcomes = Vec::with_capacity(plan.inputs.len());
    for input in plan.inputs {
        tracing::debug!(source = %input.source.display(), "dispatching to engine");
        let mut reporter = CliReporter::new(&name_of(&input.source), formatter.echo_narration());
        let result = unpacker
            .process(&input.source, &input.output, &mut reporter)
            .map_err(|e| convert_session_error(e, &input.source));
        drop(reporter);

        let outcome = InputOutcome {
            source: input.source,
            output: input.output,
            result,
        };
        formatter.format_input_result(&outcome)?;
        outcomes.push(outcome);
    }

    formatter.format_batch_result(&outcomes)?;

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    if failed > 0 {
        bail!("{failed} of {} input(s) failed", outcomes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "unnest",
            "--detect-disguised",
            "--no-auto-detect",
            "--no-fallback",
            "--disguised-ext",
            "TIF",
            "-p",
            "secret",
            "a.zip",
        ]);
        let settings = build_settings(&cli).unwrap_or_else(|e| panic!("{e:?}"));

        assert!(settings.detect_disguised);
        assert!(!settings.auto_detect_unknown_extensions);
        assert!(!settings.extended_engine);
        assert_eq!(settings.passwords, ["secret"]);
        assert!(settings.is_disguised_extension("tif"));
        assert!(settings.is_disguised_extension("mp4"));
    }

    #[test]
    fn test_empty_archiver_from_config_rejected() {
        let temp = tempfile::TempDir::new().unwrap_or_else(|e| panic!("{e}"));
        let config = temp.path().join("settings.json");
        std::fs::write(&config, br#"{"archiver": ""}"#).unwrap_or_else(|e| panic!("{e}"));
        let config_arg = config.to_string_lossy().into_owned();

        let cli = parse(&["unnest", "--config", &config_arg, "a.zip"]);
        let msg = build_settings(&cli)
            .err()
            .map(|e| format!("{e:?}"))
            .unwrap_or_default();

        assert!(msg.contains("Invalid configuration"), "{msg}");
        assert!(msg.contains("archiver program must not be empty"), "{msg}");
        assert!(msg.contains("HINT"), "{msg}");
    }

    #[test]
    fn test_archiver_flag_repairs_config() {
        let temp = tempfile::TempDir::new().unwrap_or_else(|e| panic!("{e}"));
        let config = temp.path().join("settings.json");
        std::fs::write(&config, br#"{"archiver": ""}"#).unwrap_or_else(|e| panic!("{e}"));
        let config_arg = config.to_string_lossy().into_owned();

        let cli = parse(&["unnest", "--config", &config_arg, "--archiver", "7za", "a.zip"]);
        let settings = build_settings(&cli).unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(settings.archiver, std::path::PathBuf::from("7za"));
    }

    #[test]
    fn test_missing_passwords_file() {
        let cli = parse(&["unnest", "--passwords-file", "/nonexistent/pw.txt", "a.zip"]);
        assert!(build_settings(&cli).is_err());
    }
}

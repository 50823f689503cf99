//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "unnest")]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "Each file is unpacked into <dir>/<name>_Unpacked; each directory's files \
                  into <dir>_Unpacked."
)]
pub struct Cli {
    /// Archives or directories of archives to unpack
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Password to try (can be repeated, tried in order)
    #[arg(short, long = "password", value_name = "PASSWORD")]
    pub passwords: Vec<String>,

    /// File with one password per line
    #[arg(long, value_name = "FILE")]
    pub passwords_file: Option<PathBuf>,

    /// Extension that may hide an archive (can be repeated)
    #[arg(long = "disguised-ext", value_name = "EXT")]
    pub disguised_extensions: Vec<String>,

    /// File with one possibly-disguised extension per line (replaces the defaults)
    #[arg(long, value_name = "FILE")]
    pub extensions_file: Option<PathBuf>,

    /// Check file signatures to find archives behind media extensions
    #[arg(long)]
    pub detect_disguised: bool,

    /// Treat files with unfamiliar extensions as plain files
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Disable brute-force format detection and the external archiver
    #[arg(long)]
    pub no_fallback: bool,

    /// 7-Zip compatible program used as the last resort
    #[arg(long, value_name = "PROGRAM")]
    pub archiver: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Create every output directory beneath DIR
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long)]
    pub json: bool,

    /// Also write a diagnostic log to FILE (truncated on start, no colors)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Most detailed level recorded in the log file
    #[arg(long, value_name = "LEVEL", default_value = "debug", requires = "log_file")]
    pub log_level: LevelFilter,
}

//! Command-line parsing for the replicate combiner.
//!
//! The goal of this module is to keep **argument parsing** and up-front
//! path validation separate from the grouping/averaging code.

use std::path::PathBuf;

use clap::Parser;

use crate::error::AppError;

/// Layout file extensions the tool accepts: a structured document or the
/// flat instrument sheet.
const LAYOUT_EXTENSIONS: [&str; 3] = ["json", "csv", "txt"];

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "repmerge",
    version,
    about = "Combine and average replicate measurement CSVs"
)]
pub struct Cli {
    /// Directory containing the instrument CSV exports.
    pub data_dir: PathBuf,

    /// Experiment layout file: structured JSON, or a flat
    /// `name,size,condition,...` sheet.
    pub layout_file: PathBuf,

    /// Directory the combined/average CSVs are written to (created if absent).
    pub output_dir: PathBuf,

    /// Replicate measurements per condition (flat layouts only).
    #[arg(short = 'r', long, default_value_t = 3)]
    pub replicates: usize,

    /// Read only the first N experiment lines of a flat layout file.
    #[arg(long, value_name = "N")]
    pub experiments: Option<usize>,
}

/// Validate the argument paths before the pipeline touches anything.
pub fn validate(cli: &Cli) -> Result<(), AppError> {
    if !cli.data_dir.exists() {
        return Err(AppError::config(format!(
            "{} does not exist",
            cli.data_dir.display(),
        )));
    }
    if !cli.data_dir.is_dir() {
        return Err(AppError::config(format!(
            "{} is not a directory",
            cli.data_dir.display(),
        )));
    }
    if !cli.layout_file.exists() {
        return Err(AppError::config(format!(
            "{} does not exist",
            cli.layout_file.display(),
        )));
    }
    if !cli.layout_file.is_file() {
        return Err(AppError::config(format!(
            "{} is not a file",
            cli.layout_file.display(),
        )));
    }
    let known_extension = cli
        .layout_file
        .extension()
        .map(|ext| LAYOUT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false);
    if !known_extension {
        return Err(AppError::config(format!(
            "{} is not a layout file (expected .json, .csv, or .txt)",
            cli.layout_file.display(),
        )));
    }
    if cli.replicates == 0 {
        return Err(AppError::config("--replicates must be at least 1"));
    }
    Ok(())
}

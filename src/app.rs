//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - validates the input/output locations
//! - runs the grouping/averaging pipeline
//! - prints per-condition progress
//! - writes the combined/average CSVs

use clap::Parser;

use crate::cli::Cli;
use crate::domain::RunConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `repmerge` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::cli::validate(&cli)?;

    let config = run_config_from_args(&cli);
    let output = pipeline::run(&config)?;

    for experiment in &output.run.experiments {
        println!("{}", crate::report::format_experiment_header(&experiment.name));
        for condition in &experiment.conditions {
            println!("{}", crate::report::format_condition_progress(condition));
        }
    }

    let written = crate::io::export::write_run(&output.run, &config.output_dir)?;
    println!(
        "{}",
        crate::report::format_run_summary(&output.run, &written, &config.output_dir)
    );

    Ok(())
}

pub fn run_config_from_args(cli: &Cli) -> RunConfig {
    RunConfig {
        data_dir: cli.data_dir.clone(),
        layout_file: cli.layout_file.clone(),
        output_dir: cli.output_dir.clone(),
        replicates: cli.replicates,
        experiment_limit: cli.experiments,
    }
}

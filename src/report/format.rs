//! Formatted terminal output.

use std::path::{Path, PathBuf};

use crate::aggregate::{AggregatedCondition, AggregatedRun};
use crate::domain::Phase;

/// Header line announcing an experiment.
pub fn format_experiment_header(name: &str) -> String {
    format!("Processing experiment: {name}")
}

/// Per-condition progress block: the condition name and which files feed
/// its raw and subtracted replicates.
pub fn format_condition_progress(condition: &AggregatedCondition) -> String {
    let raw = join_file_names(condition.phase_paths(Phase::Raw));
    let subtracted = join_file_names(condition.phase_paths(Phase::Subtracted));
    format!(
        "\tProcessing condition: {}\n\t\tRaw data: {raw}\n\t\tSubtracted data: {subtracted}",
        condition.name,
    )
}

/// One-paragraph summary printed after the output files are written.
pub fn format_run_summary(run: &AggregatedRun, written: &[PathBuf], output_dir: &Path) -> String {
    let conditions: usize = run
        .experiments
        .iter()
        .map(|experiment| experiment.conditions.len())
        .sum();
    format!(
        "Processed {} experiment(s), {} condition(s).\nWrote {} file(s) to '{}'.",
        run.experiments.len(),
        conditions,
        written.len(),
        output_dir.display(),
    )
}

fn join_file_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        })
        .collect::<Vec<_>>()
        .join(" , ")
}

//! Shared grouping/averaging pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! layout -> plan -> discover -> bind -> load -> aggregate
//!
//! Front-ends (today, the CLI) only do presentation around it: progress
//! printing and triggering the export.

use crate::aggregate::AggregatedRun;
use crate::domain::{ConfigKind, RunConfig};
use crate::error::AppError;

/// All computed outputs of a single run, ready to write.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub kind: ConfigKind,
    /// Exact number of `.csv` files the plan required the data directory
    /// to contain.
    pub total_files: usize,
    pub run: AggregatedRun,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Read the layout document (structured or flat).
    let doc = crate::io::layout::read_layout(
        &config.layout_file,
        config.replicates,
        config.experiment_limit,
    )?;

    // 2) Resolve it into a plan; this fixes `total_files` before any data I/O.
    let plan = crate::plan::resolve(doc)?;
    let kind = plan.kind;
    let total_files = plan.total_files;

    // 3) Discover and order the data files.
    let files = crate::io::ingest::discover_data_files(&config.data_dir)?;

    // 4) Join plan and files: count invariant, pairing, selection.
    let bound = crate::plan::bind(plan, &files, &config.data_dir)?;

    // 5) Read every referenced file.
    let loaded = crate::io::ingest::load_run(bound)?;

    // 6) Combine replicates and compute the averages.
    let run = crate::aggregate::aggregate_run(loaded);

    Ok(RunOutput {
        kind,
        total_files,
        run,
    })
}

//! Resolving a layout into a concrete run plan.
//!
//! Two steps, split so the fail-fast contract is visible in the types:
//!
//! - [`resolve`] turns a `LayoutDoc` into a `RunPlan` without touching the
//!   filesystem. This fixes `total_files`, the exact number of `.csv` files
//!   the data directory must contain.
//! - [`bind`] joins the plan against the sorted discovery list: the file
//!   count invariant is checked first, then sorted files pair up
//!   consecutively (even position raw, odd position subtracted) and every
//!   condition's selector resolves to concrete paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::{ConditionLayout, ConfigKind, ExperimentLayout, LayoutDoc};
use crate::error::AppError;
use crate::naming::DataFile;

/// A validated plan with its expected file count, prior to any data I/O.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub kind: ConfigKind,
    /// Exact number of `.csv` files the data directory must contain.
    pub total_files: usize,
    pub experiments: Vec<ExperimentLayout>,
}

/// A condition with its replicate files pinned down.
#[derive(Debug, Clone)]
pub struct BoundCondition {
    pub name: String,
    pub raw_paths: Vec<PathBuf>,
    pub subtracted_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BoundExperiment {
    pub name: String,
    pub conditions: Vec<BoundCondition>,
}

#[derive(Debug, Clone)]
pub struct BoundRun {
    pub experiments: Vec<BoundExperiment>,
}

/// Validate a layout and compute `total_files`. No I/O happens here.
pub fn resolve(doc: LayoutDoc) -> Result<RunPlan, AppError> {
    let mut max_pair: Option<usize> = None;
    let mut declared_paths = 0usize;

    for experiment in &doc.experiments {
        if experiment.conditions.is_empty() {
            return Err(AppError::config(format!(
                "Experiment `{}` has no conditions",
                experiment.name,
            )));
        }
        for condition in &experiment.conditions {
            match condition {
                ConditionLayout::Indexed { name, files } => {
                    if files.is_empty() {
                        return Err(AppError::config(format!(
                            "Condition `{name}` selects no replicate pairs",
                        )));
                    }
                    for &index in files {
                        max_pair = Some(max_pair.map_or(index, |m| m.max(index)));
                    }
                }
                ConditionLayout::Explicit {
                    name,
                    raw,
                    subtracted,
                } => {
                    if raw.len() != subtracted.len() {
                        return Err(AppError::config(format!(
                            "Condition `{name}` lists {} raw but {} subtracted files",
                            raw.len(),
                            subtracted.len(),
                        )));
                    }
                    if raw.is_empty() {
                        return Err(AppError::config(format!(
                            "Condition `{name}` lists no replicate files",
                        )));
                    }
                    declared_paths += raw.len() + subtracted.len();
                }
            }
        }
    }

    let total_files = match doc.kind {
        ConfigKind::IndexBased => {
            let max_pair = max_pair
                .ok_or_else(|| AppError::config("Layout selects no replicate pairs"))?;
            2 * (max_pair + 1)
        }
        ConfigKind::PathBased => declared_paths,
    };

    Ok(RunPlan {
        kind: doc.kind,
        total_files,
        experiments: doc.experiments,
    })
}

/// Join the plan against the sorted discovery list.
///
/// The count invariant is checked before anything else, so a bad run aborts
/// before any file content is read.
pub fn bind(plan: RunPlan, files: &[DataFile], data_dir: &Path) -> Result<BoundRun, AppError> {
    if files.len() != plan.total_files {
        return Err(AppError::file_count(format!(
            "Expected {} data files, but found {} in '{}'",
            plan.total_files,
            files.len(),
            data_dir.display(),
        )));
    }

    // Consecutive pairing over the sorted sequence. Whether the file at an
    // even position really is a raw export is not verified; position is the
    // contract.
    let pairs: Vec<&[DataFile]> = files.chunks_exact(2).collect();

    // Path-based conditions match on file name within the data directory.
    let by_name: HashMap<String, &Path> = files
        .iter()
        .filter_map(|f| {
            f.path
                .file_name()
                .map(|n| (n.to_string_lossy().into_owned(), f.path.as_path()))
        })
        .collect();

    let mut experiments = Vec::new();
    for experiment in plan.experiments {
        let mut conditions = Vec::new();
        for condition in experiment.conditions {
            let bound = match condition {
                ConditionLayout::Indexed { name, files: indices } => {
                    let mut raw_paths = Vec::with_capacity(indices.len());
                    let mut subtracted_paths = Vec::with_capacity(indices.len());
                    for index in indices {
                        let pair = pairs.get(index).ok_or_else(|| {
                            AppError::config(format!(
                                "Condition `{name}` selects pair {index}, but only {} pairs exist",
                                pairs.len(),
                            ))
                        })?;
                        raw_paths.push(pair[0].path.clone());
                        subtracted_paths.push(pair[1].path.clone());
                    }
                    BoundCondition {
                        name,
                        raw_paths,
                        subtracted_paths,
                    }
                }
                ConditionLayout::Explicit {
                    name,
                    raw,
                    subtracted,
                } => BoundCondition {
                    raw_paths: lookup_declared(&name, &raw, &by_name)?,
                    subtracted_paths: lookup_declared(&name, &subtracted, &by_name)?,
                    name,
                },
            };
            conditions.push(bound);
        }
        experiments.push(BoundExperiment {
            name: experiment.name,
            conditions,
        });
    }

    Ok(BoundRun { experiments })
}

fn lookup_declared(
    condition: &str,
    declared: &[String],
    by_name: &HashMap<String, &Path>,
) -> Result<Vec<PathBuf>, AppError> {
    declared
        .iter()
        .map(|entry| {
            let file_name = Path::new(entry)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.clone());
            by_name
                .get(&file_name)
                .map(|path| path.to_path_buf())
                .ok_or_else(|| {
                    AppError::config(format!(
                        "Condition `{condition}` declares `{entry}`, which is not in the data directory",
                    ))
                })
        })
        .collect()
}

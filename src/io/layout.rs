//! Layout (configuration) file reading.
//!
//! Two on-disk formats are accepted, dispatched on the file extension:
//!
//! - `.json`: a structured document, `{"experiments": [...]}`, where every
//!   condition either selects pair indices (`"files": [0, 1, 2]`) or lists
//!   its raw/subtracted files explicitly. One document must stick to one
//!   shape.
//! - anything else (`.csv`/`.txt`): the flat instrument sheet, one line per
//!   experiment: `experimentName,experimentSize,conditionName1,...`. Flat
//!   layouts lower to index-based conditions with consecutive pair indices,
//!   `replicates` pairs per condition.
//!
//! Reading settles the `ConfigKind` once; downstream code never re-detects
//! the shape.

use std::fs::{self, File};
use std::path::Path;

use serde::Deserialize;

use crate::domain::{ConditionLayout, ConfigKind, ExperimentLayout, LayoutDoc};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct LayoutFile {
    experiments: Vec<ExperimentLayout>,
}

/// Read a layout file into a `LayoutDoc`.
///
/// `replicates` and `experiment_limit` only apply to flat layouts; a
/// structured document carries its replicate structure explicitly.
pub fn read_layout(
    path: &Path,
    replicates: usize,
    experiment_limit: Option<usize>,
) -> Result<LayoutDoc, AppError> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        read_structured(path)
    } else {
        read_flat(path, replicates, experiment_limit)
    }
}

fn read_structured(path: &Path) -> Result<LayoutDoc, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open layout file '{}': {e}", path.display())))?;
    let parsed: LayoutFile = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid layout JSON '{}': {e}", path.display())))?;

    // Settle the configuration kind: every condition in the document must
    // use the same shape.
    let mut kind: Option<ConfigKind> = None;
    for experiment in &parsed.experiments {
        for condition in &experiment.conditions {
            match kind {
                None => kind = Some(condition.kind()),
                Some(k) if k != condition.kind() => {
                    return Err(AppError::config(format!(
                        "Layout '{}' mixes index-based and path-based conditions (condition `{}`)",
                        path.display(),
                        condition.name(),
                    )));
                }
                Some(_) => {}
            }
        }
    }
    let kind = kind.ok_or_else(|| {
        AppError::config(format!("Layout '{}' declares no conditions", path.display()))
    })?;

    Ok(LayoutDoc {
        kind,
        experiments: parsed.experiments,
    })
}

fn read_flat(
    path: &Path,
    replicates: usize,
    experiment_limit: Option<usize>,
) -> Result<LayoutDoc, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read layout file '{}': {e}", path.display())))?;

    let lines = text.lines().filter(|line| !line.trim().is_empty());
    let lines: Vec<&str> = match experiment_limit {
        Some(limit) => lines.take(limit).collect(),
        None => lines.collect(),
    };

    let mut experiments = Vec::new();
    let mut next_pair = 0usize;
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(AppError::config(format!(
                "Layout line `{line}` needs an experiment name, a condition count, and at least one condition",
            )));
        }

        let name = fields[0].to_string();
        let declared: usize = fields[1].parse().map_err(|_| {
            AppError::config(format!(
                "Invalid condition count `{}` for experiment `{name}`",
                fields[1],
            ))
        })?;
        let condition_names = &fields[2..];
        if declared != condition_names.len() {
            return Err(AppError::config(format!(
                "Experiment `{name}` declares {declared} conditions but lists {}",
                condition_names.len(),
            )));
        }

        let conditions = condition_names
            .iter()
            .map(|condition_name| {
                let start = next_pair;
                next_pair += replicates;
                ConditionLayout::Indexed {
                    name: condition_name.to_string(),
                    files: (start..next_pair).collect(),
                }
            })
            .collect();
        experiments.push(ExperimentLayout { name, conditions });
    }

    if experiments.is_empty() {
        return Err(AppError::config(format!(
            "Layout '{}' declares no experiments",
            path.display(),
        )));
    }

    Ok(LayoutDoc {
        kind: ConfigKind::IndexBased,
        experiments,
    })
}

//! Data discovery and CSV loading.
//!
//! Instrument exports carry one metadata line, then a header row, then the
//! sample rows. Only two columns matter: `Time (days)` and `counts/sec`.
//! On load the time column is renamed to `time/days` and the value column
//! to the owning condition's name, so the later horizontal concatenation
//! does not collide on column names.
//!
//! Each file is opened, read, and closed exactly once; no handle outlives
//! its call.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::Series;
use crate::error::AppError;
use crate::naming::{self, DataFile};
use crate::plan::BoundRun;

/// Header name of the time column in instrument exports.
pub const TIME_COLUMN: &str = "Time (days)";
/// Header name of the measurement column in instrument exports.
pub const VALUE_COLUMN: &str = "counts/sec";
/// Name the time column carries in every output file.
pub const TIME_OUTPUT_NAME: &str = "time/days";

/// A loaded condition: replicate series in declaration order, one per file.
#[derive(Debug, Clone)]
pub struct LoadedCondition {
    pub name: String,
    pub raw: Vec<Series>,
    pub subtracted: Vec<Series>,
    pub raw_paths: Vec<PathBuf>,
    pub subtracted_paths: Vec<PathBuf>,
}

/// A loaded experiment with its shared time axis.
#[derive(Debug, Clone)]
pub struct LoadedExperiment {
    pub name: String,
    /// Taken from the first condition's first raw replicate; the other
    /// files' time columns are assumed identical and not verified.
    pub time: Series,
    pub conditions: Vec<LoadedCondition>,
}

#[derive(Debug, Clone)]
pub struct LoadedRun {
    pub experiments: Vec<LoadedExperiment>,
}

/// Scan one directory level for `.csv` files and order them by naming key.
pub fn discover_data_files(data_dir: &Path) -> Result<Vec<DataFile>, AppError> {
    let entries = fs::read_dir(data_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to read data directory '{}': {e}",
            data_dir.display(),
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::io(format!(
                "Failed to read data directory '{}': {e}",
                data_dir.display(),
            ))
        })?;
        let path = entry.path();
        let is_csv = path.is_file()
            && path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
        if is_csv {
            files.push(DataFile::new(path));
        }
    }

    naming::sort_data_files(&mut files);
    Ok(files)
}

/// Read every file the bound run references.
pub fn load_run(bound: BoundRun) -> Result<LoadedRun, AppError> {
    let mut experiments = Vec::new();
    for experiment in bound.experiments {
        let mut time: Option<Series> = None;
        let mut conditions = Vec::new();

        for condition in experiment.conditions {
            let mut raw = Vec::with_capacity(condition.raw_paths.len());
            for path in &condition.raw_paths {
                let columns = read_columns(path)?;
                if time.is_none() {
                    time = Some(Series::new(TIME_OUTPUT_NAME, columns.time.clone()));
                }
                raw.push(Series::new(condition.name.clone(), columns.counts));
            }

            let mut subtracted = Vec::with_capacity(condition.subtracted_paths.len());
            for path in &condition.subtracted_paths {
                let columns = read_columns(path)?;
                subtracted.push(Series::new(condition.name.clone(), columns.counts));
            }

            conditions.push(LoadedCondition {
                name: condition.name,
                raw,
                subtracted,
                raw_paths: condition.raw_paths,
                subtracted_paths: condition.subtracted_paths,
            });
        }

        let time = time.ok_or_else(|| {
            AppError::config(format!(
                "Experiment `{}` has no raw replicate to take the time axis from",
                experiment.name,
            ))
        })?;
        experiments.push(LoadedExperiment {
            name: experiment.name,
            time,
            conditions,
        });
    }

    Ok(LoadedRun { experiments })
}

/// Both numeric columns of one instrument export.
#[derive(Debug)]
struct FileColumns {
    time: Vec<f64>,
    counts: Vec<f64>,
}

fn read_columns(path: &Path) -> Result<FileColumns, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open data file '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let mut records = reader.records();

    // Record 0 is the instrument metadata line; its content is ignored.
    let metadata = records
        .next()
        .transpose()
        .map_err(|e| AppError::io(format!("Failed to read data file '{}': {e}", path.display())))?;
    if metadata.is_none() {
        return Err(AppError::io(format!(
            "Data file '{}' is empty",
            path.display(),
        )));
    }

    let header = records
        .next()
        .transpose()
        .map_err(|e| AppError::io(format!("Failed to read data file '{}': {e}", path.display())))?
        .ok_or_else(|| {
            AppError::io(format!("Data file '{}' has no header row", path.display()))
        })?;

    let header_map = build_header_map(&header);
    let time_idx = column_index(&header_map, TIME_COLUMN).ok_or_else(|| {
        AppError::io(format!(
            "Data file '{}' is missing the `{TIME_COLUMN}` column",
            path.display(),
        ))
    })?;
    let counts_idx = column_index(&header_map, VALUE_COLUMN).ok_or_else(|| {
        AppError::io(format!(
            "Data file '{}' is missing the `{VALUE_COLUMN}` column",
            path.display(),
        ))
    })?;

    let mut time = Vec::new();
    let mut counts = Vec::new();
    for (idx, result) in records.enumerate() {
        // +3: 1-based line numbers, after the metadata and header rows.
        let line = idx + 3;
        let record = result.map_err(|e| {
            AppError::io(format!(
                "CSV error in '{}' line {line}: {e}",
                path.display(),
            ))
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        time.push(parse_cell(&record, time_idx, path, line, TIME_COLUMN)?);
        counts.push(parse_cell(&record, counts_idx, path, line, VALUE_COLUMN)?);
    }

    Ok(FileColumns { time, counts })
}

fn build_header_map(header: &StringRecord) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Instrument software sometimes emits UTF-8 CSVs with a BOM prefix on
    // the first header cell; without stripping it the column lookup fails.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column_index(header_map: &HashMap<String, usize>, name: &str) -> Option<usize> {
    header_map.get(&normalize_header_name(name)).copied()
}

fn parse_cell(
    record: &StringRecord,
    idx: usize,
    path: &Path,
    line: usize,
    column: &str,
) -> Result<f64, AppError> {
    let cell = record.get(idx).ok_or_else(|| {
        AppError::io(format!(
            "Data file '{}' line {line} has no `{column}` value",
            path.display(),
        ))
    })?;
    cell.parse::<f64>().map_err(|_| {
        AppError::io(format!(
            "Invalid `{column}` value `{cell}` in '{}' line {line}",
            path.display(),
        ))
    })
}

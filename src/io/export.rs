//! Write combined and averaged series per experiment.
//!
//! Four files per experiment, two per phase:
//!
//! - `<name>_<phase>_data_combined.csv`: the time axis followed by every
//!   condition's replicate columns (header repeats the condition name once
//!   per replicate)
//! - `<name>_<phase>_data_average.csv`: the time axis followed by one
//!   averaged column per condition
//!
//! No row index is written; column order follows condition declaration
//! order. Cells a column does not reach (short replicates, NaN means) are
//! written empty.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::aggregate::{AggregatedExperiment, AggregatedRun};
use crate::domain::{Phase, Series};
use crate::error::AppError;

/// Write every output file of the run. Returns the paths written, in order.
pub fn write_run(run: &AggregatedRun, output_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(output_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to create output directory '{}': {e}",
            output_dir.display(),
        ))
    })?;

    let mut written = Vec::new();
    for experiment in &run.experiments {
        for phase in Phase::ALL {
            let combined = output_dir.join(format!(
                "{}_{}_data_combined.csv",
                experiment.name,
                phase.label(),
            ));
            write_table(&combined, &combined_columns(experiment, phase))?;
            written.push(combined);

            let average = output_dir.join(format!(
                "{}_{}_data_average.csv",
                experiment.name,
                phase.label(),
            ));
            write_table(&average, &average_columns(experiment, phase))?;
            written.push(average);
        }
    }

    Ok(written)
}

fn combined_columns<'a>(experiment: &'a AggregatedExperiment, phase: Phase) -> Vec<&'a Series> {
    let mut columns = vec![&experiment.time];
    for condition in &experiment.conditions {
        columns.extend(&condition.phase(phase).combined.columns);
    }
    columns
}

fn average_columns<'a>(experiment: &'a AggregatedExperiment, phase: Phase) -> Vec<&'a Series> {
    let mut columns = vec![&experiment.time];
    for condition in &experiment.conditions {
        columns.push(&condition.phase(phase).average);
    }
    columns
}

fn write_table(path: &Path, columns: &[&Series]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!(
            "Failed to create output file '{}': {e}",
            path.display(),
        ))
    })?;
    let mut writer = BufWriter::new(file);

    let header = columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{header}")
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;

    let rows = columns.iter().map(|column| column.len()).max().unwrap_or(0);
    for row in 0..rows {
        let line = columns
            .iter()
            .map(|column| format_cell(column.values.get(row).copied()))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{line}")
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_run;
    use crate::io::ingest::{LoadedCondition, LoadedExperiment, LoadedRun, TIME_OUTPUT_NAME};
    use tempfile::TempDir;

    fn series(name: &str, values: &[f64]) -> Series {
        Series::new(name, values.to_vec())
    }

    fn sample_run() -> AggregatedRun {
        let condition = |name: &str, raw: Vec<Series>, subtracted: Vec<Series>| LoadedCondition {
            name: name.to_string(),
            raw,
            subtracted,
            raw_paths: Vec::new(),
            subtracted_paths: Vec::new(),
        };

        aggregate_run(LoadedRun {
            experiments: vec![LoadedExperiment {
                name: "growth".to_string(),
                time: series(TIME_OUTPUT_NAME, &[0.0, 0.5]),
                conditions: vec![
                    condition(
                        "control",
                        vec![series("control", &[10.0, 12.0]), series("control", &[20.0, 14.0])],
                        vec![series("control", &[1.0, 2.0]), series("control", &[3.0, 4.0])],
                    ),
                    condition(
                        "treated",
                        vec![series("treated", &[5.0, 6.0])],
                        vec![series("treated", &[0.5, 0.6])],
                    ),
                ],
            }],
        })
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn writes_four_files_per_experiment() {
        let dir = TempDir::new().unwrap();
        let written = write_run(&sample_run(), dir.path()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "growth_raw_data_combined.csv",
                "growth_raw_data_average.csv",
                "growth_subtracted_data_combined.csv",
                "growth_subtracted_data_average.csv",
            ]
        );
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn combined_file_keeps_one_column_per_replicate() {
        let dir = TempDir::new().unwrap();
        write_run(&sample_run(), dir.path()).unwrap();

        let rows = read_rows(&dir.path().join("growth_raw_data_combined.csv"));
        assert_eq!(rows[0], ["time/days", "control", "control", "treated"]);
        assert_eq!(rows[1], ["0", "10", "20", "5"]);
        assert_eq!(rows[2], ["0.5", "12", "14", "6"]);
        // Two header-bearing rows of data, no index column.
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn average_file_round_trips_the_replicate_means() {
        let dir = TempDir::new().unwrap();
        write_run(&sample_run(), dir.path()).unwrap();

        let rows = read_rows(&dir.path().join("growth_raw_data_average.csv"));
        assert_eq!(rows[0], ["time/days", "control", "treated"]);

        // Same row count as the source replicates, each value the
        // unweighted mean of that row's replicates.
        assert_eq!(rows.len(), 3);
        let control: Vec<f64> = rows[1..].iter().map(|r| r[1].parse().unwrap()).collect();
        assert!((control[0] - 15.0).abs() < 1e-12);
        assert!((control[1] - 13.0).abs() < 1e-12);

        let subtracted = read_rows(&dir.path().join("growth_subtracted_data_average.csv"));
        let control: Vec<f64> = subtracted[1..].iter().map(|r| r[1].parse().unwrap()).collect();
        assert!((control[0] - 2.0).abs() < 1e-12);
        assert!((control[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn short_columns_pad_with_empty_cells() {
        let dir = TempDir::new().unwrap();
        let run = aggregate_run(LoadedRun {
            experiments: vec![LoadedExperiment {
                name: "growth".to_string(),
                time: series(TIME_OUTPUT_NAME, &[0.0, 0.5, 1.0]),
                conditions: vec![LoadedCondition {
                    name: "control".to_string(),
                    raw: vec![series("control", &[1.0, 2.0, 3.0]), series("control", &[4.0])],
                    subtracted: vec![series("control", &[0.1]), series("control", &[0.2])],
                    raw_paths: Vec::new(),
                    subtracted_paths: Vec::new(),
                }],
            }],
        });
        write_run(&run, dir.path()).unwrap();

        let rows = read_rows(&dir.path().join("growth_raw_data_combined.csv"));
        assert_eq!(rows[1], ["0", "1", "4"]);
        assert_eq!(rows[2], ["0.5", "2", ""]);
        assert_eq!(rows[3], ["1", "3", ""]);

        // The subtracted series stop after one row; the time axis still
        // spans all three.
        let rows = read_rows(&dir.path().join("growth_subtracted_data_average.csv"));
        assert_eq!(rows[1], ["0", "0.15000000000000002"]);
        assert_eq!(rows[2], ["0.5", ""]);
        assert_eq!(rows[3], ["1", ""]);
    }

    #[test]
    fn creates_the_output_directory_with_parents() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out").join("batch_7");

        write_run(&sample_run(), &nested).unwrap();
        assert!(nested.join("growth_raw_data_average.csv").exists());
    }
}

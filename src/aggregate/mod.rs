//! Replicate combination and averaging.
//!
//! A condition's replicate series concatenate horizontally into a
//! [`ReplicateMatrix`] (rows align by position, not by any key), and the
//! averaged series is the unweighted arithmetic mean across the replicate
//! columns, row by row.
//!
//! Replicates of differing length are not rejected: the matrix is as tall
//! as its longest column, and each row's mean is taken over the values
//! present at that row (NaN when a row has none). Short columns surface as
//! empty cells when written out.

use std::path::PathBuf;

use crate::domain::{Phase, Series};
use crate::io::ingest::LoadedRun;

/// Ordered replicate columns for one condition and phase, aligned by row.
#[derive(Debug, Clone)]
pub struct ReplicateMatrix {
    pub columns: Vec<Series>,
}

impl ReplicateMatrix {
    pub fn new(columns: Vec<Series>) -> Self {
        Self { columns }
    }

    /// Height of the matrix: the longest replicate column.
    pub fn height(&self) -> usize {
        self.columns.iter().map(Series::len).max().unwrap_or(0)
    }

    /// Unweighted mean of the replicate values present at `row`; NaN when
    /// no column reaches that row.
    pub fn row_mean(&self, row: usize) -> f64 {
        let mut sum = 0.0;
        let mut n = 0usize;
        for column in &self.columns {
            if let Some(value) = column.values.get(row) {
                sum += value;
                n += 1;
            }
        }
        if n == 0 { f64::NAN } else { sum / n as f64 }
    }

    /// The averaged series over all rows.
    pub fn mean_series(&self, name: &str) -> Series {
        let values = (0..self.height()).map(|row| self.row_mean(row)).collect();
        Series::new(name, values)
    }
}

/// Combined matrix and averaged series for one phase of one condition.
#[derive(Debug, Clone)]
pub struct PhaseAggregate {
    pub combined: ReplicateMatrix,
    pub average: Series,
}

impl PhaseAggregate {
    fn from_columns(columns: Vec<Series>, condition_name: &str) -> Self {
        let combined = ReplicateMatrix::new(columns);
        let average = combined.mean_series(condition_name);
        Self { combined, average }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatedCondition {
    pub name: String,
    pub raw: PhaseAggregate,
    pub subtracted: PhaseAggregate,
    pub raw_paths: Vec<PathBuf>,
    pub subtracted_paths: Vec<PathBuf>,
}

impl AggregatedCondition {
    pub fn phase(&self, phase: Phase) -> &PhaseAggregate {
        match phase {
            Phase::Raw => &self.raw,
            Phase::Subtracted => &self.subtracted,
        }
    }

    pub fn phase_paths(&self, phase: Phase) -> &[PathBuf] {
        match phase {
            Phase::Raw => &self.raw_paths,
            Phase::Subtracted => &self.subtracted_paths,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatedExperiment {
    pub name: String,
    pub time: Series,
    pub conditions: Vec<AggregatedCondition>,
}

#[derive(Debug, Clone)]
pub struct AggregatedRun {
    pub experiments: Vec<AggregatedExperiment>,
}

/// Combine and average every condition of the loaded run.
pub fn aggregate_run(run: LoadedRun) -> AggregatedRun {
    let experiments = run
        .experiments
        .into_iter()
        .map(|experiment| AggregatedExperiment {
            name: experiment.name,
            time: experiment.time,
            conditions: experiment
                .conditions
                .into_iter()
                .map(|condition| AggregatedCondition {
                    raw: PhaseAggregate::from_columns(condition.raw, &condition.name),
                    subtracted: PhaseAggregate::from_columns(condition.subtracted, &condition.name),
                    name: condition.name,
                    raw_paths: condition.raw_paths,
                    subtracted_paths: condition.subtracted_paths,
                })
                .collect(),
        })
        .collect();

    AggregatedRun { experiments }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: &[f64]) -> Series {
        Series::new(name, values.to_vec())
    }

    #[test]
    fn single_row_replicates_average_to_their_mean() {
        // Three replicates at one time point: raw [10, 20, 30] -> 20,
        // subtracted [1, 2, 3] -> 2.
        let raw = ReplicateMatrix::new(vec![
            column("control", &[10.0]),
            column("control", &[20.0]),
            column("control", &[30.0]),
        ]);
        assert_eq!(raw.height(), 1);
        assert_eq!(raw.mean_series("control").values, [20.0]);

        let subtracted = ReplicateMatrix::new(vec![
            column("control", &[1.0]),
            column("control", &[2.0]),
            column("control", &[3.0]),
        ]);
        assert_eq!(subtracted.mean_series("control").values, [2.0]);
    }

    #[test]
    fn mean_is_computed_row_wise() {
        let matrix = ReplicateMatrix::new(vec![
            column("c", &[1.0, 10.0]),
            column("c", &[3.0, 20.0]),
        ]);
        assert_eq!(matrix.mean_series("c").values, [2.0, 15.0]);
    }

    #[test]
    fn ragged_columns_average_over_the_values_present() {
        let matrix = ReplicateMatrix::new(vec![
            column("c", &[1.0, 10.0, 100.0]),
            column("c", &[3.0, 20.0]),
        ]);
        assert_eq!(matrix.height(), 3);
        let mean = matrix.mean_series("c");
        assert_eq!(mean.values[0], 2.0);
        assert_eq!(mean.values[1], 15.0);
        // Only the longer replicate reaches row 2.
        assert_eq!(mean.values[2], 100.0);
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let matrix = ReplicateMatrix::new(Vec::new());
        assert_eq!(matrix.height(), 0);
        assert!(matrix.mean_series("c").is_empty());
        assert!(matrix.row_mean(0).is_nan());
    }
}

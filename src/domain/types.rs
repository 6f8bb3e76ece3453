//! Shared domain types.
//!
//! These types are intentionally lightweight: the pipeline passes a distinct
//! immutable value between stages (layout -> plan -> bound -> loaded ->
//! aggregated) instead of mutating one record in place, and the stage types
//! live next to the stage code. What lives here is the vocabulary every stage
//! shares.

use std::path::PathBuf;

use serde::Deserialize;

/// Resolved run options (CLI arguments after validation).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding the instrument CSV exports.
    pub data_dir: PathBuf,
    /// Experiment layout file (structured JSON or flat delimited text).
    pub layout_file: PathBuf,
    /// Directory the combined/average CSVs are written to.
    pub output_dir: PathBuf,
    /// Replicate measurements per condition; only used by flat layouts
    /// (structured layouts carry the replicate structure themselves).
    pub replicates: usize,
    /// Read only the first N experiment lines of a flat layout file.
    pub experiment_limit: Option<usize>,
}

/// The two measurement variants the instrument exports per replicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Raw,
    Subtracted,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Raw, Phase::Subtracted];

    /// Token used in output file names.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Raw => "raw",
            Phase::Subtracted => "subtracted",
        }
    }
}

/// One named column of numeric samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Which configuration shape a layout document uses.
///
/// The two shapes are mutually exclusive per run; the kind is resolved once
/// when the layout is read, not sniffed again per condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Conditions select pair indices into the sorted, paired file sequence.
    IndexBased,
    /// Conditions list their raw and subtracted files explicitly.
    PathBased,
}

/// One condition of a layout document.
///
/// Flat layouts always lower to `Indexed` with consecutive pair indices;
/// structured layouts may use either variant (but not both in one document).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConditionLayout {
    /// Select whole raw/subtracted pairs by index into the sorted sequence.
    Indexed { name: String, files: Vec<usize> },
    /// Name the raw and subtracted files directly; replicate `i` is
    /// `(raw[i], subtracted[i])`.
    Explicit {
        name: String,
        raw: Vec<String>,
        subtracted: Vec<String>,
    },
}

impl ConditionLayout {
    pub fn name(&self) -> &str {
        match self {
            ConditionLayout::Indexed { name, .. } => name,
            ConditionLayout::Explicit { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ConfigKind {
        match self {
            ConditionLayout::Indexed { .. } => ConfigKind::IndexBased,
            ConditionLayout::Explicit { .. } => ConfigKind::PathBased,
        }
    }
}

/// One experiment block of a layout document.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentLayout {
    pub name: String,
    pub conditions: Vec<ConditionLayout>,
}

/// A parsed layout document with its configuration kind settled.
#[derive(Debug, Clone)]
pub struct LayoutDoc {
    pub kind: ConfigKind,
    pub experiments: Vec<ExperimentLayout>,
}

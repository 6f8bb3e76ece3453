//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run options resolved from the CLI (`RunConfig`)
//! - the layout document vocabulary (`LayoutDoc`, `ConditionLayout`, `ConfigKind`)
//! - measurement vocabulary shared by every stage (`Phase`, `Series`)

pub mod types;

pub use types::*;

//! Input/output helpers.
//!
//! - layout (configuration) file reading (`layout`)
//! - data discovery + CSV loading (`ingest`)
//! - combined/average CSV writing (`export`)

pub mod export;
pub mod ingest;
pub mod layout;

pub use export::*;
pub use ingest::*;
pub use layout::*;

//! Input/output helpers.
//!
//! - benchmark file discovery (`discover`)
//! - CSV ingest + validation (`ingest`)
//! - CSV exports and simulated run directories (`export`)
//! - report JSON read/write (`results`)

pub mod discover;
pub mod export;
pub mod ingest;
pub mod results;

pub use discover::*;
pub use export::*;
pub use ingest::*;
pub use results::*;

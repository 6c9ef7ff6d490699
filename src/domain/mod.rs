//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - benchmark observations and their validation (`Observation`, `ObservationSet`)
//! - fit outputs (`FitResult`, `PointEstimate`, `DerivedMetrics`)
//! - invariant outputs (`InvariantReport`, `Evidence`)
//! - the run configuration (`AnalysisConfig`)

pub mod observation;
pub mod types;

pub use observation::*;
pub use types::*;

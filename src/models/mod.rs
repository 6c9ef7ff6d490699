//! The batched-service throughput model.
//!
//! Kept as small, pure functions so that the fitter, the reporting layer and
//! the synthetic data generator all evaluate the model the same way.

pub mod model;

pub use model::*;

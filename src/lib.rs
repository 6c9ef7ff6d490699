//! `tput-model` library crate.
//!
//! Fits the batched-service throughput model `T(p) = p / (t0 + t1 p)` to
//! benchmark observations and checks the pipeline invariants that relate
//! throughput, latency, concurrency and pipeline depth.
//!
//! The binary (`tput`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting core (`fit`, `invariants`) never touches I/O

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod invariants;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

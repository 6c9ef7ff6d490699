//! Model fitting and derived metrics.
//!
//! Responsibilities:
//!
//! - linearize observations and solve the closed-form regression (`fitter`)
//! - attach standard errors and Student-t confidence intervals (`fitter`)
//! - turn `(t0, t1)` into saturation throughput and knee depth (`derived`)

pub mod derived;
pub mod fitter;

pub use derived::*;
pub use fitter::*;

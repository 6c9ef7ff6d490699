//! Mathematical utilities: closed-form least squares and Student-t quantiles.

pub mod ols;
pub mod student_t;

pub use ols::*;
pub use student_t::*;

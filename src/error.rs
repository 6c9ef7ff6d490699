//! Error types.
//!
//! - `FitError` is the taxonomy returned by the fitting core. It never carries
//!   I/O concerns and is always an explicit failure result.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Failures of the model fitter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Not enough usable observations (or distinct pipeline depths) to fit.
    #[error("insufficient data: {found} usable {what}, need at least {required}")]
    InsufficientData {
        what: &'static str,
        found: usize,
        required: usize,
    },

    /// Confidence intervals were requested but the residual has no degrees of freedom.
    #[error(
        "degenerate fit: {degrees_of_freedom} residual degrees of freedom, \
         confidence intervals are undefined"
    )]
    DegenerateFit { degrees_of_freedom: usize },

    #[error("confidence level must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    /// A regression sum overflowed or otherwise became non-finite.
    #[error("non-finite {0} during regression")]
    NonFinite(&'static str),
}

/// Exit codes used by the `tput` binary.
pub mod exit {
    /// `tput validate` found a failing invariant.
    pub const INVARIANT: u8 = 1;
    pub const INPUT: u8 = 2;
    pub const INSUFFICIENT_DATA: u8 = 3;
    pub const FIT: u8 = 4;
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(exit::INPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let code = match err {
            FitError::InsufficientData { .. } => exit::INSUFFICIENT_DATA,
            FitError::InvalidConfidence(_) => exit::INPUT,
            FitError::DegenerateFit { .. } | FitError::NonFinite(_) => exit::FIT,
        };
        Self::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

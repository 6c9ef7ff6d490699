//! Invariant checks over observations and fitted parameters.
//!
//! Three checks share one report shape (`InvariantReport`) and one dispatch
//! point (`check`), so a check can switch from theoretical to measured evidence
//! without changing callers:
//!
//! - `closure`: `T · p50 <= C · p` on every latency-bearing sample (measured)
//! - `syscall`: expected `syscalls/op = 2 / (C · p)` curve (theoretical)
//! - `cycles`: `cycles/op ≈ t1_ns · f_GHz` point estimate (theoretical)
//!
//! No check short-circuits another.

pub mod closure;
pub mod cycles;
pub mod syscall;

pub use closure::*;
pub use cycles::*;
pub use syscall::*;

use crate::domain::{
    DEFAULT_CONCURRENCY, DEFAULT_CPU_GHZ, InvariantKind, InvariantReport, Observation,
};

/// External parameters of the invariant checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvariantConfig {
    /// Client connections `C`.
    pub concurrency: u32,
    /// Clock frequency for the cycles-per-op estimate.
    pub cpu_ghz: f64,
}

impl Default for InvariantConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            cpu_ghz: DEFAULT_CPU_GHZ,
        }
    }
}

/// Everything the checks may look at.
#[derive(Debug, Clone, Copy)]
pub struct InvariantInputs<'a> {
    pub observations: &'a [Observation],
    /// Depths for the theoretical syscall curve.
    pub depths: &'a [u32],
    /// Fitted marginal cost (seconds/op), if a fit succeeded.
    pub t1: Option<f64>,
}

/// Run one check.
pub fn check(
    kind: InvariantKind,
    inputs: &InvariantInputs<'_>,
    config: &InvariantConfig,
) -> InvariantReport {
    match kind {
        InvariantKind::PipelineClosure => {
            check_pipeline_closure(inputs.observations, config.concurrency)
        }
        InvariantKind::SyscallBudget => check_syscall_budget(inputs.depths, config.concurrency),
        InvariantKind::CyclesPerOpBand => check_cycles_per_op(inputs.t1, config.cpu_ghz),
    }
}

/// Run all three checks in a fixed order.
pub fn check_all(inputs: &InvariantInputs<'_>, config: &InvariantConfig) -> Vec<InvariantReport> {
    InvariantKind::ALL
        .iter()
        .map(|&kind| check(kind, inputs, config))
        .collect()
}

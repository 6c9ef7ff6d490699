//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and validation
//! - exported to JSON
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default number of client connections (`C`).
pub const DEFAULT_CONCURRENCY: u32 = 50;
/// Default two-sided confidence level for parameter intervals.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;
/// Below this many observations a fit is not trusted.
pub const RECOMMENDED_MIN_POINTS: usize = 5;
/// Clock frequency used for the cycles-per-op estimate.
pub const DEFAULT_CPU_GHZ: f64 = 3.5;

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// `center ± half_width`.
    pub fn around(center: f64, half_width: f64) -> Self {
        Self {
            lower: center - half_width,
            upper: center + half_width,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lower <= v && v <= self.upper
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            lower: self.lower * factor,
            upper: self.upper * factor,
        }
    }
}

/// Fitted `(t0, t1)` without confidence intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointEstimate {
    /// Fixed per-batch overhead (seconds/batch).
    pub t0: f64,
    /// Marginal per-operation cost (seconds/op).
    pub t1: f64,
    /// Coefficient of determination on the linearized (`p/T`) scale. Not clamped.
    pub r_squared: f64,
    pub sample_count: usize,
}

/// Output of the model fitter.
///
/// All values are in base units (seconds, ops/second). See `PaperUnits` for the
/// microsecond/nanosecond presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub t0: f64,
    pub t1: f64,
    pub r_squared: f64,
    pub t0_ci: Interval,
    pub t1_ci: Interval,
    pub t0_std_err: f64,
    pub t1_std_err: f64,
    /// Two-tailed Student-t critical value used for the intervals.
    pub t_critical: f64,
    pub confidence_level: f64,
    pub degrees_of_freedom: usize,
    pub sample_count: usize,
}

impl FitResult {
    pub fn point(&self) -> PointEstimate {
        PointEstimate {
            t0: self.t0,
            t1: self.t1,
            r_squared: self.r_squared,
            sample_count: self.sample_count,
        }
    }
}

/// Human units for reporting: microseconds per batch and nanoseconds per op.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperUnits {
    pub t0_us_per_batch: f64,
    pub t1_ns_per_op: f64,
    pub t0_ci_us: Option<Interval>,
    pub t1_ci_ns: Option<Interval>,
    /// Saturation throughput in Mops/s.
    pub t_max_mops: DerivedValue,
}

/// A derived figure that may be undefined (e.g. `1/t1` for `t1 <= 0`).
///
/// Serialized as a number, or `null` when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum DerivedValue {
    Finite(f64),
    Undefined,
}

impl DerivedValue {
    pub fn value(self) -> Option<f64> {
        match self {
            DerivedValue::Finite(v) => Some(v),
            DerivedValue::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, DerivedValue::Finite(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            DerivedValue::Finite(v) => DerivedValue::from(Some(f(v))),
            DerivedValue::Undefined => DerivedValue::Undefined,
        }
    }
}

impl From<Option<f64>> for DerivedValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => DerivedValue::Finite(v),
            _ => DerivedValue::Undefined,
        }
    }
}

impl From<DerivedValue> for Option<f64> {
    fn from(value: DerivedValue) -> Self {
        value.value()
    }
}

impl std::fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivedValue::Finite(v) => match f.precision() {
                Some(prec) => write!(f, "{v:.prec$}"),
                None => write!(f, "{v}"),
            },
            DerivedValue::Undefined => write!(f, "undefined"),
        }
    }
}

/// Secondary quantities computed from `(t0, t1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Saturation throughput `1/t1` (ops/second).
    pub t_max: DerivedValue,
    /// Depth where fixed and marginal costs are equal: `t0/t1`.
    pub knee_depth: DerivedValue,
    /// Throughput at the knee, `t_max / 2`.
    pub knee_throughput: DerivedValue,
}

/// The three system invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantKind {
    PipelineClosure,
    SyscallBudget,
    CyclesPerOpBand,
}

impl InvariantKind {
    pub const ALL: [InvariantKind; 3] = [
        InvariantKind::PipelineClosure,
        InvariantKind::SyscallBudget,
        InvariantKind::CyclesPerOpBand,
    ];

    /// Stable machine name.
    pub fn name(self) -> &'static str {
        match self {
            InvariantKind::PipelineClosure => "pipeline_closure",
            InvariantKind::SyscallBudget => "syscall_budget",
            InvariantKind::CyclesPerOpBand => "cycles_per_op_band",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            InvariantKind::PipelineClosure => "Pipeline Closure",
            InvariantKind::SyscallBudget => "Syscall Budget",
            InvariantKind::CyclesPerOpBand => "Cycles/op Band",
        }
    }
}

/// Whether a report's verdict rests on measured samples or on formulas alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceBasis {
    Measured,
    Theoretical,
}

/// One `lhs <= rhs` comparison at a pipeline depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundCheck {
    pub pipeline_depth: u32,
    pub lhs: f64,
    pub rhs: f64,
}

impl BoundCheck {
    pub fn holds(&self) -> bool {
        self.lhs <= self.rhs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyscallPoint {
    pub pipeline_depth: u32,
    pub syscalls_per_op: f64,
}

/// Check-specific supporting data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evidence {
    Closure {
        concurrency: u32,
        /// Every latency-bearing point tested, in depth order.
        points: Vec<BoundCheck>,
        skipped_without_latency: usize,
    },
    SyscallCurve {
        concurrency: u32,
        points: Vec<SyscallPoint>,
    },
    CyclesEstimate {
        frequency_ghz: f64,
        t1_ns_per_op: Option<f64>,
        cycles_per_op: Option<f64>,
    },
}

/// Result of one invariant check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub kind: InvariantKind,
    pub passed: bool,
    pub basis: EvidenceBasis,
    /// Offending points, in depth order. Empty when `passed`.
    pub violations: Vec<BoundCheck>,
    pub evidence: Evidence,
}

impl InvariantReport {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Benchmark directory or tidy CSV file.
    pub data_path: PathBuf,
    /// Concurrency assumed for records that do not state their own.
    pub concurrency: u32,
    /// Only analyse this concurrency group.
    pub clients_filter: Option<u32>,
    pub cpu_ghz: f64,
    pub confidence: f64,
    pub min_points: usize,
    /// Warn instead of failing below `min_points`.
    pub allow_sparse: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/bench"),
            concurrency: DEFAULT_CONCURRENCY,
            clients_filter: None,
            cpu_ghz: DEFAULT_CPU_GHZ,
            confidence: DEFAULT_CONFIDENCE,
            min_points: RECOMMENDED_MIN_POINTS,
            allow_sparse: false,
            plot: true,
            plot_width: 80,
            plot_height: 20,
            export_json: None,
            export_csv: None,
        }
    }
}

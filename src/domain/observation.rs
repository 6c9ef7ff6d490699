//! Benchmark observations and record-level validation.
//!
//! Loaders hand us `RawObservation`s whose fields may be missing or nonsensical.
//! `ObservationSet::from_raw` keeps the usable ones, counts the rest, and
//! orders the survivors by pipeline depth. Nothing here aborts a run.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One benchmark sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Number of in-flight requests per connection (`p >= 1`).
    pub pipeline_depth: u32,
    /// Measured request rate (ops/second, `> 0`).
    pub throughput: f64,
    /// Median latency in seconds, when the sample carries latency data.
    pub p50_latency: Option<f64>,
}

impl Observation {
    pub fn new(pipeline_depth: u32, throughput: f64) -> Self {
        Self {
            pipeline_depth,
            throughput,
            p50_latency: None,
        }
    }

    pub fn with_latency(mut self, p50_latency: f64) -> Self {
        self.p50_latency = Some(p50_latency);
        self
    }

    /// Seconds spent per batch-worth of work: `p / T`.
    pub fn seconds_per_batch(&self) -> f64 {
        self.pipeline_depth as f64 / self.throughput
    }
}

/// A loader record before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    /// Where the record came from (file name, `file:line`, ...).
    pub source: String,
    pub pipeline_depth: Option<i64>,
    pub throughput: Option<f64>,
    /// Median latency in seconds.
    pub p50_latency: Option<f64>,
}

/// A record dropped during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub source: String,
    pub reason: String,
}

/// An immutable, depth-ordered snapshot of usable observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    observations: Vec<Observation>,
    skipped: Vec<SkippedRecord>,
    latency_discarded: usize,
}

impl ObservationSet {
    /// Validate loader records.
    ///
    /// Records without a depth, with `depth < 1`, or without a positive finite
    /// throughput are skipped. An unusable latency is discarded but the record
    /// is kept for fitting.
    pub fn from_raw<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RawObservation>,
    {
        let mut observations = Vec::new();
        let mut skipped = Vec::new();
        let mut latency_discarded = 0usize;

        for raw in records {
            match validate(&raw) {
                Ok((obs, dropped_latency)) => {
                    if dropped_latency {
                        latency_discarded += 1;
                        warn!(source = %raw.source, "discarding non-positive p50 latency");
                    }
                    observations.push(obs);
                }
                Err(reason) => {
                    warn!(source = %raw.source, %reason, "skipping observation");
                    skipped.push(SkippedRecord {
                        source: raw.source,
                        reason,
                    });
                }
            }
        }

        let mut set = Self::from_observations(observations);
        set.skipped = skipped;
        set.latency_discarded = latency_discarded;
        set
    }

    /// Wrap already-valid observations, ordering them by depth.
    ///
    /// The sort is stable: duplicate depths keep their input order, which keeps
    /// the regression sums (and therefore the fit) bit-reproducible.
    pub fn from_observations(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.pipeline_depth);
        Self {
            observations,
            skipped: Vec::new(),
            latency_discarded: 0,
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn latency_discarded(&self) -> usize {
        self.latency_discarded
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Sorted, de-duplicated pipeline depths.
    pub fn distinct_depths(&self) -> Vec<u32> {
        let mut depths: Vec<u32> = self.observations.iter().map(|o| o.pipeline_depth).collect();
        depths.dedup();
        depths
    }

    pub fn with_latency(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter().filter(|o| o.p50_latency.is_some())
    }
}

fn validate(raw: &RawObservation) -> Result<(Observation, bool), String> {
    let depth = raw
        .pipeline_depth
        .ok_or_else(|| "missing pipeline depth".to_string())?;
    if depth < 1 {
        return Err(format!("pipeline depth must be >= 1, got {depth}"));
    }
    let depth = u32::try_from(depth).map_err(|_| format!("pipeline depth {depth} out of range"))?;

    let throughput = raw
        .throughput
        .ok_or_else(|| "missing throughput".to_string())?;
    if !(throughput.is_finite() && throughput > 0.0) {
        return Err(format!("throughput must be positive, got {throughput}"));
    }

    let mut obs = Observation::new(depth, throughput);
    let mut dropped_latency = false;
    match raw.p50_latency {
        Some(l) if l.is_finite() && l > 0.0 => obs.p50_latency = Some(l),
        Some(_) => dropped_latency = true,
        None => {}
    }

    Ok((obs, dropped_latency))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(source: &str, p: Option<i64>, t: Option<f64>, l: Option<f64>) -> RawObservation {
        RawObservation {
            source: source.to_string(),
            pipeline_depth: p,
            throughput: t,
            p50_latency: l,
        }
    }

    #[test]
    fn malformed_records_are_skipped_and_counted() {
        let set = ObservationSet::from_raw(vec![
            raw("a", Some(4), Some(1000.0), None),
            raw("b", None, Some(1000.0), None),
            raw("c", Some(0), Some(1000.0), None),
            raw("d", Some(2), Some(0.0), None),
            raw("e", Some(2), Some(f64::NAN), None),
            raw("f", Some(2), None, None),
            raw("g", Some(1), Some(500.0), Some(0.002)),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.skipped().len(), 5);
        let sources: Vec<&str> = set.skipped().iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["b", "c", "d", "e", "f"]);
    }

    #[test]
    fn observations_are_ordered_by_depth_and_stable() {
        let set = ObservationSet::from_raw(vec![
            raw("x", Some(8), Some(3.0), None),
            raw("y", Some(2), Some(1.0), None),
            raw("z", Some(8), Some(2.0), None),
        ]);
        let depths: Vec<u32> = set.observations().iter().map(|o| o.pipeline_depth).collect();
        assert_eq!(depths, vec![2, 8, 8]);
        // Duplicates keep input order.
        assert_eq!(set.observations()[1].throughput, 3.0);
        assert_eq!(set.observations()[2].throughput, 2.0);
        assert_eq!(set.distinct_depths(), vec![2, 8]);
    }

    #[test]
    fn bad_latency_is_dropped_but_record_kept() {
        let set = ObservationSet::from_raw(vec![raw("a", Some(3), Some(10.0), Some(-1.0))]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.observations()[0].p50_latency, None);
        assert_eq!(set.latency_discarded(), 1);
        assert_eq!(set.with_latency().count(), 0);
    }
}

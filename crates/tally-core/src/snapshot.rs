//! Instrumentation snapshots and deltas
//!
//! A [`Snapshot`] is an immutable metric map captured at one instant. The
//! runner subtracts a per-test baseline from later snapshots and forwards each
//! metric of the resulting [`Delta`] to the sink.

use crate::error::TallyResult;
use std::collections::BTreeMap;
use std::time::Duration;

/// Metric values captured at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<String, f64>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a metric
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Metrics in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Pointwise `self - baseline` over this snapshot's metrics
    ///
    /// A metric absent from the baseline counts as zero there.
    pub fn delta(&self, baseline: &Snapshot) -> Delta {
        let values = self
            .values
            .iter()
            .map(|(name, value)| {
                let base = baseline.values.get(name).copied().unwrap_or(0.0);
                (name.clone(), value - base)
            })
            .collect();
        Delta { values }
    }
}

impl FromIterator<(String, f64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Pointwise difference between two snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    values: Vec<(String, f64)>,
}

impl Delta {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stamp every metric with `timestamp`
    pub fn samples(&self, timestamp: Duration) -> impl Iterator<Item = Sample> + '_ {
        self.values.iter().map(move |(name, value)| Sample {
            timestamp,
            name: name.clone(),
            value: *value,
        })
    }
}

/// One instrumentation record
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Elapsed time since the test's stopwatch started
    pub timestamp: Duration,
    pub name: String,
    pub value: f64,
}

/// Produces snapshots on demand
///
/// Implementations must be side-effect free and cheap enough to call every
/// poll interval. A failure aborts the whole run.
pub trait SnapshotSource: Sync {
    fn snapshot(&self) -> TallyResult<Snapshot>;

    /// Best-effort hook run before each baseline capture (e.g. flushing
    /// allocator caches); the default does nothing
    fn collect(&self) {}
}

/// Source backed by a closure
pub struct FnSource<F>(F);

impl<F> FnSource<F>
where
    F: Fn() -> TallyResult<Snapshot> + Sync,
{
    pub fn new(f: F) -> Self {
        FnSource(f)
    }
}

impl<F> SnapshotSource for FnSource<F>
where
    F: Fn() -> TallyResult<Snapshot> + Sync,
{
    fn snapshot(&self) -> TallyResult<Snapshot> {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delta_is_pointwise() {
        let baseline = Snapshot::new().with("a", 10.0).with("b", 1.5);
        let current = Snapshot::new().with("a", 14.0).with("b", 1.0);

        let delta = current.delta(&baseline);

        assert_eq!(
            delta.iter().collect::<Vec<_>>(),
            vec![("a", 4.0), ("b", -0.5)]
        );
    }

    #[test]
    fn test_delta_missing_baseline_key_counts_as_zero() {
        let delta = Snapshot::new().with("fresh", 3.0).delta(&Snapshot::new());
        assert_eq!(delta.iter().collect::<Vec<_>>(), vec![("fresh", 3.0)]);
    }

    #[test]
    fn test_samples_share_timestamp() {
        let delta = Snapshot::new()
            .with("x", 2.0)
            .with("y", 3.0)
            .delta(&Snapshot::new());

        let samples: Vec<_> = delta.samples(Duration::from_millis(7)).collect();

        assert_eq!(samples.len(), 2);
        assert!(samples
            .iter()
            .all(|s| s.timestamp == Duration::from_millis(7)));
        assert_eq!(samples[1].name, "y");
    }

    #[test]
    fn test_fn_source() {
        let source = FnSource::new(|| Ok(Snapshot::new().with("k", 1.0)));
        assert_eq!(source.snapshot().unwrap().get("k"), Some(1.0));
    }
}

//! Result sinks - consumers of the run event protocol
//!
//! Every test produces `begin_test`, zero or more `add_scalar`, then
//! `end_test`; `finalize` closes the run exactly once. The runner and the
//! sampler only call a sink while holding the run lock, so implementations
//! need no synchronization of their own.

pub mod memory;

pub use memory::{MemorySink, SinkEvent};

use crate::error::{TallyResult, TestFailure};
use std::time::Duration;

/// Pluggable consumer of run events
pub trait ResultSink: Send {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()>;

    fn add_scalar(&mut self, timestamp: Duration, name: &str, value: f64) -> TallyResult<()>;

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()>;

    fn finalize(&mut self) -> TallyResult<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()> {
        (**self).begin_test(name, qualified_name)
    }

    fn add_scalar(&mut self, timestamp: Duration, name: &str, value: f64) -> TallyResult<()> {
        (**self).add_scalar(timestamp, name, value)
    }

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()> {
        (**self).end_test(duration, error)
    }

    fn finalize(&mut self) -> TallyResult<()> {
        (**self).finalize()
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()> {
        (**self).begin_test(name, qualified_name)
    }

    fn add_scalar(&mut self, timestamp: Duration, name: &str, value: f64) -> TallyResult<()> {
        (**self).add_scalar(timestamp, name, value)
    }

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()> {
        (**self).end_test(duration, error)
    }

    fn finalize(&mut self) -> TallyResult<()> {
        (**self).finalize()
    }
}

/// Forwards every event to several sinks, in insertion order
///
/// The first sink error stops the fan-out and is returned.
#[derive(Default)]
pub struct MultiSink<'a> {
    sinks: Vec<Box<dyn ResultSink + 'a>>,
}

impl<'a> MultiSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: impl ResultSink + 'a) -> Self {
        self.push(sink);
        self
    }

    pub fn push(&mut self, sink: impl ResultSink + 'a) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResultSink for MultiSink<'_> {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()> {
        self.sinks
            .iter_mut()
            .try_for_each(|s| s.begin_test(name, qualified_name))
    }

    fn add_scalar(&mut self, timestamp: Duration, name: &str, value: f64) -> TallyResult<()> {
        self.sinks
            .iter_mut()
            .try_for_each(|s| s.add_scalar(timestamp, name, value))
    }

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()> {
        self.sinks
            .iter_mut()
            .try_for_each(|s| s.end_test(duration, error))
    }

    fn finalize(&mut self) -> TallyResult<()> {
        self.sinks.iter_mut().try_for_each(|s| s.finalize())
    }
}

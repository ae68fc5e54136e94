//! Run-scoped shared state
//!
//! The runner and the sampler cooperate only through [`Shared`]: one mutex
//! over [`RunState`] and one condition variable, always woken with
//! `notify_all` because both sides wait on it at different times.

use crate::error::{TallyError, TallyResult};
use crate::sink::ResultSink;
use crate::snapshot::{Delta, Snapshot};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub(crate) struct RunState<'s> {
    /// True exactly while a test body is executing
    pub(crate) running: bool,
    /// Set once to stop the sampler
    pub(crate) quit: bool,
    /// Sampler has observed `running == false`; gates the next test start
    pub(crate) instruments_ready: bool,
    /// Snapshot captured just before the current test started
    pub(crate) baseline: Snapshot,
    /// Stopwatch origin of the current test
    pub(crate) started: Option<Instant>,
    /// First fatal error raised away from the runner's own call stack
    pub(crate) fault: Option<TallyError>,
    pub(crate) sink: &'s mut dyn ResultSink,
}

impl RunState<'_> {
    /// Time since the current test's stopwatch started
    pub(crate) fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Forward every metric of `delta` to the sink stamped with `timestamp`
    pub(crate) fn emit_delta(&mut self, delta: &Delta, timestamp: Duration) -> TallyResult<()> {
        for sample in delta.samples(timestamp) {
            self.sink
                .add_scalar(sample.timestamp, &sample.name, sample.value)?;
        }
        Ok(())
    }

    /// Keep the first fault only
    pub(crate) fn record_fault(&mut self, error: TallyError) {
        if self.fault.is_none() {
            self.fault = Some(error);
        }
    }
}

pub(crate) struct Shared<'s> {
    state: Mutex<RunState<'s>>,
    cond: Condvar,
}

impl<'s> Shared<'s> {
    pub(crate) fn new(sink: &'s mut dyn ResultSink) -> Self {
        Self {
            state: Mutex::new(RunState {
                running: false,
                quit: false,
                instruments_ready: false,
                baseline: Snapshot::new(),
                started: None,
                fault: None,
                sink,
            }),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RunState<'s>> {
        self.state.lock()
    }

    pub(crate) fn wait(&self, guard: &mut MutexGuard<'_, RunState<'s>>) {
        self.cond.wait(guard);
    }

    pub(crate) fn notify(&self) {
        self.cond.notify_all();
    }

    /// Ask the sampler to exit
    pub(crate) fn request_quit(&self) {
        let mut state = self.lock();
        state.quit = true;
        self.notify();
    }

    /// Record a fatal error and wake every waiter so it is noticed
    pub(crate) fn fail(&self, guard: &mut MutexGuard<'_, RunState<'s>>, error: TallyError) {
        guard.record_fault(error);
        self.notify();
    }
}

/// Scalar emission from inside a test body
pub(crate) trait ScalarChannel: Sync {
    fn record(&self, name: &str, value: f64);
}

impl ScalarChannel for Shared<'_> {
    fn record(&self, name: &str, value: f64) {
        let mut state = self.lock();
        if !state.running {
            return;
        }
        let timestamp = state.elapsed();
        if let Err(error) = state.sink.add_scalar(timestamp, name, value) {
            self.fail(&mut state, error);
        }
    }
}

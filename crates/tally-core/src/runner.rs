//! Test runner - sequential execution with concurrent sampling
//!
//! Each test moves through `AwaitingInstrumentsReady -> Running -> Completing`
//! in lock-step with the sampler thread. The runner never starts a test until
//! the sampler has acknowledged the end of the previous one, and it stops the
//! test's stopwatch under the same lock acquisition that clears `running`, so
//! every periodic sample of a test is stamped no later than its final delta.

use crate::alloc::AllocationSource;
use crate::context::TestContext;
use crate::discovery::{DiscoveryOptions, TestSuite};
use crate::error::{TallyError, TallyResult, TestFailure};
use crate::namespace::{NamespaceNode, TestCase};
use crate::outcome::{RunSummary, TestOutcome};
use crate::sampler::{Sampler, DEFAULT_POLL_INTERVAL};
use crate::sink::ResultSink;
use crate::snapshot::SnapshotSource;
use crate::state::Shared;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

static RUN_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Process-wide "a run is active" token
///
/// At most one guard exists at a time; dropping it ends the run.
#[derive(Debug)]
pub struct RunGuard {
    _private: (),
}

impl RunGuard {
    pub fn acquire() -> TallyResult<Self> {
        RUN_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| RunGuard { _private: () })
            .map_err(|_| TallyError::RunInProgress)
    }

    /// Whether some run currently holds the guard
    pub fn is_active() -> bool {
        RUN_ACTIVE.load(Ordering::Acquire)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        RUN_ACTIVE.store(false, Ordering::Release);
    }
}

/// Discovers and executes tests, streaming events to a [`ResultSink`]
///
/// Tests run one at a time on the calling thread. A test body that never
/// returns blocks the run indefinitely; there is no timeout.
///
/// # Example
///
/// ```
/// use tally_core::namespace::Namespace;
/// use tally_core::runner::TestRunner;
/// use tally_core::sink::MemorySink;
///
/// let root = Namespace::package("app")
///     .test("adds", |_| {
///         anyhow::ensure!(1 + 1 == 2, "math is broken");
///         Ok(())
///     })
///     .build();
///
/// let mut sink = MemorySink::new();
/// let passed = TestRunner::default().run_all(root.as_ref(), &mut sink).unwrap();
/// assert!(passed);
/// ```
#[derive(Debug, Clone)]
pub struct TestRunner<S> {
    source: S,
    poll_interval: Duration,
    discovery: DiscoveryOptions,
}

impl Default for TestRunner<AllocationSource> {
    fn default() -> Self {
        Self::new(AllocationSource)
    }
}

impl<S: SnapshotSource> TestRunner<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
            discovery: DiscoveryOptions::default(),
        }
    }

    /// Set the sampler's poll period
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_discovery(mut self, options: DiscoveryOptions) -> Self {
        self.discovery = options;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run every test under `root` and return the aggregate verdict
    pub fn run_all(&self, root: &dyn NamespaceNode, sink: &mut dyn ResultSink) -> TallyResult<bool> {
        self.run(root, sink).map(|summary| summary.all_passed())
    }

    /// Run every test under `root`
    ///
    /// Test failures are recorded in the summary. Snapshot, sink, and sampler
    /// failures abort the run and are returned as errors; in that case
    /// `finalize` is not called.
    pub fn run(&self, root: &dyn NamespaceNode, sink: &mut dyn ResultSink) -> TallyResult<RunSummary> {
        let _guard = RunGuard::acquire()?;
        let shared = Shared::new(sink);
        let source: &dyn SnapshotSource = &self.source;

        thread::scope(|scope| {
            let sampler = Sampler::start(scope, &shared, source, self.poll_interval)?;

            let suite = TestSuite::discover(root, &self.discovery);
            tracing::debug!(root = root.path(), tests = suite.len(), "run started");

            let result = self.drive(&shared, &suite);
            sampler.request_stop();
            let joined = sampler.join();

            let summary = result?;
            joined?;
            if let Some(fault) = shared.lock().fault.take() {
                return Err(fault);
            }
            tracing::debug!(
                passed = summary.passed(),
                failed = summary.failed(),
                "run finished"
            );
            Ok(summary)
        })
    }

    fn drive(&self, shared: &Shared<'_>, suite: &TestSuite) -> TallyResult<RunSummary> {
        let mut outcomes = Vec::with_capacity(suite.len());
        for test in suite {
            outcomes.push(self.run_test(shared, test)?);
        }

        let mut state = shared.lock();
        if let Some(fault) = state.fault.take() {
            return Err(fault);
        }
        state.sink.finalize()?;
        Ok(RunSummary::new(outcomes))
    }

    fn run_test(&self, shared: &Shared<'_>, test: &TestCase) -> TallyResult<TestOutcome> {
        {
            let mut state = shared.lock();
            while !state.instruments_ready && state.fault.is_none() {
                shared.wait(&mut state);
            }
            if let Some(fault) = state.fault.take() {
                return Err(fault);
            }
            state
                .sink
                .begin_test(&test.display_name, &test.qualified_name)?;
        }

        self.source.collect();
        let baseline = self.source.snapshot()?;
        {
            let mut state = shared.lock();
            state.baseline = baseline;
            state.instruments_ready = false;
            state.started = Some(Instant::now());
            state.running = true;
            shared.notify();
        }
        tracing::debug!(test = %test.qualified_name, "test started");

        let ctx = TestContext::attached(&test.qualified_name, shared);
        let error = match panic::catch_unwind(AssertUnwindSafe(|| test.invoke(&ctx))) {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(TestFailure::from_error(&error)),
            Err(payload) => Some(TestFailure::from_panic(payload.as_ref())),
        };

        let mut state = shared.lock();
        let duration = state.elapsed();
        let last = self.source.snapshot();
        state.running = false;
        state.started = None;
        shared.notify();

        let delta = last?.delta(&state.baseline);
        state.emit_delta(&delta, duration)?;
        if let Some(fault) = state.fault.take() {
            return Err(fault);
        }
        state.sink.end_test(duration, error.as_ref())?;
        drop(state);

        tracing::debug!(
            test = %test.qualified_name,
            ?duration,
            passed = error.is_none(),
            "test finished"
        );

        Ok(TestOutcome {
            qualified_name: test.qualified_name.clone(),
            display_name: test.display_name.clone(),
            duration,
            error,
        })
    }
}

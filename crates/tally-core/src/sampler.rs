//! Background sampler
//!
//! While a test is running the sampler wakes every poll interval, takes a
//! snapshot, and forwards its delta against the test's baseline to the sink.
//! Between tests it parks on the shared condition variable and raises
//! `instruments_ready` so the runner knows the previous test's end has been
//! observed.

use crate::error::{TallyError, TallyResult};
use crate::snapshot::SnapshotSource;
use crate::state::Shared;
use parking_lot::MutexGuard;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Duration;

/// Default sampling period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to the sampler thread of one run
pub(crate) struct Sampler<'scope, 's> {
    handle: Option<ScopedJoinHandle<'scope, ()>>,
    shared: &'scope Shared<'s>,
}

impl<'scope, 's> Sampler<'scope, 's> {
    /// Spawn the sampler inside `scope`
    pub(crate) fn start<'env>(
        scope: &'scope Scope<'scope, 'env>,
        shared: &'env Shared<'s>,
        source: &'env dyn SnapshotSource,
        interval: Duration,
    ) -> TallyResult<Self> {
        let handle = thread::Builder::new()
            .name("tally-sampler".to_string())
            .spawn_scoped(scope, move || sample_loop(shared, source, interval))
            .map_err(TallyError::SamplerSpawn)?;

        Ok(Self {
            handle: Some(handle),
            shared,
        })
    }

    /// Signal the sampler to exit; pair with [`Sampler::join`]
    pub(crate) fn request_stop(&self) {
        self.shared.request_quit();
    }

    /// Wait for the sampler thread to finish
    pub(crate) fn join(mut self) -> TallyResult<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| TallyError::SamplerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for Sampler<'_, '_> {
    fn drop(&mut self) {
        // Unwinding runner: make sure the scope can still join the thread
        if self.handle.is_some() {
            self.shared.request_quit();
        }
    }
}

/// Turns a panic on the sampler thread into a run fault so the runner
/// never waits on a dead thread
struct PanicFault<'a, 's>(&'a Shared<'s>);

impl Drop for PanicFault<'_, '_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut state = self.0.lock();
            self.0.fail(&mut state, TallyError::SamplerPanicked);
        }
    }
}

fn sample_loop(shared: &Shared<'_>, source: &dyn SnapshotSource, interval: Duration) {
    let _panic_fault = PanicFault(shared);
    let mut state = shared.lock();
    loop {
        if state.quit {
            break;
        }

        if !state.running {
            // Re-asserted on every idle wakeup: the runner may have started
            // and finished a test before this thread was scheduled.
            state.instruments_ready = true;
            shared.notify();
            shared.wait(&mut state);
            continue;
        }
        state.instruments_ready = false;

        let snapshot = MutexGuard::unlocked(&mut state, || {
            thread::sleep(interval);
            source.snapshot()
        });

        // A sample taken across the end of a test belongs to nobody, its
        // error included: the runner has already passed its last fault check.
        if !state.running {
            tracing::trace!(
                failed = snapshot.is_err(),
                "test ended during sampling, discarding sample"
            );
            continue;
        }

        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::debug!(%error, "sampler snapshot failed");
                shared.fail(&mut state, error);
                break;
            }
        };

        let timestamp = state.elapsed();
        let delta = snapshot.delta(&state.baseline);
        tracing::trace!(?timestamp, metrics = delta.len(), "periodic sample");
        if let Err(error) = state.emit_delta(&delta, timestamp) {
            shared.fail(&mut state, error);
            break;
        }
    }
    tracing::trace!("sampler stopped");
}

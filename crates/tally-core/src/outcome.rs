//! Per-test outcomes and the aggregate run summary

use crate::error::TestFailure;
use std::time::Duration;

/// Result of executing one test case
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub qualified_name: String,
    pub display_name: String,
    pub duration: Duration,
    /// Present iff the body returned an error or panicked
    pub error: Option<TestFailure>,
}

impl TestOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a finished run, in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    pub fn new(outcomes: Vec<TestOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// True iff every test succeeded; vacuously true for an empty run
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(TestOutcome::is_success)
    }

    /// Sum of test durations (excludes discovery and sampler hand-off time)
    pub fn total_duration(&self) -> Duration {
        self.outcomes.iter().map(|o| o.duration).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

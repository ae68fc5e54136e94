//! In-memory sink that records every event

use super::ResultSink;
use crate::error::{TallyResult, TestFailure};
use crate::snapshot::Sample;
use std::time::Duration;

/// One recorded sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Begin {
        name: String,
        qualified_name: String,
    },
    Scalar(Sample),
    End {
        duration: Duration,
        error: Option<String>,
    },
    Finalize,
}

/// Sink that keeps the event log for later inspection
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Vec<SinkEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SinkEvent> {
        self.events
    }

    /// Recorded scalars, in arrival order
    pub fn scalars(&self) -> impl Iterator<Item = &Sample> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Scalar(sample) => Some(sample),
            _ => None,
        })
    }

    pub fn count_begins(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Begin { .. }))
            .count()
    }

    pub fn count_ends(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::End { .. }))
            .count()
    }
}

impl ResultSink for MemorySink {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()> {
        self.events.push(SinkEvent::Begin {
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
        });
        Ok(())
    }

    fn add_scalar(&mut self, timestamp: Duration, name: &str, value: f64) -> TallyResult<()> {
        self.events.push(SinkEvent::Scalar(Sample {
            timestamp,
            name: name.to_string(),
            value,
        }));
        Ok(())
    }

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()> {
        self.events.push(SinkEvent::End {
            duration,
            error: error.map(|e| e.message.clone()),
        });
        Ok(())
    }

    fn finalize(&mut self) -> TallyResult<()> {
        self.events.push(SinkEvent::Finalize);
        Ok(())
    }
}

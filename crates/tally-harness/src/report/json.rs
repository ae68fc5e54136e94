//! JSON reporter - machine-readable results, one record per test
//!
//! The output is a single JSON array written incrementally: each record is
//! flushed as soon as its test ends, and the closing bracket is written by
//! `finalize`. A run aborted by a fatal error leaves an unterminated array.

use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tally_core::{ResultSink, TallyError, TallyResult, TestFailure};

/// One instrumentation sample inside a [`TestRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentationRecord {
    pub name: String,
    pub value: f64,
    /// Seconds since the test's stopwatch started
    pub timestamp: f64,
}

/// Serialized form of one finished test
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub name: String,
    pub qualified_name: String,
    pub instrumentation: Vec<InstrumentationRecord>,
    pub success: bool,
    /// Seconds
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct JsonSink<W: Write> {
    out: W,
    current: Option<TestRecord>,
    written: usize,
    finalized: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            current: None,
            written: 0,
            finalized: false,
        }
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn open(&mut self) -> TallyResult<&mut TestRecord> {
        self.current
            .as_mut()
            .ok_or_else(|| TallyError::SinkRejected("no test in progress".to_string()))
    }

    fn write_record(&mut self, record: &TestRecord) -> io::Result<()> {
        let separator = if self.written == 0 { "[\n" } else { ",\n" };
        self.out.write_all(separator.as_bytes())?;
        serde_json::to_writer(&mut self.out, record)?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }
}

impl<W: Write + Send> ResultSink for JsonSink<W> {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()> {
        if self.current.is_some() {
            return Err(TallyError::SinkRejected(format!(
                "begin_test({}) while another test is open",
                qualified_name
            )));
        }
        self.current = Some(TestRecord {
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            instrumentation: Vec::new(),
            success: false,
            duration: 0.0,
            message: None,
        });
        Ok(())
    }

    fn add_scalar(&mut self, timestamp: Duration, name: &str, value: f64) -> TallyResult<()> {
        self.open()?.instrumentation.push(InstrumentationRecord {
            name: name.to_string(),
            value,
            timestamp: timestamp.as_secs_f64(),
        });
        Ok(())
    }

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()> {
        let mut record = self
            .current
            .take()
            .ok_or_else(|| TallyError::SinkRejected("end_test without begin_test".to_string()))?;
        record.success = error.is_none();
        record.duration = duration.as_secs_f64();
        record.message = error.map(|e| e.message.clone());

        self.write_record(&record)?;
        Ok(())
    }

    fn finalize(&mut self) -> TallyResult<()> {
        if self.finalized {
            return Err(TallyError::SinkRejected("finalize called twice".to_string()));
        }
        self.finalized = true;

        let closing: &[u8] = if self.written == 0 { b"[]\n" } else { b"\n]\n" };
        self.out.write_all(closing)?;
        self.out.flush()?;
        Ok(())
    }
}

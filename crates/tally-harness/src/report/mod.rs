//! Result reporters for harness processes

pub mod console;
pub mod json;

pub use console::ConsoleSink;
pub use json::{InstrumentationRecord, JsonSink, TestRecord};

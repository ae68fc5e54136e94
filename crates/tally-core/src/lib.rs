//! Tally Core
//!
//! A test-execution engine that:
//! - Discovers tests in a namespace tree, visiting each container once
//! - Runs them one at a time, capturing errors and panics per test
//! - Samples runtime instrumentation on a background thread while each test runs
//! - Streams results to pluggable [`ResultSink`]s
//!
//! # Example
//!
//! ```
//! use tally_core::{MemorySink, Namespace, TestRunner};
//!
//! let root = Namespace::package("app")
//!     .test("records", |ctx| {
//!         ctx.record("items", 3.0);
//!         Ok(())
//!     })
//!     .test("fails", |_| anyhow::bail!("boom"))
//!     .build();
//!
//! let mut sink = MemorySink::new();
//! let summary = TestRunner::default().run(root.as_ref(), &mut sink).unwrap();
//! assert_eq!(summary.failed(), 1);
//! ```

pub mod alloc;
pub mod context;
pub mod discovery;
pub mod error;
pub mod namespace;
pub mod outcome;
pub mod runner;
pub mod sampler;
pub mod sink;
pub mod snapshot;

mod state;

pub use alloc::{AllocationSource, AllocationStats, CountingAllocator};
pub use context::TestContext;
pub use discovery::{DiscoveryOptions, TestSuite, DEFAULT_EXCLUDED_PREFIXES};
pub use error::{TallyError, TallyResult, TestFailure};
pub use namespace::{Namespace, NamespaceBuilder, NamespaceNode, NodeId, NodeKind, TestCase};
pub use outcome::{RunSummary, TestOutcome};
pub use runner::{RunGuard, TestRunner};
pub use sampler::DEFAULT_POLL_INTERVAL;
pub use sink::{MemorySink, MultiSink, ResultSink, SinkEvent};
pub use snapshot::{Delta, FnSource, Sample, Snapshot, SnapshotSource};

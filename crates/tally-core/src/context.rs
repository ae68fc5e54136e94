//! Per-test context handed to test bodies

use crate::state::ScalarChannel;

/// Handle through which a running test reports custom instrumentation
///
/// Scalars recorded here are stamped with the test's stopwatch and delivered
/// to the sink between `begin_test` and `end_test`. Recording outside an
/// active test is a silent no-op.
pub struct TestContext<'r> {
    qualified_name: &'r str,
    channel: Option<&'r dyn ScalarChannel>,
}

impl<'r> TestContext<'r> {
    pub(crate) fn attached(qualified_name: &'r str, channel: &'r dyn ScalarChannel) -> Self {
        Self {
            qualified_name,
            channel: Some(channel),
        }
    }

    /// Context that is not connected to any run
    pub fn detached(qualified_name: &'r str) -> Self {
        Self {
            qualified_name,
            channel: None,
        }
    }

    /// Qualified name of the test being executed
    pub fn qualified_name(&self) -> &str {
        self.qualified_name
    }

    /// Emit a named scalar for this test
    pub fn record(&self, name: &str, value: f64) {
        if let Some(channel) = self.channel {
            channel.record(name, value);
        }
    }
}

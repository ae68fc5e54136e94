//! Console reporter - human-readable test results

use colored::*;
use std::io::{self, Write};
use std::time::Duration;
use tally_core::{ResultSink, TallyError, TallyResult, TestFailure};

struct Finished {
    name: String,
    qualified_name: String,
    duration: Duration,
    error: Option<String>,
}

/// Prints one line (verbose) or one character (quiet) per test, then a tally
/// and the details of every failure
pub struct ConsoleSink<W: Write = io::Stdout> {
    out: W,
    /// Show detailed output for each test
    verbose: bool,
    color: bool,
    /// `(label, qualified name)` of the open test
    current: Option<(String, String)>,
    finished: Vec<Finished>,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            color: true,
            current: None,
            finished: Vec::new(),
        }
    }

    /// Enable or disable ANSI colors
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: ColoredString) -> ColoredString {
        if self.color {
            text
        } else {
            text.clear()
        }
    }

    fn print_summary(&mut self) -> io::Result<()> {
        let total = self.finished.len();
        let failed = self.finished.iter().filter(|f| f.error.is_some()).count();
        let passed = total - failed;
        let total_duration: Duration = self.finished.iter().map(|f| f.duration).sum();

        let status = if failed > 0 {
            self.paint("FAILED".red().bold())
        } else {
            self.paint("PASSED".green().bold())
        };
        let total_text = self.paint(total.to_string().bold());
        let passed_text = self.paint(passed.to_string().green().bold());
        let failed_text = if failed > 0 {
            self.paint(failed.to_string().red().bold())
        } else {
            failed.to_string().normal()
        };

        writeln!(self.out, "{}", "─".repeat(50))?;
        writeln!(
            self.out,
            "Test result: {} | {} total, {} passed, {} failed",
            status, total_text, passed_text, failed_text
        )?;
        writeln!(self.out, "Time: {:.2?}", total_duration)
    }

    fn print_failures(&mut self) -> io::Result<()> {
        if self.finished.iter().all(|f| f.error.is_none()) {
            return Ok(());
        }

        let heading = self.paint("Failures:".red().bold());
        writeln!(self.out)?;
        writeln!(self.out, "{}", heading)?;
        writeln!(self.out)?;

        let color = self.color;
        let paint = |text: ColoredString| if color { text } else { text.clear() };
        for finished in self.finished.iter().filter(|f| f.error.is_some()) {
            writeln!(self.out, "  {} {}", paint("●".red()), finished.qualified_name)?;
            if finished.name != finished.qualified_name {
                writeln!(self.out, "    {}", paint(finished.name.as_str().bold()))?;
            }
            for line in finished.error.as_deref().unwrap_or_default().lines() {
                writeln!(self.out, "      {}", paint(line.dimmed()))?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> ResultSink for ConsoleSink<W> {
    fn begin_test(&mut self, name: &str, qualified_name: &str) -> TallyResult<()> {
        let label = if name.is_empty() { qualified_name } else { name };
        self.current = Some((label.to_string(), qualified_name.to_string()));
        Ok(())
    }

    fn add_scalar(&mut self, _timestamp: Duration, _name: &str, _value: f64) -> TallyResult<()> {
        Ok(())
    }

    fn end_test(&mut self, duration: Duration, error: Option<&TestFailure>) -> TallyResult<()> {
        let (name, qualified_name) = self
            .current
            .take()
            .ok_or_else(|| TallyError::SinkRejected("end_test without begin_test".to_string()))?;

        match (error.is_some(), self.verbose) {
            (false, true) => {
                let tag = self.paint("PASS".green().bold());
                writeln!(self.out, "{} {} ({:.2?})", tag, name, duration)?;
            }
            (true, true) => {
                let tag = self.paint("FAIL".red().bold());
                writeln!(self.out, "{} {} ({:.2?})", tag, name, duration)?;
            }
            (false, false) => {
                let dot = self.paint(".".green());
                write!(self.out, "{}", dot)?;
                self.out.flush()?;
            }
            (true, false) => {
                let mark = self.paint("F".red().bold());
                write!(self.out, "{}", mark)?;
                self.out.flush()?;
            }
        }

        self.finished.push(Finished {
            name,
            qualified_name,
            duration,
            error: error.map(|e| e.message.clone()),
        });
        Ok(())
    }

    fn finalize(&mut self) -> TallyResult<()> {
        // Dots need a newline before the summary
        if !self.verbose && !self.finished.is_empty() {
            writeln!(self.out)?;
        }
        writeln!(self.out)?;
        self.print_summary()?;
        self.print_failures()?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(verbose: bool, drive: impl FnOnce(&mut ConsoleSink<Vec<u8>>)) -> String {
        let mut sink = ConsoleSink::new(Vec::new(), verbose).with_color(false);
        drive(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    fn pass(sink: &mut ConsoleSink<Vec<u8>>, name: &str, qualified: &str) {
        sink.begin_test(name, qualified).unwrap();
        sink.add_scalar(Duration::ZERO, "alloc.count", 1.0).unwrap();
        sink.end_test(Duration::from_millis(10), None).unwrap();
    }

    fn fail(sink: &mut ConsoleSink<Vec<u8>>, qualified: &str, message: &str) {
        sink.begin_test("", qualified).unwrap();
        sink.end_test(Duration::from_millis(5), Some(&TestFailure::new(message)))
            .unwrap();
    }

    #[test]
    fn test_reporter_all_pass() {
        let output = render(true, |sink| {
            pass(sink, "", "app::one");
            pass(sink, "Second test", "app::two");
            sink.finalize().unwrap();
        });

        assert!(output.contains("PASS app::one ("));
        assert!(output.contains("PASS Second test ("));
        assert!(output.contains("Test result: PASSED | 2 total, 2 passed, 0 failed"));
        assert!(!output.contains("Failures:"));
    }

    #[test]
    fn test_reporter_with_failures() {
        let output = render(true, |sink| {
            pass(sink, "", "app::ok");
            fail(sink, "app::broken", "assertion failed\nleft: 1\nright: 2");
            sink.finalize().unwrap();
        });

        assert!(output.contains("FAIL app::broken ("));
        assert!(output.contains("Test result: FAILED | 2 total, 1 passed, 1 failed"));
        assert!(output.contains("Failures:"));
        assert!(output.contains("  ● app::broken\n"));
        assert!(output.contains("      assertion failed\n      left: 1\n      right: 2\n"));
    }

    #[test]
    fn test_reporter_quiet_mode() {
        let output = render(false, |sink| {
            pass(sink, "", "app::one");
            fail(sink, "app::two", "boom");
            pass(sink, "", "app::three");
            sink.finalize().unwrap();
        });

        assert_eq!(output.lines().next(), Some(".F."));
    }

    #[test]
    fn test_reporter_empty() {
        let output = render(true, |sink| sink.finalize().unwrap());
        assert!(output.contains("0 total, 0 passed, 0 failed"));
    }

    #[test]
    fn test_end_without_begin_is_rejected() {
        let mut sink = ConsoleSink::new(Vec::new(), true);
        assert!(matches!(
            sink.end_test(Duration::ZERO, None),
            Err(TallyError::SinkRejected(_))
        ));
    }
}

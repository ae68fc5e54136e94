//! Tally Harness
//!
//! Entry point for custom test targets (`harness = false`). Build a
//! namespace, hand it to [`main`], and return the exit code:
//!
//! ```no_run
//! use std::process::ExitCode;
//! use tally_core::{CountingAllocator, Namespace};
//!
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator::system();
//!
//! fn main() -> ExitCode {
//!     let root = Namespace::package("app")
//!         .test("adds", |_| {
//!             anyhow::ensure!(2 + 2 == 4);
//!             Ok(())
//!         })
//!         .build();
//!     tally_harness::main(root.as_ref())
//! }
//! ```
//!
//! Exit codes: `0` when every test passed, `1` when any test failed, `2` when
//! the run itself could not complete.

pub mod logging;
pub mod report;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tally_config::{Config, ConfigLoader};
use tally_core::{DiscoveryOptions, MultiSink, NamespaceNode, TestRunner};

pub use report::{ConsoleSink, JsonSink};

/// Command-line options of a tally test target.
///
/// Arguments the harness does not recognise (such as flags forwarded by
/// `cargo test`) are collected and ignored. Malformed values for the flags
/// it does recognise are errors.
///
/// ENVIRONMENT VARIABLES:
///     TALLY_POLL_INTERVAL_MS  Sampler period in milliseconds
///     TALLY_VERBOSE           Set to '1' for one line per test
///     TALLY_JSON              Write JSON results to this path
///     NO_COLOR                Set to disable colored output
///     RUST_LOG                Diagnostic log filter (default: warn)
#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "tally")]
pub struct HarnessArgs {
    /// Print one line per test instead of one character
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Print one character per test, overriding configured verbosity
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Also write results as a JSON array to PATH
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Sampler poll period in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Use this project config file instead of searching for tally.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Unrecognised arguments
    #[arg(hide = true, allow_hyphen_values = true)]
    pub passthrough: Vec<String>,
}

/// Effective settings after merging configuration and flags (flags win)
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    verbose: bool,
    color: bool,
    json: Option<PathBuf>,
    poll_interval: Duration,
    discovery: DiscoveryOptions,
}

impl Settings {
    fn resolve(args: &HarnessArgs, config: &Config) -> Result<Self> {
        let poll_interval = match args.poll_interval_ms {
            Some(0) => anyhow::bail!("--poll-interval-ms must be greater than zero"),
            Some(ms) => Duration::from_millis(ms),
            None => config.poll_interval(),
        };

        let discovery = match config.excluded_prefixes() {
            Some(prefixes) => {
                DiscoveryOptions::default().with_excluded_prefixes(prefixes.iter().cloned())
            }
            None => DiscoveryOptions::default(),
        };

        Ok(Self {
            verbose: !args.quiet && (args.verbose || config.verbose()),
            color: !args.no_color && config.color(),
            json: args.json.clone().or_else(|| config.json_path()),
            poll_interval,
            discovery,
        })
    }
}

fn load_config(args: &HarnessArgs) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    let config = match &args.config {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            loader.load_from_directory(&cwd)?
        }
    };
    Ok(config)
}

fn create_json(path: &Path) -> Result<JsonSink<BufWriter<File>>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create JSON output {}", path.display()))?;
    Ok(JsonSink::new(BufWriter::new(file)))
}

/// Run every test under `root` with the given arguments.
///
/// Returns whether all tests passed; errors mean the run could not complete.
pub fn run_with(args: &HarnessArgs, root: &dyn NamespaceNode) -> Result<bool> {
    let config = load_config(args)?;
    let settings = Settings::resolve(args, &config)?;
    tracing::debug!(?settings, "resolved harness settings");

    if !args.passthrough.is_empty() {
        tracing::debug!(ignored = ?args.passthrough, "ignoring unrecognised arguments");
    }

    let console = ConsoleSink::stdout(settings.verbose).with_color(settings.color);
    let mut sink = MultiSink::new().with(console);
    if let Some(path) = &settings.json {
        sink.push(create_json(path)?);
    }

    let runner = TestRunner::default()
        .with_poll_interval(settings.poll_interval)
        .with_discovery(settings.discovery);
    let summary = runner.run(root, &mut sink)?;

    Ok(summary.all_passed())
}

/// Process entry point for a test target
pub fn main(root: &dyn NamespaceNode) -> ExitCode {
    logging::init();
    let args = HarnessArgs::parse();

    match run_with(&args, root) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("{} {:#}", "error:".red().bold(), error);
            ExitCode::from(2)
        }
    }
}

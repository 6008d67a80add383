//! CLI module for g2c-harness
//!
//! ```text
//! g2c-harness [OPTIONS] <XML_GRAMMAR> <INSTANCE> <DEPTH> <MAX_STEPS> <SEED> [PARAM]...
//! ```
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::harness::{FailurePolicy, HarnessConfig, TestConfiguration};
use crate::version::HARNESS_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Generate, build and run a grammar2code algorithm for one test configuration
#[derive(Parser, Debug)]
#[command(name = "g2c-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Generate, build and run a grammar2code algorithm", long_about = None)]
pub struct Cli {
    /// Grammar description handed to the generator (relative to the base directory)
    #[arg(value_name = "XML_GRAMMAR")]
    pub grammar: OsString,

    /// Problem instance passed to the built binary
    #[arg(value_name = "INSTANCE")]
    pub instance: OsString,

    /// Generation depth (`-d`)
    #[arg(value_name = "DEPTH")]
    pub depth: OsString,

    /// Step budget passed to the built binary
    #[arg(value_name = "MAX_STEPS")]
    pub max_steps: OsString,

    /// Random seed passed to the built binary
    #[arg(value_name = "SEED")]
    pub seed: OsString,

    /// Extra generator parameters, passed through verbatim
    #[arg(value_name = "PARAM", trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<OsString>,

    /// Project base directory (default: parent of the executable's directory)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Generator executable (default: <base>/build/grammar2code)
    #[arg(long, value_name = "PATH")]
    pub generator: Option<PathBuf>,

    /// Build tool run inside the scratch directory
    #[arg(long, value_name = "PROG", default_value = "make")]
    pub build_tool: String,

    /// Executable produced by the build
    #[arg(long, value_name = "NAME", default_value = "auto_algo")]
    pub binary: String,

    /// Stop at the first failed step instead of attempting the rest
    #[arg(long)]
    pub abort_on_failure: bool,

    /// Leave the scratch directory on disk
    #[arg(long)]
    pub keep_scratch: bool,

    /// Write a JSON run report to FILE
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Do not print the scratch directory path
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn test_configuration(&self) -> TestConfiguration {
        TestConfiguration::new(&self.grammar, &self.instance, &self.depth, &self.max_steps, &self.seed)
            .with_extra_params(self.params.iter().cloned())
    }

    pub fn harness_config(&self) -> HarnessConfig {
        let policy = if self.abort_on_failure {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        };
        let mut config = HarnessConfig::new()
            .with_build_tool(&self.build_tool)
            .with_binary_name(&self.binary)
            .with_policy(policy)
            .with_keep_scratch(self.keep_scratch)
            .with_echo_scratch(!self.quiet);
        if let Some(generator) = &self.generator {
            config = config.with_generator(generator);
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match commands::test_configuration(&cli) {
        Ok(exit_code) => {
            if exit_code != ExitCode::SUCCESS {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

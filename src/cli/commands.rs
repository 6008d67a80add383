//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io;
use std::path::Path;

use crate::harness::{BaseLayout, RunReport, TestRunner};

use super::{Cli, CliError, CliResult, ExitCode};

/// Resolve the layout, run the configuration, and map the report to an exit code.
pub fn test_configuration(cli: &Cli) -> CliResult<ExitCode> {
    let layout = match &cli.base_dir {
        Some(dir) => BaseLayout::at(dir),
        None => BaseLayout::from_current_exe(),
    }
    .map_err(|e| CliError::failure(format!("Error: {}", e)))?;
    tracing::debug!(base = %layout.base().display(), "resolved base directory");

    let test = cli.test_configuration();
    let mut runner = TestRunner::new(layout, cli.harness_config());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = runner
        .run(&test, &mut out)
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }

    if let Some(err) = report.first_failure().and_then(|s| s.to_error()) {
        tracing::warn!("{err}");
    }
    Ok(ExitCode(report.exit_code()))
}

/// Write the run report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &RunReport) -> CliResult<()> {
    let json = serde_json::to_string_pretty(&report.to_json())
        .map_err(|e| CliError::failure(format!("Error serializing report: {}", e)))?;
    fs::write(path, json + "\n")
        .map_err(|e| CliError::failure(format!("Error writing report '{}': {}", path.display(), e)))
}

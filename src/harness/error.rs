//! Error types for the harness pipeline.
//!
//! Setup errors (layout, scratch, template copy) abort a run outright. Step errors
//! (spawn, stream) are captured into the run report and handed to the failure
//! policy instead of being propagated.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::report::Step;

/// Errors produced while preparing or running a test configuration.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot resolve base directory from '{}': {source}", .path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] io::Error),

    #[error("failed to copy template '{}': {source}", .path.display())]
    TemplateCopy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while streaming output of '{program}': {source}")]
    Stream {
        program: String,
        /// Exit status of the child, which is still reaped after forwarding fails
        exit_code: Option<i32>,
        #[source]
        source: io::Error,
    },

    #[error("{step} step failed ({})", describe_exit(.exit_code))]
    StepFailed { step: Step, exit_code: Option<i32> },

    #[error("failed to remove scratch directory '{}': {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

/// Result alias used throughout the harness.
pub type HarnessResult<T> = Result<T, HarnessError>;

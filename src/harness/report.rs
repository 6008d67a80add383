//! Per-step and per-run reports.
//!
//! A `RunReport` is the only outcome a run produces: it records what each
//! subprocess was asked to do, how it exited, and whether the scratch directory
//! was released. The CLI derives its exit code from it and can dump it as JSON.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};

use super::error::HarnessError;

/// Pipeline stage that spawns a subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Generate,
    Build,
    Execute,
}

impl Step {
    /// All steps in pipeline order.
    pub const ALL: [Step; 3] = [Step::Generate, Step::Build, Step::Execute];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Generate => "generate",
            Step::Build => "build",
            Step::Execute => "execute",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single pipeline step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    /// Program that was spawned (or attempted)
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Working directory handed to the subprocess
    pub cwd: PathBuf,
    /// `None` when the process could not be spawned or was killed by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Lines forwarded from the subprocess's stdout (0 for inherited output)
    pub lines: usize,
    pub duration: Duration,
    /// Spawn or streaming error, if any
    pub error: Option<String>,
}

impl StepReport {
    pub fn failed(&self) -> bool {
        !self.success
    }

    /// Convert a failed step into the matching error.
    pub fn to_error(&self) -> Option<HarnessError> {
        self.failed().then(|| HarnessError::StepFailed {
            step: self.step,
            exit_code: self.exit_code,
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "step": self.step.as_str(),
            "program": self.program.display().to_string(),
            "args": self.args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>(),
            "cwd": self.cwd.display().to_string(),
            "exit_code": self.exit_code,
            "success": self.success,
            "lines": self.lines,
            "duration_ms": self.duration.as_millis() as u64,
            "error": self.error,
        })
    }
}

/// What happened to the scratch directory at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    Removed,
    Kept,
    Failed(String),
}

/// Full record of one test configuration run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub scratch: PathBuf,
    /// Number of template files copied into scratch
    pub template_files: usize,
    pub steps: Vec<StepReport>,
    /// Set when the abort policy stopped the pipeline early
    pub aborted_after: Option<Step>,
    pub cleanup: Cleanup,
}

impl RunReport {
    pub fn new(scratch: &Path, template_files: usize) -> Self {
        Self {
            scratch: scratch.to_path_buf(),
            template_files,
            steps: Vec::new(),
            aborted_after: None,
            cleanup: Cleanup::Removed,
        }
    }

    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn first_failure(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.failed())
    }

    pub fn succeeded(&self) -> bool {
        self.first_failure().is_none()
            && self.steps.len() == Step::ALL.len()
            && !matches!(self.cleanup, Cleanup::Failed(_))
    }

    /// Process exit code for the run.
    ///
    /// The execution step's exit code wins when it ran. A run that never reached
    /// execution or an execution killed by a signal maps to 1. So does a zero exit
    /// when its output could not be forwarded or cleanup failed afterwards.
    pub fn exit_code(&self) -> i32 {
        let Some(exec) = self.step(Step::Execute) else {
            return 1;
        };
        let code = exec.exit_code.unwrap_or(1);
        if code == 0 && (exec.error.is_some() || matches!(self.cleanup, Cleanup::Failed(_))) {
            return 1;
        }
        code
    }

    pub fn to_json(&self) -> Value {
        let cleanup = match &self.cleanup {
            Cleanup::Removed => json!({ "status": "removed" }),
            Cleanup::Kept => json!({ "status": "kept" }),
            Cleanup::Failed(reason) => json!({ "status": "failed", "error": reason }),
        };
        json!({
            "version": crate::version::HARNESS_VERSION,
            "scratch": self.scratch.display().to_string(),
            "template_files": self.template_files,
            "steps": self.steps.iter().map(StepReport::to_json).collect::<Vec<_>>(),
            "aborted_after": self.aborted_after.map(|s| s.as_str()),
            "cleanup": cleanup,
            "exit_code": self.exit_code(),
        })
    }
}

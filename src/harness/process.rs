//! Subprocess invocation.
//!
//! Commands are always spawned from an argument vector with an explicit working
//! directory; no shell is involved and the harness never changes its own current
//! directory. The `CommandRunner` trait is the seam tests use to record
//! invocations instead of spawning real processes.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::error::{HarnessError, HarnessResult};

/// How a subprocess's stdout reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Read line by line and forward each line to the caller's writer
    #[default]
    Stream,
    /// Hand the harness's own stdout to the child
    Inherit,
}

/// A fully-resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub output: OutputMode,
}

impl StepCommand {
    pub fn new(program: impl Into<PathBuf>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            output: OutputMode::Stream,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.output = OutputMode::Inherit;
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());
        match self.output {
            OutputMode::Stream => cmd.stdout(Stdio::piped()),
            OutputMode::Inherit => cmd.stdout(Stdio::inherit()),
        };
        cmd
    }
}

impl fmt::Display for StepCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Lines forwarded to the caller's writer
    pub lines: usize,
}

impl CommandOutcome {
    pub fn exited(code: i32, lines: usize) -> Self {
        Self {
            exit_code: Some(code),
            success: code == 0,
            lines,
        }
    }
}

/// Runs external commands on behalf of the pipeline.
pub trait CommandRunner {
    /// Run `command` to completion, forwarding streamed stdout to `out`.
    fn run(&mut self, command: &StepCommand, out: &mut dyn Write) -> HarnessResult<CommandOutcome>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &StepCommand, out: &mut dyn Write) -> HarnessResult<CommandOutcome> {
        // Anything already written (e.g. the scratch path) must precede the child's output.
        out.flush()?;

        tracing::debug!(cwd = %command.cwd.display(), "spawning {}", command);
        let mut child = command.to_command().spawn().map_err(|source| HarnessError::Spawn {
            program: command.program_name(),
            source,
        })?;

        let streamed = match child.stdout.take() {
            Some(stdout) => stream_lines(BufReader::new(stdout), out),
            None => Ok(0),
        };

        // Reap the child even if forwarding failed.
        let status = child.wait()?;
        let lines = streamed.map_err(|source| HarnessError::Stream {
            program: command.program_name(),
            exit_code: status.code(),
            source,
        })?;

        Ok(CommandOutcome {
            exit_code: status.code(),
            success: status.success(),
            lines,
        })
    }
}

/// Forward `reader` to `out` one line at a time, flushing once the reader is exhausted.
///
/// Lines are copied as raw bytes, so non-UTF-8 output and a final line without a
/// trailing newline pass through untouched. Returns the number of lines forwarded.
pub fn stream_lines<R, W>(mut reader: R, out: &mut W) -> io::Result<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        out.write_all(&buf)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

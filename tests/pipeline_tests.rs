//! Pipeline tests driven through a recording `CommandRunner`.
//!
//! No real processes are spawned: the recorder captures each command, snapshots the
//! scratch directory at that moment, and replays scripted stdout and exit codes.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use g2c_harness::harness::{
    BaseLayout, Cleanup, CommandOutcome, CommandRunner, FailurePolicy, HarnessConfig, HarnessError, HarnessResult,
    OutputMode, Step, StepCommand, TestConfiguration, TestRunner,
};
use tempfile::TempDir;

/// Scripted reply for one invocation.
enum Reply {
    Exit { code: i32, stdout: &'static str },
    SpawnFails,
}

struct Invocation {
    command: StepCommand,
    /// Relative paths present in the command's working directory when it ran
    cwd_listing: Vec<String>,
    /// Whether the `-t` target directory existed when the command ran
    target_exists: Option<bool>,
}

#[derive(Default)]
struct RecordingRunner {
    replies: VecDeque<Reply>,
    invocations: Vec<Invocation>,
}

impl RecordingRunner {
    fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            invocations: Vec::new(),
        }
    }
}

fn target_exists(command: &StepCommand) -> Option<bool> {
    let flag = command.args.iter().position(|a| a == "-t")?;
    command.args.get(flag + 1).map(|target| Path::new(target).is_dir())
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, command: &StepCommand, out: &mut dyn Write) -> HarnessResult<CommandOutcome> {
        self.invocations.push(Invocation {
            command: command.clone(),
            cwd_listing: listing(&command.cwd),
            target_exists: target_exists(command),
        });
        match self.replies.pop_front().unwrap_or(Reply::Exit { code: 0, stdout: "" }) {
            Reply::Exit { code, stdout } => {
                let lines = g2c_harness::harness::stream_lines(stdout.as_bytes(), out)?;
                Ok(CommandOutcome::exited(code, lines))
            }
            Reply::SpawnFails => Err(HarnessError::Spawn {
                program: command.program_name(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
        }
    }
}

/// A base directory with a small `sources/` template and a placeholder generator.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let sources = tmp.path().join("sources");
    fs::create_dir_all(sources.join("lib")).unwrap();
    fs::write(sources.join("main.c"), "int main(void) { return 0; }\n").unwrap();
    fs::write(sources.join("Makefile"), "all:\n\tcc -o auto_algo main.c\n").unwrap();
    fs::write(sources.join("lib").join("general.h"), "#pragma once\n").unwrap();
    fs::create_dir_all(tmp.path().join("build")).unwrap();
    fs::write(tmp.path().join("build").join("grammar2code"), "").unwrap();
    tmp
}

fn harness(project: &TempDir, config: HarnessConfig, runner: RecordingRunner) -> TestRunner<RecordingRunner> {
    let layout = BaseLayout::at(project.path()).unwrap();
    TestRunner::with_runner(layout, config, runner)
}

fn sample() -> TestConfiguration {
    TestConfiguration::new("g.xml", "inst1", "3", "100", "42")
}

#[test]
fn test_scenario_generate_build_execute_cleanup() {
    let project = project();
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::default());
    let mut out = Vec::new();

    let report = runner.run(&sample(), &mut out).unwrap();
    let scratch = report.scratch.clone();
    let base = fs::canonicalize(project.path()).unwrap();
    let calls = &runner.runner().invocations;

    assert_eq!(calls.len(), 3);

    let generate = &calls[0].command;
    assert_eq!(generate.program, base.join("build").join("grammar2code"));
    assert_eq!(
        generate.args,
        vec!["-d", "3", "-g", "g.xml", "-t", scratch.to_str().unwrap()]
    );
    assert_eq!(generate.cwd, base);

    let build = &calls[1].command;
    assert_eq!(build.program, PathBuf::from("make"));
    assert!(build.args.is_empty());
    assert_eq!(build.cwd, scratch);
    assert_eq!(build.output, OutputMode::Inherit);

    let execute = &calls[2].command;
    assert_eq!(execute.program, scratch.join("auto_algo"));
    assert_eq!(execute.args, vec!["inst1", "100", "42"]);
    assert_eq!(execute.cwd, scratch);

    assert_eq!(report.cleanup, Cleanup::Removed);
    assert!(!scratch.exists());
    assert!(report.succeeded());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_extra_params_follow_target_flag() {
    let project = project();
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::default());
    let test = sample().with_extra_params(["-x", "5"]);

    let report = runner.run(&test, &mut io::sink()).unwrap();
    let args = &runner.runner().invocations[0].command.args;
    assert_eq!(
        args,
        &vec!["-d", "3", "-g", "g.xml", "-t", report.scratch.to_str().unwrap(), "-x", "5"]
    );
}

#[test]
fn test_template_is_copied_before_generation() {
    let project = project();
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::default());
    runner.run(&sample(), &mut io::sink()).unwrap();

    // The build runs inside scratch and sees the copied template.
    let build = &runner.runner().invocations[1];
    assert_eq!(build.cwd_listing, vec!["Makefile", "lib", "main.c"]);
}

#[test]
fn test_output_streams_in_order() {
    let project = project();
    let replies = [
        Reply::Exit { code: 0, stdout: "parsing grammar\nwriting code\n" },
        Reply::Exit { code: 0, stdout: "" },
        Reply::Exit { code: 0, stdout: "step 1\nstep 2\nResult: 12.500000\n" },
    ];
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::replying(replies));
    let mut out = Vec::new();

    let report = runner.run(&sample(), &mut out).unwrap();
    let expected = format!(
        "{}\nparsing grammar\nwriting code\nstep 1\nstep 2\nResult: 12.500000\n",
        report.scratch.display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(report.step(Step::Generate).unwrap().lines, 2);
    assert_eq!(report.step(Step::Execute).unwrap().lines, 3);
}

#[test]
fn test_silent_generator_failure_still_builds_and_executes() {
    let project = project();
    let replies = [
        Reply::Exit { code: 1, stdout: "" },
        Reply::Exit { code: 2, stdout: "" },
        Reply::SpawnFails,
    ];
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::replying(replies));

    let report = runner.run(&sample(), &mut io::sink()).unwrap();
    assert_eq!(runner.runner().invocations.len(), 3);
    assert_eq!(report.steps.len(), 3);
    assert!(report.aborted_after.is_none());

    let execute = report.step(Step::Execute).unwrap();
    assert_eq!(execute.exit_code, None);
    assert!(execute.error.as_deref().unwrap().contains("failed to spawn"));

    assert_eq!(report.first_failure().unwrap().step, Step::Generate);
    assert!(!report.scratch.exists());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_abort_policy_stops_after_failed_build() {
    let project = project();
    let replies = [Reply::Exit { code: 0, stdout: "" }, Reply::Exit { code: 2, stdout: "" }];
    let config = HarnessConfig::default().with_policy(FailurePolicy::Abort);
    let mut runner = harness(&project, config, RecordingRunner::replying(replies));

    let report = runner.run(&sample(), &mut io::sink()).unwrap();
    assert_eq!(runner.runner().invocations.len(), 2);
    assert_eq!(report.aborted_after, Some(Step::Build));
    assert!(report.step(Step::Execute).is_none());
    assert_eq!(report.cleanup, Cleanup::Removed);
    assert!(!report.scratch.exists());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_execution_exit_code_is_reported() {
    let project = project();
    let replies = [
        Reply::Exit { code: 0, stdout: "" },
        Reply::Exit { code: 0, stdout: "" },
        Reply::Exit { code: 7, stdout: "" },
    ];
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::replying(replies));
    let report = runner.run(&sample(), &mut io::sink()).unwrap();
    assert_eq!(report.exit_code(), 7);
}

#[test]
fn test_keep_scratch_leaves_directory() {
    let project = project();
    let config = HarnessConfig::default().with_keep_scratch(true);
    let mut runner = harness(&project, config, RecordingRunner::default());

    let report = runner.run(&sample(), &mut io::sink()).unwrap();
    assert_eq!(report.cleanup, Cleanup::Kept);
    assert!(report.scratch.join("main.c").is_file());
    fs::remove_dir_all(&report.scratch).unwrap();
}

#[test]
fn test_scratch_root_and_uniqueness() {
    let project = project();
    let root = TempDir::new().unwrap();
    let config = HarnessConfig::default().with_scratch_root(root.path());
    let mut runner = harness(&project, config, RecordingRunner::default());

    let first = runner.run(&sample(), &mut io::sink()).unwrap();
    let second = runner.run(&sample(), &mut io::sink()).unwrap();
    assert!(first.scratch.starts_with(root.path()));
    assert_ne!(first.scratch, second.scratch);
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_generation_cwd_is_independent_of_caller_cwd() {
    let project = project();
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::default());
    let caller_cwd = std::env::current_dir().unwrap();

    runner.run(&sample(), &mut io::sink()).unwrap();
    let generate = &runner.runner().invocations[0];
    assert_eq!(generate.command.cwd, fs::canonicalize(project.path()).unwrap());
    assert_eq!(generate.cwd_listing, vec!["build", "sources"]);
    assert_eq!(std::env::current_dir().unwrap(), caller_cwd);
}

/// Writer that fails on first use, to make the scratch echo fail during setup.
struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_setup_failure_still_removes_scratch() {
    let project = project();
    let root = TempDir::new().unwrap();
    let config = HarnessConfig::default().with_scratch_root(root.path());
    let mut runner = harness(&project, config, RecordingRunner::default());

    let err = runner.run(&sample(), &mut BrokenPipe).unwrap_err();
    assert!(matches!(err, HarnessError::Io(_)));
    assert!(runner.runner().invocations.is_empty());
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_dangling_template_symlink_does_not_block_run() {
    let project = project();
    std::os::unix::fs::symlink("missing.c", project.path().join("sources").join("stale.c")).unwrap();
    let mut runner = harness(&project, HarnessConfig::default(), RecordingRunner::default());

    let report = runner.run(&sample(), &mut io::sink()).unwrap();
    assert_eq!(runner.runner().invocations.len(), 3);
    assert_eq!(report.template_files, 4);
    let build = &runner.runner().invocations[1];
    assert_eq!(build.cwd_listing, vec!["Makefile", "lib", "main.c", "stale.c"]);
    assert!(report.succeeded());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_scratch_path_reaches_generator_intact() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let project = project();
    let parent = TempDir::new().unwrap();
    let root = parent.path().join(OsStr::from_bytes(b"scratch-\xff"));
    fs::create_dir(&root).unwrap();
    let config = HarnessConfig::default().with_scratch_root(&root);
    let mut runner = harness(&project, config, RecordingRunner::default());
    let mut out = Vec::new();

    let report = runner.run(&sample(), &mut out).unwrap();
    let generate = &runner.runner().invocations[0];
    assert!(report.scratch.starts_with(&root));
    assert_eq!(generate.command.args[5], report.scratch.as_os_str());
    assert_eq!(generate.target_exists, Some(true));

    let mut echoed = report.scratch.as_os_str().as_bytes().to_vec();
    echoed.push(b'\n');
    assert_eq!(out, echoed);
}

//! The generate → build → execute pipeline.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use super::config::{FailurePolicy, HarnessConfig, TestConfiguration};
use super::error::{HarnessError, HarnessResult};
use super::layout::BaseLayout;
use super::process::{CommandRunner, StepCommand, SystemRunner};
use super::report::{Cleanup, RunReport, Step, StepReport};
use super::scratch::ScratchDir;

/// Runs test configurations against a project layout.
pub struct TestRunner<R: CommandRunner = SystemRunner> {
    layout: BaseLayout,
    config: HarnessConfig,
    runner: R,
}

impl TestRunner<SystemRunner> {
    pub fn new(layout: BaseLayout, config: HarnessConfig) -> Self {
        Self::with_runner(layout, config, SystemRunner)
    }
}

impl<R: CommandRunner> TestRunner<R> {
    pub fn with_runner(layout: BaseLayout, config: HarnessConfig, runner: R) -> Self {
        Self { layout, config, runner }
    }

    pub fn layout(&self) -> &BaseLayout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn generator(&self) -> std::path::PathBuf {
        match &self.config.generator {
            Some(path) => self.layout.resolve(path),
            None => self.layout.generator_path(),
        }
    }

    /// `<generator> -d <depth> -g <grammar> -t <scratch> <extra...>`, run from the base directory.
    pub fn generate_command(&self, test: &TestConfiguration, scratch: &Path) -> StepCommand {
        StepCommand::new(self.generator(), self.layout.base())
            .arg("-d")
            .arg(&test.depth)
            .arg("-g")
            .arg(&test.grammar)
            .arg("-t")
            .arg(scratch)
            .args(test.extra_params.iter().cloned())
    }

    /// The build tool with no arguments, run from the scratch directory.
    pub fn build_command(&self, scratch: &Path) -> StepCommand {
        StepCommand::new(&self.config.build_tool, scratch).inherit_output()
    }

    /// `<scratch>/<binary> <instance> <max_steps> <seed>`, run from the scratch directory.
    pub fn execute_command(&self, test: &TestConfiguration, scratch: &Path) -> StepCommand {
        StepCommand::new(scratch.join(&self.config.binary_name), scratch)
            .arg(&test.instance)
            .arg(&test.max_steps)
            .arg(&test.seed)
    }

    /// Run one test configuration end to end.
    ///
    /// Only setup failures (scratch creation, template copy, writing the scratch
    /// path) are returned as errors. Step failures are recorded in the report and
    /// resolved by the configured failure policy. The scratch directory is
    /// removed on every path unless `keep_scratch` is set.
    #[tracing::instrument(skip_all, fields(instance = ?test.instance, seed = ?test.seed))]
    pub fn run(&mut self, test: &TestConfiguration, out: &mut dyn Write) -> HarnessResult<RunReport> {
        for missing in self.layout.missing_parts(&self.generator()) {
            tracing::warn!("{missing}");
        }

        let scratch = match &self.config.scratch_root {
            Some(root) => ScratchDir::create_in(root)?,
            None => ScratchDir::create()?,
        };
        let copied = scratch.populate_from(&self.layout.sources_dir())?;
        if self.config.echo_scratch {
            out.write_all(scratch.path().as_os_str().as_encoded_bytes())?;
            out.write_all(b"\n")?;
        }

        let mut report = RunReport::new(scratch.path(), copied);
        let plan = [
            (Step::Generate, self.generate_command(test, scratch.path())),
            (Step::Build, self.build_command(scratch.path())),
            (Step::Execute, self.execute_command(test, scratch.path())),
        ];

        for (step, command) in plan {
            let step_report = self.run_step(step, &command, out);
            let failed = step_report.failed();
            report.steps.push(step_report);
            if failed && self.config.policy == FailurePolicy::Abort {
                tracing::warn!("aborting after failed {step} step");
                report.aborted_after = Some(step);
                break;
            }
        }

        report.cleanup = if self.config.keep_scratch {
            let kept = scratch.persist();
            tracing::info!("keeping scratch directory {}", kept.display());
            Cleanup::Kept
        } else {
            match scratch.release() {
                Ok(path) => {
                    tracing::debug!("removed {}", path.display());
                    Cleanup::Removed
                }
                Err(e) => {
                    tracing::error!("{e}");
                    Cleanup::Failed(e.to_string())
                }
            }
        };

        Ok(report)
    }

    fn run_step(&mut self, step: Step, command: &StepCommand, out: &mut dyn Write) -> StepReport {
        tracing::info!(step = %step, "running {}", command);
        let start = Instant::now();
        let result = self.runner.run(command, out);
        let duration = start.elapsed();

        let mut report = StepReport {
            step,
            program: command.program.clone(),
            args: command.args.clone(),
            cwd: command.cwd.clone(),
            exit_code: None,
            success: false,
            lines: 0,
            duration,
            error: None,
        };
        match result {
            Ok(outcome) => {
                report.exit_code = outcome.exit_code;
                report.success = outcome.success;
                report.lines = outcome.lines;
            }
            Err(e) => {
                if let HarnessError::Stream { exit_code, .. } = &e {
                    report.exit_code = *exit_code;
                }
                report.error = Some(e.to_string());
            }
        }

        if report.failed() {
            match &report.error {
                Some(error) => tracing::warn!(step = %step, "{error}"),
                None => tracing::warn!(step = %step, exit_code = ?report.exit_code, "step failed"),
            }
        } else {
            tracing::info!(step = %step, lines = report.lines, elapsed_ms = duration.as_millis() as u64, "step finished");
        }
        report
    }
}

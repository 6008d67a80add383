//! Harness configuration and per-run invocation parameters.

use std::ffi::OsString;
use std::path::PathBuf;

/// Parameters of a single test configuration run.
///
/// All values are opaque OS strings handed through to the generator and to the
/// generated binary byte for byte, so non-UTF-8 arguments survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfiguration {
    /// Grammar description file, relative paths resolve against the base directory
    pub grammar: OsString,
    /// Problem instance handed to the built binary
    pub instance: OsString,
    /// Generator depth (`-d`)
    pub depth: OsString,
    pub max_steps: OsString,
    pub seed: OsString,
    /// Extra generator parameters, appended verbatim
    pub extra_params: Vec<OsString>,
}

impl TestConfiguration {
    pub fn new(
        grammar: impl Into<OsString>,
        instance: impl Into<OsString>,
        depth: impl Into<OsString>,
        max_steps: impl Into<OsString>,
        seed: impl Into<OsString>,
    ) -> Self {
        Self {
            grammar: grammar.into(),
            instance: instance.into(),
            depth: depth.into(),
            max_steps: max_steps.into(),
            seed: seed.into(),
            extra_params: Vec::new(),
        }
    }

    pub fn with_extra_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.extra_params.extend(params.into_iter().map(Into::into));
        self
    }
}

/// What to do when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Attempt every remaining step regardless
    #[default]
    Continue,
    /// Stop after the first failed step (cleanup still runs)
    Abort,
}

/// Harness settings shared by every run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Generator override; relative paths resolve against the base directory
    pub generator: Option<PathBuf>,
    /// Build tool invoked with no arguments inside the scratch directory
    pub build_tool: String,
    /// Executable the build is expected to produce
    pub binary_name: String,
    pub policy: FailurePolicy,
    /// Leave the scratch directory on disk after the run
    pub keep_scratch: bool,
    /// Print the scratch path before generating
    pub echo_scratch: bool,
    /// Where scratch directories are created (system temp dir when `None`)
    pub scratch_root: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            generator: None,
            build_tool: "make".to_string(),
            binary_name: "auto_algo".to_string(),
            policy: FailurePolicy::Continue,
            keep_scratch: false,
            echo_scratch: true,
            scratch_root: None,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(mut self, generator: impl Into<PathBuf>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    pub fn with_build_tool(mut self, tool: impl Into<String>) -> Self {
        self.build_tool = tool.into();
        self
    }

    pub fn with_binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = name.into();
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_keep_scratch(mut self, keep: bool) -> Self {
        self.keep_scratch = keep;
        self
    }

    pub fn with_echo_scratch(mut self, echo: bool) -> Self {
        self.echo_scratch = echo;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

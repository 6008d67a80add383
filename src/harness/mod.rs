//! Test harness for grammar2code-generated algorithms.
//!
//! A run copies the `sources/` template into a fresh scratch directory, invokes
//! the generator into it, builds the result, runs the built binary, and removes
//! the scratch directory again.
//!
//! ## Modules
//!
//! - `layout` - base directory resolution and expected paths
//! - `scratch` - scoped scratch directory and template copy
//! - `process` - subprocess invocation and line streaming
//! - `runner` - the pipeline itself
//! - `report` - step and run outcomes

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod error;
pub mod layout;
pub mod process;
pub mod report;
pub mod runner;
pub mod scratch;

pub use config::{FailurePolicy, HarnessConfig, TestConfiguration};
pub use error::{HarnessError, HarnessResult};
pub use layout::BaseLayout;
pub use process::{CommandOutcome, CommandRunner, OutputMode, StepCommand, SystemRunner, stream_lines};
pub use report::{Cleanup, RunReport, Step, StepReport};
pub use runner::TestRunner;
pub use scratch::ScratchDir;

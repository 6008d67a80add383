#![forbid(unsafe_code)]
//! g2c-harness: drive grammar2code against a test configuration
//!
//! Given a grammar, a problem instance, a generation depth, a step budget and a
//! seed, the harness generates an algorithm with `grammar2code`, builds it, runs
//! it, streams its output, and cleans up after itself.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{BaseLayout, HarnessConfig, HarnessError, RunReport, TestConfiguration, TestRunner};

//! Base directory resolution.
//!
//! The harness lives one directory below the project base (e.g. `<base>/tuning/`),
//! next to `sources/` (the template tree copied into every scratch directory) and
//! `build/grammar2code` (the generator).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{HarnessError, HarnessResult};

/// Template tree copied into each scratch directory.
pub const SOURCES_DIR: &str = "sources";
/// Directory holding the generator binary.
pub const BUILD_DIR: &str = "build";
/// Generator binary name.
pub const GENERATOR_NAME: &str = "grammar2code";

/// Resolved project base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLayout {
    base: PathBuf,
}

impl BaseLayout {
    /// Resolve the base from the running executable: the parent of its directory.
    pub fn from_current_exe() -> HarnessResult<Self> {
        let exe = env::current_exe().map_err(|source| HarnessError::Layout {
            path: PathBuf::from("<current executable>"),
            source,
        })?;
        Self::from_entry_point(&exe)
    }

    /// Resolve the base from an entry point path (a file inside `<base>/<subdir>/`).
    pub fn from_entry_point(entry: &Path) -> HarnessResult<Self> {
        let dir = entry.parent().unwrap_or(Path::new("."));
        Self::at(dir.join(".."))
    }

    /// Use `base` directly. The path is canonicalized, so it must exist.
    pub fn at(base: impl AsRef<Path>) -> HarnessResult<Self> {
        let base = base.as_ref();
        let resolved = fs::canonicalize(base).map_err(|source| HarnessError::Layout {
            path: base.to_path_buf(),
            source,
        })?;
        Ok(Self { base: resolved })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.base.join(SOURCES_DIR)
    }

    pub fn generator_path(&self) -> PathBuf {
        self.base.join(BUILD_DIR).join(GENERATOR_NAME)
    }

    /// Resolve `path` against the base unless it is already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    /// Describe expected layout entries that are missing.
    pub fn missing_parts(&self, generator: &Path) -> Vec<String> {
        let mut missing = Vec::new();
        let sources = self.sources_dir();
        if !sources.is_dir() {
            missing.push(format!("template directory '{}' not found", sources.display()));
        }
        if !generator.is_file() {
            missing.push(format!("generator '{}' not found", generator.display()));
        }
        missing
    }
}

//! Per-run scratch directory.
//!
//! `ScratchDir` owns a uniquely named temporary directory. Dropping it removes the
//! directory, so every early return and panic path releases it; `release` does the
//! same explicitly and reports failures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use walkdir::WalkDir;

use super::error::{HarnessError, HarnessResult};

const SCRATCH_PREFIX: &str = "g2c-";

#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a scratch directory under the system temp directory.
    pub fn create() -> HarnessResult<Self> {
        let dir = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(HarnessError::Scratch)?;
        Ok(Self { dir })
    }

    /// Create a scratch directory under `parent`.
    pub fn create_in(parent: impl AsRef<Path>) -> HarnessResult<Self> {
        let dir = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(HarnessError::Scratch)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Recursively copy the contents of `template` into the scratch directory.
    ///
    /// Symlinks are recreated as links, not followed, so dangling links copy
    /// fine. A missing template leaves the directory empty. Returns the number
    /// of files and links copied.
    pub fn populate_from(&self, template: &Path) -> HarnessResult<usize> {
        if !template.is_dir() {
            tracing::warn!("template directory '{}' does not exist; scratch left empty", template.display());
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(template).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| HarnessError::TemplateCopy {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| template.to_path_buf()),
                source: e.into(),
            })?;
            let rel = entry
                .path()
                .strip_prefix(template)
                .map_err(|_| HarnessError::TemplateCopy {
                    path: entry.path().to_path_buf(),
                    source: io::Error::other("entry outside template directory"),
                })?;
            let target = self.path().join(rel);
            let copy_err = |source| HarnessError::TemplateCopy {
                path: entry.path().to_path_buf(),
                source,
            };

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(copy_err)?;
            } else if entry.file_type().is_symlink() {
                copy_link(entry.path(), &target).map_err(copy_err)?;
                copied += 1;
            } else {
                fs::copy(entry.path(), &target).map_err(copy_err)?;
                copied += 1;
            }
        }

        tracing::debug!(files = copied, "populated {}", self.path().display());
        Ok(copied)
    }

    /// Remove the directory and everything in it. Returns the removed path.
    pub fn release(self) -> HarnessResult<PathBuf> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|source| HarnessError::Cleanup {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Leave the directory on disk and return its path.
    pub fn persist(self) -> PathBuf {
        self.dir.keep()
    }
}

#[cfg(unix)]
fn copy_link(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_link(link: &Path, target: &Path) -> io::Result<()> {
    fs::copy(link, target).map(|_| ())
}

//! Temp artifact naming
//!
//! Generated sources, binaries and project files live under one temp root.
//! Names derive from the block's unit when it has one, otherwise from a
//! counter owned by the namer.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Width of the zero-padded counter in generated names
pub const COUNTER_WIDTH: usize = 6;

/// Files the compiler leaves behind for a unit, relative to the temp root
pub fn stale_artifacts(unit: &str) -> [String; 3] {
    [unit.to_string(), format!("{unit}.ali"), format!("{unit}.o")]
}

/// Local temp root plus an optional root used when evaluating remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempRoot {
    pub local: PathBuf,
    pub remote: Option<PathBuf>,
}

impl TempRoot {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        TempRoot {
            local: path.into(),
            remote: None,
        }
    }

    /// Root for this invocation; a remote context without a remote root uses the local one
    pub fn select(&self, remote: bool) -> &Path {
        match (&self.remote, remote) {
            (Some(path), true) => path.as_path(),
            _ => self.local.as_path(),
        }
    }
}

/// Allocator for artifact paths
#[derive(Debug)]
pub struct ArtifactNamer {
    root: PathBuf,
    counter: u32,
}

impl ArtifactNamer {
    /// Create a namer rooted at `root`, creating the directory if needed.
    /// A relative root is made absolute against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        let root = std::path::absolute(&root).map_err(|e| Error::io(&root, e))?;
        Ok(ArtifactNamer { root, counter: 0 })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last number handed out (0 before the first allocation)
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Allocate an artifact path and create the file empty.
    ///
    /// With a unit the name is `unit + suffix`. Without one it is
    /// `prefix + NNNNNN + suffix`; the counter advances first unless
    /// `no_inc` is set, which reuses the number of the previous call.
    pub fn allocate(
        &mut self,
        prefix: &str,
        suffix: &str,
        unit: Option<&str>,
        no_inc: bool,
    ) -> Result<PathBuf> {
        let file_name = match unit {
            Some(unit) => format!("{unit}{suffix}"),
            None => {
                if !no_inc {
                    self.counter += 1;
                }
                format!(
                    "{prefix}{:0width$}{suffix}",
                    self.counter,
                    width = COUNTER_WIDTH
                )
            }
        };

        let path = self.root.join(file_name);
        fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), "allocated temp artifact");
        Ok(path)
    }

    /// Remove the binary, `.ali` and `.o` left by an earlier build of `unit`
    pub fn remove_stale(&self, unit: &str) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for name in stale_artifacts(unit) {
            let path = self.root.join(name);
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(&path, e)),
            }
        }
        if !removed.is_empty() {
            debug!(unit, count = removed.len(), "removed stale artifacts");
        }
        Ok(removed)
    }

    /// Recursively delete a directory under the root if it exists
    pub fn remove_dir(&self, name: &str) -> Result<()> {
        let path = self.root.join(name);
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }
}

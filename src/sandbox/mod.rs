//! Per-run staging directory

use log::{debug, warn};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while staging files
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path has no file name: {}", .0.display())]
    NoFileName(PathBuf),

    #[error("Two staged files share the name {0:?}")]
    NameClash(OsString),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SandboxError + '_ {
    move |source| SandboxError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A unique directory holding the staged inputs and outputs of one run
#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
    staged_names: HashSet<OsString>,
}

impl Sandbox {
    /// Create `sandbox_<uuid>` under `parent`, creating `parent` if needed
    pub fn create<P: AsRef<Path>>(parent: P) -> Result<Self, SandboxError> {
        let parent = parent.as_ref();
        let dir = parent.join(format!("sandbox_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        let root = dir.canonicalize().map_err(io_error(&dir))?;

        debug!("Created sandbox {}", root.display());
        Ok(Self {
            root,
            staged_names: HashSet::new(),
        })
    }

    /// Absolute path of the sandbox directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn claim_name(&mut self, path: &Path) -> Result<OsString, SandboxError> {
        let name = path
            .file_name()
            .ok_or_else(|| SandboxError::NoFileName(path.to_path_buf()))?
            .to_os_string();
        if !self.staged_names.insert(name.clone()) {
            return Err(SandboxError::NameClash(name));
        }
        Ok(name)
    }

    /// Copy an input file into the sandbox, returning the staged path
    pub fn stage_input(&mut self, host: &Path) -> Result<PathBuf, SandboxError> {
        let name = self.claim_name(host)?;
        let staged = self.root.join(name);
        fs::copy(host, &staged).map_err(io_error(host))?;
        debug!("Staged {} -> {}", host.display(), staged.display());
        Ok(staged)
    }

    /// Reserve the sandbox location an output will be written to
    pub fn stage_output(&mut self, host: &Path) -> Result<PathBuf, SandboxError> {
        let name = self.claim_name(host)?;
        Ok(self.root.join(name))
    }

    /// Path of a staged file as seen by the process that will use it.
    ///
    /// Inside a container the sandbox is mounted at `volume`.
    pub fn visible_path(&self, staged: &Path, volume: Option<&str>) -> String {
        match (volume, staged.file_name()) {
            (Some(volume), Some(name)) => Path::new(volume).join(name).display().to_string(),
            _ => staged.display().to_string(),
        }
    }

    /// Copy a staged output back to its host location.
    ///
    /// Returns `false` when the staged file was never produced.
    pub fn copy_to_host(&self, staged: &Path, host: &Path) -> Result<bool, SandboxError> {
        if !staged.is_file() {
            warn!("Expected output {} was not produced", staged.display());
            return Ok(false);
        }
        fs::copy(staged, host).map_err(io_error(host))?;
        debug!("Copied {} -> {}", staged.display(), host.display());
        Ok(true)
    }

    /// Delete the sandbox directory and everything in it
    pub fn remove(self) -> Result<(), SandboxError> {
        fs::remove_dir_all(&self.root).map_err(io_error(&self.root))?;
        debug!("Removed sandbox {}", self.root.display());
        Ok(())
    }
}

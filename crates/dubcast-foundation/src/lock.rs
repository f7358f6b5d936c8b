//! Exclusive workspace access, acquired when a `PipelineRunner` opens a
//! workspace and released on `Drop` even if the run panics or fails midway:
//! a cheap marker held for the lifetime of the run rather than a
//! signal-driven notifier.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::DubError;

pub struct WorkspaceLock {
    path: PathBuf,
}

impl WorkspaceLock {
    /// Attempts to atomically create `<workspace>/.dubcast.lock`. Fails with
    /// `DubError::WorkspaceLocked` if another run already holds it, since the
    /// create is `O_EXCL` and will not clobber an existing file.
    pub fn acquire(workspace: &Path) -> Result<Self, DubError> {
        let path = workspace.join(".dubcast.lock");
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|_| DubError::WorkspaceLocked(path.clone()))?;
        let _ = writeln!(file, "{}", std::process::id());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                target: "dubcast::lock",
                path = %self.path.display(),
                error = %err,
                "failed to release workspace lock"
            );
        }
    }
}

//! The `Phase` trait every one of the nine pipeline stages implements.

use std::path::PathBuf;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_foundation::shutdown::ShutdownGuard;

/// One declared output of a phase: the artifact key used in the manifest
/// and fingerprinting, and the workspace-relative path it resolves to.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub key: String,
    pub relative_path: PathBuf,
    pub is_dir: bool,
}

impl OutputSpec {
    pub fn file(key: impl Into<String>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            relative_path: relative_path.into(),
            is_dir: false,
        }
    }

    pub fn dir(key: impl Into<String>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            relative_path: relative_path.into(),
            is_dir: true,
        }
    }
}

/// Everything a phase's `run` needs: the workspace root to resolve its
/// declared paths against, and a shutdown guard to poll between I/O
/// boundaries so cancellation leaves no partial output.
pub struct PhaseContext {
    pub workspace: PathBuf,
    pub shutdown: ShutdownGuard,
}

impl PhaseContext {
    pub fn resolve(&self, relative: &std::path::Path) -> PathBuf {
        self.workspace.join(relative)
    }

    pub fn cancelled(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }
}

/// One node in the nine-phase DAG: a stable name, a monotonic version
/// bumped when the phase's logic changes, and its declared inputs/outputs.
#[async_trait]
pub trait Phase: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> u32;
    fn requires(&self) -> Vec<String>;
    fn provides(&self) -> Vec<OutputSpec>;

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError>;
}

//! Atomic persistence for the per-episode `manifest.json`.

use std::path::{Path, PathBuf};

use dubcast_foundation::error::ManifestError;
use dubcast_model::Manifest;

pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(workspace: &Path) -> Self {
        Self {
            path: workspace.join("manifest.json"),
        }
    }

    /// Returns an empty manifest if no file exists yet (should-run rule 2:
    /// "no manifest record exists" applies to every phase on a fresh
    /// workspace).
    pub fn load(&self) -> Result<Manifest, ManifestError> {
        if !self.path.exists() {
            return Ok(Manifest::new());
        }
        let bytes = std::fs::read(&self.path)?;
        serde_json::from_slice(&bytes).map_err(|e| ManifestError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Serializes the whole manifest and writes it via a temp file in the
    /// same directory, then renames over the target — the manifest is
    /// never observed partially written.
    pub fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let bytes = serde_json::to_vec_pretty(manifest)?;
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let tmp_path = parent.join(format!(
            ".manifest.json.tmp.{}",
            std::process::id()
        ));
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

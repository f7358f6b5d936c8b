//! Loads and persists the show-level registries: each registry file carries
//! its own schema version, and writes go through a temp-then-rename.

use std::path::Path;

use dubcast_foundation::error::ManifestError;
use dubcast_model::{DomainHints, Glossary, RoleCast, SpeakerToRole};
use serde::{de::DeserializeOwned, Serialize};

pub fn load_speaker_to_role(path: &Path) -> Result<SpeakerToRole, ManifestError> {
    load_or_default(path)
}

pub fn save_speaker_to_role(path: &Path, registry: &SpeakerToRole) -> Result<(), ManifestError> {
    save_atomic(path, registry)
}

pub fn load_role_cast(path: &Path) -> Result<RoleCast, ManifestError> {
    load_or_default(path)
}

pub fn load_glossary(path: &Path) -> Result<Glossary, ManifestError> {
    load_or_default(path)
}

/// Absent by default; a show with no domain-specific terminology simply
/// has no `dict/domain_hints.json`.
pub fn load_domain_hints(path: &Path) -> Result<Option<DomainHints>, ManifestError> {
    if !path.exists() {
        return Ok(None);
    }
    load_or_default(path).map(Some)
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ManifestError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| ManifestError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

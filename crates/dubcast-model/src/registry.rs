//! Show-level registries: `speaker_to_role` and `role_cast`, read-mostly
//! across episodes, each with its own schema version, mutated only under
//! the workspace lock.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// `episode_key → (speaker_id → role_name)`. An empty role name means the
/// speaker has been seen but not yet assigned a role by a human.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakerToRole {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub episodes: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_schema_version() -> u32 {
    REGISTRY_SCHEMA_VERSION
}

impl SpeakerToRole {
    pub fn new() -> Self {
        Self {
            schema_version: REGISTRY_SCHEMA_VERSION,
            episodes: BTreeMap::new(),
        }
    }

    /// Ensures an entry exists for every speaker seen in `episode_key`,
    /// without overwriting an existing (possibly human-assigned) role.
    pub fn ensure_speakers(&mut self, episode_key: &str, speaker_ids: impl IntoIterator<Item = String>) {
        let roles = self.episodes.entry(episode_key.to_string()).or_default();
        for speaker_id in speaker_ids {
            roles.entry(speaker_id).or_insert_with(String::new);
        }
    }

    pub fn role_for(&self, episode_key: &str, speaker_id: &str) -> Option<&str> {
        self.episodes
            .get(episode_key)
            .and_then(|roles| roles.get(speaker_id))
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// `role_name → voice_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleCast {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
    /// `gender → voice_id` fallback used when no role mapping exists.
    #[serde(default)]
    pub default_roles: BTreeMap<String, String>,
    /// Last-resort voice id used when even the gender-keyed fallback has no
    /// entry for a speaker's gender (e.g. `unknown` with no configured
    /// neutral voice for this show).
    #[serde(default)]
    pub default_voice_id: Option<String>,
}

impl RoleCast {
    pub fn voice_for_role(&self, role_name: &str) -> Option<&str> {
        self.roles.get(role_name).map(|s| s.as_str())
    }

    pub fn voice_for_gender_fallback(&self, gender_key: &str) -> Option<&str> {
        self.default_roles.get(gender_key).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_speakers_does_not_overwrite_assigned_role() {
        let mut registry = SpeakerToRole::new();
        registry.ensure_speakers("ep01", ["spk_1".to_string()]);
        registry
            .episodes
            .get_mut("ep01")
            .unwrap()
            .insert("spk_1".to_string(), "narrator".to_string());

        registry.ensure_speakers("ep01", ["spk_1".to_string(), "spk_2".to_string()]);

        assert_eq!(registry.role_for("ep01", "spk_1"), Some("narrator"));
        assert_eq!(registry.role_for("ep01", "spk_2"), None);
    }
}

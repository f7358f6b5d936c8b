//! Voice resolver: two-level lookup from `(episode, speaker_id)` to
//! a voice id, falling back by gender when no role mapping exists.

use std::collections::BTreeMap;

use dubcast_foundation::error::ModelError;
use dubcast_model::recognition::Gender;
use dubcast_model::registry::{RoleCast, SpeakerToRole};
use dubcast_model::voice::{VoiceAssignment, VoiceAssignmentSnapshot, VoiceSource};

fn gender_key(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Unknown => "unknown",
    }
}

/// Resolves a single speaker's voice: `speaker_to_role` then `role_cast`,
/// falling back to `role_cast.default_roles[gender]`. A miss on both is a
/// `ModelError::UnresolvedVoice` — there is no further fallback once the
/// gender-keyed default is absent.
pub fn resolve_speaker(
    episode_key: &str,
    speaker_id: &str,
    gender: Gender,
    speaker_to_role: &SpeakerToRole,
    role_cast: &RoleCast,
) -> Result<VoiceAssignment, ModelError> {
    if let Some(role) = speaker_to_role.role_for(episode_key, speaker_id) {
        if let Some(voice_id) = role_cast.voice_for_role(role) {
            return Ok(VoiceAssignment {
                role_id: role.to_string(),
                voice_id: voice_id.to_string(),
                source: VoiceSource::Mapped,
            });
        }
    }

    let key = gender_key(gender);
    if let Some(voice_id) = role_cast.voice_for_gender_fallback(key) {
        return Ok(VoiceAssignment {
            role_id: key.to_string(),
            voice_id: voice_id.to_string(),
            source: VoiceSource::GenderFallback,
        });
    }

    if let Some(voice_id) = &role_cast.default_voice_id {
        return Ok(VoiceAssignment {
            role_id: "default".to_string(),
            voice_id: voice_id.clone(),
            source: VoiceSource::Default,
        });
    }

    Err(ModelError::UnresolvedVoice(speaker_id.to_string()))
}

/// Resolves every speaker appearing in `dub_speaker_ids`, producing the
/// persisted voice assignment snapshot (`derive/voice_assignment.json`).
pub fn resolve_all(
    episode_key: &str,
    dub_speakers: &BTreeMap<String, Gender>,
    speaker_to_role: &SpeakerToRole,
    role_cast: &RoleCast,
) -> Result<VoiceAssignmentSnapshot, ModelError> {
    let mut snapshot = VoiceAssignmentSnapshot::new();
    for (speaker_id, gender) in dub_speakers {
        let assignment = resolve_speaker(episode_key, speaker_id, *gender, speaker_to_role, role_cast)?;
        snapshot.insert(speaker_id.clone(), assignment);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_role(episode: &str, speaker: &str, role: &str) -> SpeakerToRole {
        let mut registry = SpeakerToRole::new();
        registry
            .episodes
            .entry(episode.to_string())
            .or_default()
            .insert(speaker.to_string(), role.to_string());
        registry
    }

    #[test]
    fn mapped_role_wins_over_gender_fallback() {
        let registry = registry_with_role("ep01", "spk_1", "narrator");
        let mut cast = RoleCast::default();
        cast.roles.insert("narrator".to_string(), "voice-narrator".to_string());
        cast.default_roles.insert("female".to_string(), "voice-default-female".to_string());

        let assignment = resolve_speaker("ep01", "spk_1", Gender::Female, &registry, &cast).unwrap();
        assert_eq!(assignment.source, VoiceSource::Mapped);
        assert_eq!(assignment.voice_id, "voice-narrator");
    }

    #[test]
    fn unassigned_speaker_falls_back_to_gender() {
        let registry = SpeakerToRole::new();
        let mut cast = RoleCast::default();
        cast.default_roles.insert("male".to_string(), "voice-default-male".to_string());

        let assignment = resolve_speaker("ep01", "spk_2", Gender::Male, &registry, &cast).unwrap();
        assert_eq!(assignment.source, VoiceSource::GenderFallback);
        assert_eq!(assignment.voice_id, "voice-default-male");
    }

    #[test]
    fn unknown_gender_falls_back_to_neutral_voice() {
        let registry = SpeakerToRole::new();
        let mut cast = RoleCast::default();
        cast.default_roles.insert("unknown".to_string(), "voice-neutral".to_string());

        let assignment = resolve_speaker("ep01", "spk_3", Gender::Unknown, &registry, &cast).unwrap();
        assert_eq!(assignment.voice_id, "voice-neutral");
    }

    #[test]
    fn falls_back_to_show_default_voice_when_gender_key_absent() {
        let registry = SpeakerToRole::new();
        let mut cast = RoleCast::default();
        cast.default_voice_id = Some("voice-show-default".to_string());

        let assignment = resolve_speaker("ep01", "spk_5", Gender::Unknown, &registry, &cast).unwrap();
        assert_eq!(assignment.source, VoiceSource::Default);
        assert_eq!(assignment.voice_id, "voice-show-default");
    }

    #[test]
    fn no_mapping_and_no_fallback_is_unresolved() {
        let registry = SpeakerToRole::new();
        let cast = RoleCast::default();
        let result = resolve_speaker("ep01", "spk_4", Gender::Female, &registry, &cast);
        assert!(matches!(result, Err(ModelError::UnresolvedVoice(_))));
    }

    #[test]
    fn role_mapped_but_role_cast_missing_entry_falls_back_to_gender() {
        let registry = registry_with_role("ep01", "spk_1", "ghost_role");
        let mut cast = RoleCast::default();
        cast.default_roles.insert("female".to_string(), "voice-default-female".to_string());

        let assignment = resolve_speaker("ep01", "spk_1", Gender::Female, &registry, &cast).unwrap();
        assert_eq!(assignment.source, VoiceSource::GenderFallback);
    }
}

//! Content-addressed cache for synthesized audio. A blob's key is
//! `H(text_target ‖ voice_id ‖ emotion ‖ synthesizer_version)`; once written
//! a blob is immutable, so two concurrent synthesis tasks computing the
//! same hash may both write and the result is byte-identical either way.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub fn content_hash(text_target: &str, voice_id: &str, emotion: Option<&str>, synthesizer_version: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text_target.as_bytes());
    hasher.update([0u8]);
    hasher.update(voice_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(emotion.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(synthesizer_version.to_le_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        write!(hex, "{:02x}", byte).expect("writing to a String cannot fail");
    }
    hex
}

pub fn cache_path(workspace: &Path, hash: &str) -> PathBuf {
    workspace.join("tts").join("cache").join(format!("{hash}.wav"))
}

pub fn segment_path(workspace: &Path, utt_id: &str) -> PathBuf {
    workspace.join("tts").join("segments").join(format!("{utt_id}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_identical_inputs() {
        let a = content_hash("hello", "voice-1", Some("neutral"), 1);
        let b = content_hash("hello", "voice-1", Some("neutral"), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_changes_with_any_component() {
        let base = content_hash("hello", "voice-1", Some("neutral"), 1);
        assert_ne!(base, content_hash("goodbye", "voice-1", Some("neutral"), 1));
        assert_ne!(base, content_hash("hello", "voice-2", Some("neutral"), 1));
        assert_ne!(base, content_hash("hello", "voice-1", None, 1));
        assert_ne!(base, content_hash("hello", "voice-1", Some("neutral"), 2));
    }
}

//! Resolves the filesystem layout: a per-episode workspace keyed
//! off the input video's file stem, and the show-level directory one
//! level up holding the cross-episode registries.

use std::path::{Path, PathBuf};

/// Every artifact path in the layout, resolved against a video file. Paths
/// here are workspace-relative; `PipelineRunner`/`Phase` resolve them
/// against the episode workspace root.
pub struct EpisodePaths {
    pub episode_key: String,
    pub show_dir: PathBuf,
    pub workspace: PathBuf,
}

impl EpisodePaths {
    pub fn for_video(video: &Path) -> Self {
        let parent = video.parent().unwrap_or_else(|| Path::new("."));
        let episode_key = video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("episode")
            .to_string();
        let show_dir = parent.join(".dubcast");
        let workspace = show_dir.join(&episode_key);
        Self {
            episode_key,
            show_dir,
            workspace,
        }
    }

    pub fn speaker_to_role_path(&self) -> PathBuf {
        self.show_dir.join("voices").join("speaker_to_role.json")
    }

    pub fn role_cast_path(&self) -> PathBuf {
        self.show_dir.join("voices").join("role_cast.json")
    }

    pub fn glossary_path(&self) -> PathBuf {
        self.show_dir.join("dict").join("glossary.json")
    }

    /// Not part of the core filesystem layout but a natural sibling of
    /// `glossary.json`; absent by default, loaded only if present.
    pub fn domain_hints_path(&self) -> PathBuf {
        self.show_dir.join("dict").join("domain_hints.json")
    }

    pub fn show_config_path(&self) -> PathBuf {
        self.show_dir.join("config.toml")
    }

    pub fn episode_config_path(&self) -> PathBuf {
        self.workspace.join("config.toml")
    }
}

pub const RECOGNITION_RAW: &str = "source/recognition_raw.json";
pub const SUBTITLE_MODEL: &str = "source/subtitle_model.json";
pub const DUB_MODEL: &str = "source/dub_model.json";
pub const SUBTITLE_ALIGN: &str = "derive/subtitle_align.json";
pub const VOICE_ASSIGNMENT: &str = "derive/voice_assignment.json";
pub const MT_INPUT: &str = "mt/input.jsonl";
pub const MT_OUTPUT: &str = "mt/output.jsonl";
pub const TTS_SEGMENTS_DIR: &str = "tts/segments";
pub const TTS_SEGMENTS_INDEX: &str = "tts/segments.json";
pub const TTS_REPORT: &str = "tts/report.json";
pub const AUDIO_SOURCE: &str = "audio/source.wav";
pub const AUDIO_VOCALS: &str = "audio/vocals.wav";
pub const AUDIO_ACCOMPANIMENT: &str = "audio/accompaniment.wav";
pub const AUDIO_MIX: &str = "audio/mix.wav";
pub const RENDER_EN_SRT: &str = "render/en.srt";
pub const RENDER_ZH_SRT: &str = "render/zh.srt";
pub const RENDER_DUBBED_MP4: &str = "render/dubbed.mp4";
pub const RENDER_REPORT: &str = "render/report.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_episode_key_from_video_stem() {
        let paths = EpisodePaths::for_video(Path::new("/videos/ep01.mp4"));
        assert_eq!(paths.episode_key, "ep01");
        assert_eq!(paths.show_dir, Path::new("/videos/.dubcast"));
        assert_eq!(paths.workspace, Path::new("/videos/.dubcast/ep01"));
    }
}

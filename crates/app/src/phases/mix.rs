//! Places synthesized segments on the timeline, ducks the accompaniment
//! under them, and loudness-normalizes the result into `audio/mix.wav`.

use std::path::Path;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_model::audio::AudioBuffer;
use dubcast_model::dub::DubModel;
use dubcast_model::segment::SegmentIndex;
use dubcast_mix::{mix, MixerConfig};
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};

use crate::workspace::{AUDIO_ACCOMPANIMENT, AUDIO_MIX, DUB_MODEL, TTS_SEGMENTS_INDEX};

pub struct MixPhase {
    pub config: MixerConfig,
}

#[async_trait]
impl Phase for MixPhase {
    fn name(&self) -> &str {
        "mix"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec![
            "dub_model".to_string(),
            "tts.segments_index".to_string(),
            "audio.accompaniment".to_string(),
        ]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::file("audio.mix", AUDIO_MIX)]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let model_path = ctx.resolve(Path::new(DUB_MODEL));
        let model_bytes = tokio::fs::read(&model_path).await?;
        let model: DubModel =
            serde_json::from_slice(&model_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let index_path = ctx.resolve(Path::new(TTS_SEGMENTS_INDEX));
        let index_bytes = tokio::fs::read(&index_path).await?;
        let segments: SegmentIndex =
            serde_json::from_slice(&index_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let accompaniment_path = ctx.resolve(Path::new(AUDIO_ACCOMPANIMENT));
        let accompaniment = AudioBuffer::read_wav(&accompaniment_path)?;

        let mixed = mix(&model, &segments, &accompaniment, &self.config)?;

        let out_path = ctx.resolve(Path::new(AUDIO_MIX));
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        mixed.write_wav(&out_path)?;
        Ok(())
    }
}

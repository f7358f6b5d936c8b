//! Builds the subtitle model (SSOT #1) from the raw recognition response:
//! normalize the word stream into utterances, then lift them into a
//! `SubtitleModel`, recording any newly seen speakers in `speaker_to_role`.

use std::path::Path;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_model::audio::AudioBuffer;
use dubcast_model::recognition::RawRecognitionResponse;
use dubcast_model::registry::SpeakerToRole;
use dubcast_model::subtitle::SubtitleModel;
use dubcast_normalize::{build_subtitle_model, no_speaker_metadata, normalize, NormalizerConfig};
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};

use crate::registries;
use crate::workspace::{AUDIO_VOCALS, RECOGNITION_RAW, SUBTITLE_MODEL};

pub struct SubtitlePhase {
    pub episode_key: String,
    pub source_lang: String,
    pub speaker_to_role_path: std::path::PathBuf,
    pub normalizer_config: NormalizerConfig,
}

#[async_trait]
impl Phase for SubtitlePhase {
    fn name(&self) -> &str {
        "subtitle"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec!["recognition_raw".to_string()]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::file("subtitle_model", SUBTITLE_MODEL)]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let raw_path = ctx.resolve(Path::new(RECOGNITION_RAW));
        let raw_bytes = tokio::fs::read(&raw_path).await?;
        let response: RawRecognitionResponse = serde_json::from_slice(&raw_bytes)
            .map_err(dubcast_foundation::error::ModelError::from)?;

        let vocals_path = ctx.resolve(Path::new(AUDIO_VOCALS));
        let audio_duration_ms = AudioBuffer::read_wav(&vocals_path)?.duration_ms();

        let genders = response.speaker_genders();
        let normalized = normalize(
            &response.words,
            &response.provider_utterances,
            &genders,
            &self.normalizer_config,
        );

        let mut registry: SpeakerToRole = registries::load_speaker_to_role(&self.speaker_to_role_path)?;
        let model: SubtitleModel = build_subtitle_model(
            &normalized,
            &self.source_lang,
            audio_duration_ms,
            no_speaker_metadata,
            &mut registry,
            &self.episode_key,
        );
        registries::save_speaker_to_role(&self.speaker_to_role_path, &registry)?;

        let out_path = ctx.resolve(Path::new(SUBTITLE_MODEL));
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(&model).map_err(dubcast_foundation::error::ModelError::from)?;
        tokio::fs::write(&out_path, json).await?;
        Ok(())
    }
}

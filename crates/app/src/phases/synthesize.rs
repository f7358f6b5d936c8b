//! Synthesizes every dub utterance concurrently and persists the resulting
//! segment index plus its machine-readable report.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_model::dub::DubModel;
use dubcast_model::voice::VoiceAssignmentSnapshot;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};
use dubcast_render::write_segment_report;
use dubcast_synth::{synthesize_dub_model, SynthesisClient, SynthesizerConfig};

use crate::workspace::{DUB_MODEL, TTS_REPORT, TTS_SEGMENTS_DIR, TTS_SEGMENTS_INDEX, VOICE_ASSIGNMENT};

pub struct SynthesizePhase {
    pub client: Arc<dyn SynthesisClient>,
    pub config: SynthesizerConfig,
}

#[async_trait]
impl Phase for SynthesizePhase {
    fn name(&self) -> &str {
        "synthesize"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec!["dub_model".to_string(), "derive.voice_assignment".to_string()]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::dir("tts.segments_dir", TTS_SEGMENTS_DIR),
            OutputSpec::file("tts.segments_index", TTS_SEGMENTS_INDEX),
        ]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let model_path = ctx.resolve(Path::new(DUB_MODEL));
        let model_bytes = tokio::fs::read(&model_path).await?;
        let model: DubModel =
            serde_json::from_slice(&model_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let voices_path = ctx.resolve(Path::new(VOICE_ASSIGNMENT));
        let voices_bytes = tokio::fs::read(&voices_path).await?;
        let voices: VoiceAssignmentSnapshot =
            serde_json::from_slice(&voices_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let index = synthesize_dub_model(
            &model,
            &voices,
            self.client.clone(),
            &ctx.workspace,
            self.config.clone(),
        )
        .await?;

        let index_path = ctx.resolve(Path::new(TTS_SEGMENTS_INDEX));
        if let Some(parent) = index_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(
            &index_path,
            serde_json::to_vec_pretty(&index).map_err(dubcast_foundation::error::ModelError::from)?,
        )
        .await?;

        let report_path = ctx.resolve(Path::new(TTS_REPORT));
        write_segment_report(&report_path, &index)?;
        Ok(())
    }
}

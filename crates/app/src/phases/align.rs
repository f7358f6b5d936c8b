//! Builds the dub model (SSOT #2) and the derived cue alignment from the
//! subtitle model and the translator's output, then resolves every
//! speaker's voice assignment — the nine-phase DAG names this step
//! "align", so voice resolution is folded in here rather than split out.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use dubcast_align::{align, resolve_all, AlignerConfig};
use dubcast_foundation::error::DubError;
use dubcast_model::recognition::Gender;
use dubcast_model::registry::{RoleCast, SpeakerToRole};
use dubcast_model::subtitle::SubtitleModel;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};
use dubcast_translate::MtOutputRecord;

use crate::registries;
use crate::workspace::{DUB_MODEL, MT_OUTPUT, SUBTITLE_ALIGN, SUBTITLE_MODEL, VOICE_ASSIGNMENT};

pub struct AlignPhase {
    pub episode_key: String,
    pub target_lang: String,
    pub speaker_to_role_path: std::path::PathBuf,
    pub role_cast_path: std::path::PathBuf,
    pub aligner_config: AlignerConfig,
    pub rate_overrides: BTreeMap<String, f64>,
}

#[async_trait]
impl Phase for AlignPhase {
    fn name(&self) -> &str {
        "align"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec!["subtitle_model".to_string(), "mt.output".to_string()]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::file("dub_model", DUB_MODEL),
            OutputSpec::file("derive.subtitle_align", SUBTITLE_ALIGN),
            OutputSpec::file("derive.voice_assignment", VOICE_ASSIGNMENT),
        ]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let model_path = ctx.resolve(Path::new(SUBTITLE_MODEL));
        let model_bytes = tokio::fs::read(&model_path).await?;
        let model: SubtitleModel =
            serde_json::from_slice(&model_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let output_path = ctx.resolve(Path::new(MT_OUTPUT));
        let output_text = tokio::fs::read_to_string(&output_path).await?;
        let mut translations = BTreeMap::new();
        for line in output_text.lines().filter(|l| !l.trim().is_empty()) {
            let record: MtOutputRecord =
                serde_json::from_str(line).map_err(dubcast_foundation::error::ModelError::from)?;
            translations.insert(record.utt_id, record.text_target);
        }

        let result = align(
            &model,
            &translations,
            &self.target_lang,
            &self.aligner_config,
            &self.rate_overrides,
        )?;

        let speaker_to_role: SpeakerToRole = registries::load_speaker_to_role(&self.speaker_to_role_path)?;
        let role_cast: RoleCast = registries::load_role_cast(&self.role_cast_path)?;
        let mut dub_speakers: BTreeMap<String, Gender> = BTreeMap::new();
        for utterance in &result.dub_model.utterances {
            dub_speakers.insert(utterance.speaker_id.clone(), utterance.gender);
        }
        let voices = resolve_all(&self.episode_key, &dub_speakers, &speaker_to_role, &role_cast)?;

        let dub_model_path = ctx.resolve(Path::new(DUB_MODEL));
        let subtitle_align_path = ctx.resolve(Path::new(SUBTITLE_ALIGN));
        let voice_assignment_path = ctx.resolve(Path::new(VOICE_ASSIGNMENT));
        if let Some(parent) = dub_model_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Some(parent) = subtitle_align_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(
            &dub_model_path,
            serde_json::to_vec_pretty(&result.dub_model).map_err(dubcast_foundation::error::ModelError::from)?,
        )
        .await?;
        tokio::fs::write(
            &subtitle_align_path,
            serde_json::to_vec_pretty(&result.subtitle_align).map_err(dubcast_foundation::error::ModelError::from)?,
        )
        .await?;
        tokio::fs::write(
            &voice_assignment_path,
            serde_json::to_vec_pretty(&voices).map_err(dubcast_foundation::error::ModelError::from)?,
        )
        .await?;
        Ok(())
    }
}

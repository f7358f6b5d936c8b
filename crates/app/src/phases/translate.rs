//! Translates every utterance in the subtitle model and persists the
//! `mt/input.jsonl` / `mt/output.jsonl` audit trail.

use std::path::Path;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_model::glossary::{DomainHints, Glossary};
use dubcast_model::subtitle::SubtitleModel;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};
use dubcast_translate::{render_jsonl, translate_subtitle_model, RetryConfig, TranslationClient};

use crate::workspace::{MT_INPUT, MT_OUTPUT, SUBTITLE_MODEL};

pub struct TranslatePhase {
    pub client: Box<dyn TranslationClient>,
    pub glossary: Glossary,
    pub domain_hints: Option<DomainHints>,
    pub include_episode_context: bool,
    pub retry: RetryConfig,
}

#[async_trait]
impl Phase for TranslatePhase {
    fn name(&self) -> &str {
        "translate"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec!["subtitle_model".to_string()]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::file("mt.input", MT_INPUT),
            OutputSpec::file("mt.output", MT_OUTPUT),
        ]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let model_path = ctx.resolve(Path::new(SUBTITLE_MODEL));
        let model_bytes = tokio::fs::read(&model_path).await?;
        let model: SubtitleModel =
            serde_json::from_slice(&model_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let run = translate_subtitle_model(
            &model,
            self.client.as_ref(),
            &self.glossary,
            self.domain_hints.as_ref(),
            self.include_episode_context,
            self.retry,
        )
        .await?;

        let input_path = ctx.resolve(Path::new(MT_INPUT));
        let output_path = ctx.resolve(Path::new(MT_OUTPUT));
        if let Some(parent) = input_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&input_path, render_jsonl(&run.input_records)?).await?;
        tokio::fs::write(&output_path, render_jsonl(&run.output_records)?).await?;
        Ok(())
    }
}

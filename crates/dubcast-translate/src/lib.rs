pub mod client;
pub mod prompt;
pub mod translator;

pub use client::{HttpTranslationClient, TranslationClient, TranslationRequest};
pub use prompt::{build_prompt, TranslationPrompt};
pub use translator::{
    render_jsonl, translate_subtitle_model, MtInputRecord, MtOutputRecord, RetryConfig, TranslationRun,
};

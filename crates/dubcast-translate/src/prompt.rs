//! Builds the per-utterance translation prompt: source text plus optional
//! full-episode context, a glossary fragment filtered to this utterance's
//! surface forms, and a domain hint injected only when a trigger token is
//! present. Global (whole-glossary) injection is deliberately not
//! supported — it would cross-contaminate unrelated utterances.

use dubcast_model::glossary::{DomainHints, Glossary, GlossaryEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationPrompt {
    pub source_text: String,
    pub episode_context: Option<String>,
    pub glossary_fragment: Vec<GlossaryEntry>,
    pub domain_hint: Option<String>,
}

impl TranslationPrompt {
    /// Renders the prompt into a single string a text-completion style
    /// translation request can send verbatim. Kept deterministic so the
    /// same inputs always produce byte-identical requests (translation
    /// *output* is not assumed to be deterministic — only our request).
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        if let Some(context) = &self.episode_context {
            sections.push(format!("Episode context:\n{context}"));
        }

        if !self.glossary_fragment.is_empty() {
            let mut lines = String::new();
            for entry in &self.glossary_fragment {
                lines.push_str(&format!("{} => {}\n", entry.surface, entry.translation));
            }
            sections.push(format!("Glossary:\n{lines}"));
        }

        if let Some(hint) = &self.domain_hint {
            sections.push(format!("Domain hint: {hint}"));
        }

        sections.push(format!("Translate to English:\n{}", self.source_text));
        sections.join("\n\n")
    }
}

/// Builds the prompt for one utterance. `episode_context` is the full
/// episode's source text, included only when `include_episode_context` is
/// true. Glossary and domain-hint injection are always scoped to
/// `source_text` alone.
pub fn build_prompt(
    source_text: &str,
    episode_context: Option<&str>,
    include_episode_context: bool,
    glossary: &Glossary,
    domain_hints: Option<&DomainHints>,
) -> TranslationPrompt {
    let glossary_fragment = glossary
        .entries_matching(source_text)
        .into_iter()
        .cloned()
        .collect();

    let domain_hint = domain_hints
        .filter(|hints| hints.applies_to(source_text))
        .map(|hints| hints.hint_text.clone());

    TranslationPrompt {
        source_text: source_text.to_string(),
        episode_context: include_episode_context
            .then(|| episode_context.map(str::to_string))
            .flatten(),
        glossary_fragment,
        domain_hint,
    }
}

//! Per-run glossary and domain-hint configuration consumed by the
//! translator. Glossary entries are injected into a translation prompt
//! only when their surface form occurs in that utterance's source text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub surface: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Glossary {
    pub entries: Vec<GlossaryEntry>,
}

impl Glossary {
    /// Only the entries whose surface form actually occurs in `source_text`
    /// — mandatory per-utterance filtering; never inject the whole glossary.
    pub fn entries_matching(&self, source_text: &str) -> Vec<&GlossaryEntry> {
        self.entries
            .iter()
            .filter(|e| source_text.contains(&e.surface))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainHints {
    pub trigger_tokens: Vec<String>,
    pub hint_text: String,
}

impl DomainHints {
    /// Domain hints are injected only when the utterance contains one of
    /// the configured trigger tokens, never unconditionally.
    pub fn applies_to(&self, source_text: &str) -> bool {
        self.trigger_tokens.iter().any(|t| source_text.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glossary_filters_to_utterance_text() {
        let glossary = Glossary {
            entries: vec![
                GlossaryEntry {
                    surface: "霹雳".into(),
                    translation: "Pili".into(),
                    note: None,
                },
                GlossaryEntry {
                    surface: "素還真".into(),
                    translation: "Su Huan-Jen".into(),
                    note: None,
                },
            ],
        };
        let matches = glossary.entries_matching("霹雳布袋戏");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].translation, "Pili");
    }

    #[test]
    fn domain_hints_require_trigger_token() {
        let hints = DomainHints {
            trigger_tokens: vec!["武功".into()],
            hint_text: "martial-arts terminology".into(),
        };
        assert!(hints.applies_to("他的武功很强"));
        assert!(!hints.applies_to("今天天气很好"));
    }
}

//! Layered pipeline configuration: built-in defaults, an optional
//! show-level TOML file, an optional episode-level override file, then
//! environment variables (`DUBCAST_*`), each layer overriding the last, via
//! the `config` crate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gap between words, in milliseconds, that forces an utterance break.
    pub silence_gap_ms: u64,
    /// Hard cap on a single utterance's duration in milliseconds.
    pub max_utterance_ms: u64,
    /// Target character count per subtitle cue when splitting a long utterance.
    pub cue_chars: usize,
    /// Maximum speech-rate multiplier the aligner may apply when compressing
    /// synthesized audio to fit its budget.
    pub max_rate: f64,
    /// Number of utterances synthesized concurrently.
    pub synthesis_concurrency: usize,
    /// Maximum attempts for a transient external-service error.
    pub retry_max_attempts: u32,
    /// Base delay, in milliseconds, for exponential retry backoff.
    pub retry_base_delay_ms: u64,
    /// Initial delay between recognition job polls, doubling after each
    /// pending response up to a fixed cap.
    pub recognition_poll_interval_ms: u64,
    /// Total wall-clock budget, in seconds, for a recognition job to move
    /// from submitted to done before the phase fails.
    pub recognition_poll_deadline_secs: u64,
    /// Target integrated loudness in LUFS for the final mix.
    pub target_lufs: f64,
    /// Target true-peak ceiling in dBTP for the final mix.
    pub target_true_peak_dbtp: f64,
    /// Milliseconds an utterance's `end_ms` may be extended, never past the
    /// next utterance's start.
    pub end_extension_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            silence_gap_ms: 450,
            max_utterance_ms: 8_000,
            cue_chars: 42,
            max_rate: 1.3,
            synthesis_concurrency: 4,
            retry_max_attempts: 4,
            retry_base_delay_ms: 500,
            recognition_poll_interval_ms: 3_000,
            recognition_poll_deadline_secs: 600,
            target_lufs: -16.0,
            target_true_peak_dbtp: -1.5,
            end_extension_ms: 200,
        }
    }
}

impl PipelineConfig {
    /// Loads defaults, then merges a show-level file, an episode-level
    /// override file, and `DUBCAST_*` environment variables, in that order.
    /// Missing files are skipped silently; a present-but-malformed file is
    /// a `ConfigError`.
    pub fn load(
        show_config: Option<&Path>,
        episode_config: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&PipelineConfig::default())?);

        if let Some(path) = show_config {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }
        if let Some(path) = episode_config {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DUBCAST").separator("__"),
        );

        let built = builder.build()?;
        let cfg: PipelineConfig = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1.0..=1.5).contains(&self.max_rate) {
            return Err(ConfigError::Validation {
                field: "max_rate".into(),
                reason: format!("must be within [1.0, 1.5], got {}", self.max_rate),
            });
        }
        if self.silence_gap_ms == 0 {
            return Err(ConfigError::Validation {
                field: "silence_gap_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_utterance_ms < self.silence_gap_ms {
            return Err(ConfigError::Validation {
                field: "max_utterance_ms".into(),
                reason: "must be at least silence_gap_ms".into(),
            });
        }
        if self.synthesis_concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "synthesis_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.recognition_poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "recognition_poll_interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.recognition_poll_deadline_secs == 0 {
            return Err(ConfigError::Validation {
                field: "recognition_poll_deadline_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_max_rate() {
        let mut cfg = PipelineConfig::default();
        cfg.max_rate = 2.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_with_no_files_returns_defaults() {
        let cfg = PipelineConfig::load(None, None).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }
}

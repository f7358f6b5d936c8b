//! Mixer orchestration: places segments, ducks the accompaniment
//! under them, fits the result to the source duration, and normalizes
//! loudness. The earlier design of globally time-stretching a
//! concatenation of segments is explicitly rejected in favor of this
//! fixed, absolute-timeline placement.

use dubcast_foundation::error::ModelError;
use dubcast_model::audio::AudioBuffer;
use dubcast_model::dub::DubModel;
use dubcast_model::segment::SegmentIndex;

use crate::duck::{duck_and_overlay, DuckConfig};
use crate::loudness::normalize;
use crate::timeline::{fit_to_duration, place_segments};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerConfig {
    pub target_lufs: f64,
    pub target_true_peak_dbtp: f64,
    pub duck: DuckConfig,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            target_lufs: -16.0,
            target_true_peak_dbtp: -1.5,
            duck: DuckConfig::default(),
        }
    }
}

/// Produces the final mix: `accompaniment` (from vocal separation) with
/// the synthesized dub track placed on top, ducked, padded/truncated to
/// `model.audio_duration_ms`, and loudness-normalized.
pub fn mix(
    model: &DubModel,
    segments: &SegmentIndex,
    accompaniment: &AudioBuffer,
    config: &MixerConfig,
) -> Result<AudioBuffer, ModelError> {
    let speech = place_segments(model, segments, accompaniment.sample_rate)?;
    let overlaid = duck_and_overlay(accompaniment, &speech, &config.duck);
    let fitted = fit_to_duration(&overlaid, model.audio_duration_ms);
    Ok(normalize(&fitted, config.target_lufs, config.target_true_peak_dbtp))
}

/// Checks the testable invariant that no placed segment sample lands
/// outside `[start_ms, start_ms + budget_ms + 200]` for any utterance.
/// Intended for tests and the phase's own post-condition check, not for
/// production gating (a violation here means a prior bug, not bad input).
pub fn no_audio_outside_windows(model: &DubModel, segments: &SegmentIndex, sample_rate: u32, canvas: &AudioBuffer) -> bool {
    let mut allowed = vec![false; canvas.samples.len()];
    for utterance in &model.utterances {
        if !segments.entries.contains_key(&utterance.utt_id) {
            continue;
        }
        let start = (utterance.start_ms * sample_rate as u64 / 1000) as usize;
        let end = ((utterance.start_ms + utterance.budget_ms + crate::timeline::OVERFLOW_ALLOWANCE_MS) * sample_rate as u64 / 1000)
            as usize;
        for slot in allowed.iter_mut().take(end.min(allowed.len())).skip(start.min(allowed.len())) {
            *slot = true;
        }
    }
    canvas
        .samples
        .iter()
        .zip(allowed.iter())
        .all(|(sample, is_allowed)| *is_allowed || sample.abs() < 1e-6)
}

//! Absolute-timeline placement: every synthesized segment
//! lands at its utterance's `start_ms`, never stretched, truncated to
//! `budget_ms + 200` ms. Segments are written in ascending `start_ms` order
//! directly onto the canvas (no additive mixing between speech segments),
//! so any residual overlap truncates the earlier segment's tail rather
//! than summing over it.

use dubcast_foundation::error::ModelError;
use dubcast_model::audio::AudioBuffer;
use dubcast_model::dub::DubModel;
use dubcast_model::segment::SegmentIndex;

/// Milliseconds of slack added to `budget_ms` before a segment is truncated,
/// matching the aligner's own `end_ms` extension allowance.
pub const OVERFLOW_ALLOWANCE_MS: u64 = 200;

/// Places every utterance's synthesized segment onto a silent canvas sized
/// to `model.audio_duration_ms` at `sample_rate`. Missing segment entries
/// (an utterance the synthesizer never touched) are skipped, leaving
/// silence in their place.
pub fn place_segments(
    model: &DubModel,
    segments: &SegmentIndex,
    sample_rate: u32,
) -> Result<AudioBuffer, ModelError> {
    let mut canvas = AudioBuffer::silent(sample_rate, model.audio_duration_ms);

    let mut ordered = model.utterances.clone();
    ordered.sort_by_key(|u| u.start_ms);

    for utterance in &ordered {
        let Some(entry) = segments.entries.get(&utterance.utt_id) else {
            continue;
        };
        let segment = AudioBuffer::read_wav(&entry.wav_path)?;
        let resampled = if segment.sample_rate == sample_rate {
            segment
        } else {
            resample_nearest(&segment, sample_rate)
        };

        let max_samples = ((utterance.budget_ms + OVERFLOW_ALLOWANCE_MS) as u64 * sample_rate as u64 / 1000) as usize;
        let start_idx = (utterance.start_ms as u64 * sample_rate as u64 / 1000) as usize;
        let usable_len = resampled.samples.len().min(max_samples);

        for i in 0..usable_len {
            let idx = start_idx + i;
            if idx >= canvas.samples.len() {
                break;
            }
            canvas.samples[idx] = resampled.samples[i];
        }
    }

    Ok(canvas)
}

/// Nearest-neighbor resampling for the rare case a synthesis provider's
/// sample rate differs from the mix's working rate. Not used for
/// time-compression (that is `dubcast_synth::ola::time_compress`'s job) —
/// only to reconcile sample rate, which never happens on the same audio.
fn resample_nearest(buffer: &AudioBuffer, target_rate: u32) -> AudioBuffer {
    if buffer.sample_rate == 0 || buffer.samples.is_empty() {
        return AudioBuffer {
            sample_rate: target_rate,
            samples: Vec::new(),
        };
    }
    let ratio = target_rate as f64 / buffer.sample_rate as f64;
    let out_len = ((buffer.samples.len() as f64) * ratio).round() as usize;
    let samples = (0..out_len)
        .map(|i| {
            let src_idx = ((i as f64) / ratio).round() as usize;
            buffer.samples[src_idx.min(buffer.samples.len() - 1)]
        })
        .collect();
    AudioBuffer {
        sample_rate: target_rate,
        samples,
    }
}

/// Pads with silence or truncates `buffer` so its length is exactly
/// `duration_ms` at its own sample rate — the final step before loudness
/// normalization.
pub fn fit_to_duration(buffer: &AudioBuffer, duration_ms: u64) -> AudioBuffer {
    let target_len = (duration_ms as u64 * buffer.sample_rate as u64 / 1000) as usize;
    let mut samples = buffer.samples.clone();
    samples.resize(target_len, 0.0);
    AudioBuffer {
        sample_rate: buffer.sample_rate,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubcast_model::dub::{DubUtterance, TtsPolicy};
    use dubcast_model::recognition::Gender;
    use dubcast_model::segment::{SegmentEntry, SegmentStatus};

    fn utterance(utt_id: &str, start_ms: u64, budget_ms: u64) -> DubUtterance {
        DubUtterance {
            utt_id: utt_id.into(),
            start_ms,
            end_ms: start_ms + budget_ms,
            budget_ms,
            text_source: "x".into(),
            text_target: "y".into(),
            speaker_id: "spk_1".into(),
            gender: Gender::Unknown,
            emotion: None,
            tts_policy: TtsPolicy::default(),
        }
    }

    fn write_tone(dir: &std::path::Path, name: &str, sample_rate: u32, len: usize, amplitude: f32) -> std::path::PathBuf {
        let path = dir.join(name);
        let buffer = AudioBuffer {
            sample_rate,
            samples: vec![amplitude; len],
        };
        buffer.write_wav(&path).unwrap();
        path
    }

    #[test]
    fn places_a_segment_at_its_absolute_start_offset() {
        let dir = tempfile::tempdir().unwrap();
        let sample_rate = 1000u32;
        let path = write_tone(dir.path(), "seg.wav", sample_rate, 500, 0.5);

        let model = DubModel {
            audio_duration_ms: 3000,
            utterances: vec![utterance("utt_0001", 1000, 500)],
        };
        let mut segments = SegmentIndex::new();
        segments.insert(
            "utt_0001",
            SegmentEntry {
                wav_path: path,
                voice_id: "v1".into(),
                duration_ms: 500,
                rate: 1.0,
                content_hash: "h".into(),
                status: SegmentStatus::Succeeded,
            },
        );

        let canvas = place_segments(&model, &segments, sample_rate).unwrap();
        assert_eq!(canvas.samples.len(), 3000);
        assert_eq!(canvas.samples[999], 0.0);
        assert_eq!(canvas.samples[1000], 0.5);
        assert_eq!(canvas.samples[1499], 0.5);
        assert_eq!(canvas.samples[1700], 0.0);
    }

    #[test]
    fn overlapping_segment_truncates_the_earlier_one() {
        let dir = tempfile::tempdir().unwrap();
        let sample_rate = 1000u32;
        let first = write_tone(dir.path(), "first.wav", sample_rate, 800, 0.3);
        let second = write_tone(dir.path(), "second.wav", sample_rate, 300, 0.9);

        let model = DubModel {
            audio_duration_ms: 2000,
            utterances: vec![utterance("utt_0001", 0, 800), utterance("utt_0002", 700, 300)],
        };
        let mut segments = SegmentIndex::new();
        segments.insert(
            "utt_0001",
            SegmentEntry {
                wav_path: first,
                voice_id: "v1".into(),
                duration_ms: 800,
                rate: 1.0,
                content_hash: "h1".into(),
                status: SegmentStatus::Succeeded,
            },
        );
        segments.insert(
            "utt_0002",
            SegmentEntry {
                wav_path: second,
                voice_id: "v1".into(),
                duration_ms: 300,
                rate: 1.0,
                content_hash: "h2".into(),
                status: SegmentStatus::Succeeded,
            },
        );

        let canvas = place_segments(&model, &segments, sample_rate).unwrap();
        assert_eq!(canvas.samples[690], 0.3);
        assert_eq!(canvas.samples[700], 0.9);
        assert_eq!(canvas.samples[999], 0.9);
    }

    #[test]
    fn fit_to_duration_pads_short_buffers_with_silence() {
        let buffer = AudioBuffer {
            sample_rate: 1000,
            samples: vec![0.5; 500],
        };
        let fitted = fit_to_duration(&buffer, 1000);
        assert_eq!(fitted.samples.len(), 1000);
        assert_eq!(fitted.samples[999], 0.0);
    }
}

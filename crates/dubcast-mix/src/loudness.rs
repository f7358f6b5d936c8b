//! Loudness normalization, the mixer's final step. This is a simplified RMS-based
//! stand-in for full EBU R128 (K-weighted) loudness measurement — no crate
//! in the dependency stack implements ITU-R BS.1770 K-weighting, and
//! pulling one in for a single gain computation isn't warranted. The
//! approximation: scale the whole buffer so its RMS level in dBFS matches
//! `target_lufs` numerically, then apply a simple peak limiter so no
//! sample exceeds `target_true_peak_dbtp`.

use dubcast_model::audio::AudioBuffer;

const SILENCE_FLOOR_DB: f64 = -90.0;

fn rms_dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return SILENCE_FLOOR_DB;
    }
    let sum_sq: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms <= 0.0 {
        SILENCE_FLOOR_DB
    } else {
        20.0 * rms.log10()
    }
}

fn peak_dbfs(samples: &[f32]) -> f64 {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak <= 0.0 {
        SILENCE_FLOOR_DB
    } else {
        20.0 * (peak as f64).log10()
    }
}

/// Scales `buffer` so its RMS level matches `target_lufs`, then limits the
/// result so its peak never exceeds `target_true_peak_dbtp`.
pub fn normalize(buffer: &AudioBuffer, target_lufs: f64, target_true_peak_dbtp: f64) -> AudioBuffer {
    let current = rms_dbfs(&buffer.samples);
    let gain_db = target_lufs - current;
    let gain = 10f64.powf(gain_db / 20.0);

    let mut samples: Vec<f32> = buffer.samples.iter().map(|s| (*s as f64 * gain) as f32).collect();

    let peak_after_gain = peak_dbfs(&samples);
    if peak_after_gain > target_true_peak_dbtp {
        let limiter_gain_db = target_true_peak_dbtp - peak_after_gain;
        let limiter_gain = 10f64.powf(limiter_gain_db / 20.0);
        for sample in samples.iter_mut() {
            *sample = (*sample as f64 * limiter_gain) as f32;
        }
    }

    AudioBuffer {
        sample_rate: buffer.sample_rate,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_buffer_normalizes_to_silence() {
        let buffer = AudioBuffer {
            sample_rate: 1000,
            samples: vec![0.0; 100],
        };
        let normalized = normalize(&buffer, -16.0, -1.5);
        assert!(normalized.samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn quiet_buffer_is_boosted_toward_target_level() {
        let buffer = AudioBuffer {
            sample_rate: 1000,
            samples: vec![0.01; 1000],
        };
        let normalized = normalize(&buffer, -16.0, -1.5);
        let before = rms_dbfs(&buffer.samples);
        let after = rms_dbfs(&normalized.samples);
        assert!(after > before, "expected boosted level, before={before} after={after}");
    }

    #[test]
    fn loud_buffer_never_exceeds_the_true_peak_ceiling() {
        let buffer = AudioBuffer {
            sample_rate: 1000,
            samples: vec![0.99; 1000],
        };
        let normalized = normalize(&buffer, -6.0, -1.5);
        let peak = peak_dbfs(&normalized.samples);
        assert!(peak <= -1.5 + 1e-6, "peak {peak} exceeded ceiling");
    }
}

//! Sidechain-style ducking: the accompaniment track
//! attenuates while the placed speech canvas is active, with a short
//! attack/release ramp so the gain change is not audible as a click.

use dubcast_model::audio::AudioBuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckConfig {
    /// How much to attenuate the accompaniment while speech is active, in dB
    /// (a positive number of dB of reduction).
    pub attenuation_db: f64,
    /// Ramp length, in milliseconds, for the gain to fall to its ducked
    /// floor once speech starts.
    pub attack_ms: u64,
    /// Ramp length, in milliseconds, for the gain to climb back to unity
    /// once speech ends.
    pub release_ms: u64,
    /// Absolute sample amplitude above which the speech canvas counts as
    /// "active" at a given sample.
    pub activity_threshold: f32,
}

impl Default for DuckConfig {
    fn default() -> Self {
        Self {
            attenuation_db: 12.0,
            attack_ms: 80,
            release_ms: 250,
            activity_threshold: 0.01,
        }
    }
}

/// Overlays `speech` onto `accompaniment` (both already the same length and
/// sample rate), ducking the accompaniment under an envelope derived from
/// where `speech` is active.
pub fn duck_and_overlay(accompaniment: &AudioBuffer, speech: &AudioBuffer, config: &DuckConfig) -> AudioBuffer {
    let sample_rate = accompaniment.sample_rate.max(1);
    let len = accompaniment.samples.len().max(speech.samples.len());
    let floor_gain = 10f64.powf(-config.attenuation_db / 20.0) as f32;

    let attack_samples = (config.attack_ms as u64 * sample_rate as u64 / 1000).max(1) as usize;
    let release_samples = (config.release_ms as u64 * sample_rate as u64 / 1000).max(1) as usize;

    let mut active = vec![false; len];
    for (i, sample) in speech.samples.iter().enumerate() {
        if sample.abs() > config.activity_threshold {
            active[i] = true;
        }
    }

    let mut gain = 1.0f32;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let target = if active[i] { floor_gain } else { 1.0 };
        let step_count = if target < gain { attack_samples } else { release_samples };
        let step = (1.0 - floor_gain).max(f32::EPSILON) / step_count as f32;
        if gain < target {
            gain = (gain + step).min(target);
        } else if gain > target {
            gain = (gain - step).max(target);
        }

        let accompaniment_sample = accompaniment.samples.get(i).copied().unwrap_or(0.0);
        let speech_sample = speech.samples.get(i).copied().unwrap_or(0.0);
        out.push(accompaniment_sample * gain + speech_sample);
    }

    AudioBuffer {
        sample_rate,
        samples: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accompaniment_attenuates_while_speech_is_active() {
        let accompaniment = AudioBuffer {
            sample_rate: 1000,
            samples: vec![1.0; 2000],
        };
        let mut speech_samples = vec![0.0; 2000];
        for s in speech_samples.iter_mut().take(1500).skip(500) {
            *s = 0.8;
        }
        let speech = AudioBuffer {
            sample_rate: 1000,
            samples: speech_samples,
        };

        let config = DuckConfig::default();
        let mixed = duck_and_overlay(&accompaniment, &speech, &config);

        // Well inside the speech region, after the attack ramp settles,
        // the accompaniment contribution should be meaningfully reduced.
        let settled = mixed.samples[1200] - speech.samples[1200];
        assert!(settled < 0.9, "expected ducked accompaniment, got {settled}");

        // Well outside the speech region the accompaniment should be near unity.
        assert!((mixed.samples[50] - 1.0).abs() < 0.05);
    }
}

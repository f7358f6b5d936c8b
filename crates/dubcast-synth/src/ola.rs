//! Overlap-add time-scale modification: shortens a PCM buffer by `rate`
//! without resampling (so pitch is preserved), the way the synthesizer
//! compresses an utterance that runs over its budget.

const FRAME_DIVISOR: usize = 4;

/// Returns `samples` played back `rate` times faster using windowed
/// overlap-add (analysis hop fixed, synthesis hop shrunk by `rate`).
/// `rate <= 1.0` is a no-op: compression only ever shortens audio.
pub fn time_compress(samples: &[f32], rate: f64) -> Vec<f32> {
    if rate <= 1.0 || samples.is_empty() {
        return samples.to_vec();
    }

    let frame_len = (samples.len() / FRAME_DIVISOR).clamp(64, 2048).min(samples.len());
    if frame_len < 2 {
        return samples.to_vec();
    }
    let analysis_hop = frame_len / 2;
    let synthesis_hop = ((analysis_hop as f64) / rate).round().max(1.0) as usize;

    let window = hann_window(frame_len);
    let output_len = (((samples.len() - frame_len) as f64 / analysis_hop as f64).floor() as usize + 1)
        * synthesis_hop
        + frame_len;
    let mut output = vec![0.0f32; output_len];
    let mut weight = vec![0.0f32; output_len];

    let mut in_pos = 0usize;
    let mut out_pos = 0usize;
    while in_pos + frame_len <= samples.len() {
        for i in 0..frame_len {
            output[out_pos + i] += samples[in_pos + i] * window[i];
            weight[out_pos + i] += window[i];
        }
        in_pos += analysis_hop;
        out_pos += synthesis_hop;
    }

    for (sample, w) in output.iter_mut().zip(weight.iter()) {
        if *w > 1e-6 {
            *sample /= w;
        }
    }

    let target_len = ((samples.len() as f64) / rate).round() as usize;
    output.truncate(target_len.min(output.len()));
    output
}

fn hann_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| {
            let x = std::f64::consts::PI * 2.0 * (i as f64) / ((len - 1) as f64);
            (0.5 - 0.5 * x.cos()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_at_or_below_one_is_a_no_op() {
        let samples = vec![0.1; 1000];
        assert_eq!(time_compress(&samples, 1.0), samples);
        assert_eq!(time_compress(&samples, 0.8), samples);
    }

    #[test]
    fn compression_shortens_the_buffer_by_roughly_the_rate() {
        let samples: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.01).sin()).collect();
        let compressed = time_compress(&samples, 1.3);
        let expected = (samples.len() as f64 / 1.3).round() as usize;
        let tolerance = (expected as f64 * 0.1) as usize + 16;
        assert!(
            compressed.len().abs_diff(expected) <= tolerance,
            "compressed len {} expected near {}",
            compressed.len(),
            expected
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(time_compress(&[], 1.3).is_empty());
    }
}

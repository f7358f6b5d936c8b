//! SRT rendering for `render/{en,zh}.srt`: one file from the subtitle
//! model's own source-language cues, one from the aligner's rebuilt
//! target-language cues.

use dubcast_model::align::SubtitleAlignment;
use dubcast_model::subtitle::{Cue, SubtitleModel};

/// Renders the subtitle model's source-language cues (as authored or
/// hand-edited) into SRT text, in utterance order.
pub fn render_source_srt(model: &SubtitleModel) -> String {
    let mut cues: Vec<&Cue> = model.utterances.iter().flat_map(|u| u.cues.iter()).collect();
    cues.sort_by_key(|c| c.start_ms);
    render_cues(cues.into_iter())
}

/// Renders the aligner's rebuilt target-language cues into SRT text, in
/// `utt_id` order (the alignment's `BTreeMap` keeps this deterministic and
/// — since `utt_id`s are assigned in recognition order — chronological).
pub fn render_target_srt(alignment: &SubtitleAlignment) -> String {
    let cues = alignment.cues_by_utterance.values().flat_map(|cues| cues.iter());
    render_cues(cues)
}

fn render_cues<'a>(cues: impl Iterator<Item = &'a Cue>) -> String {
    let mut out = String::new();
    for (index, cue) in cues.enumerate() {
        out.push_str(&(index + 1).to_string());
        out.push('\n');
        out.push_str(&format_timestamp(cue.start_ms));
        out.push_str(" --> ");
        out.push_str(&format_timestamp(cue.end_ms));
        out.push('\n');
        out.push_str(&cue.source.text);
        out.push_str("\n\n");
    }
    out
}

fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

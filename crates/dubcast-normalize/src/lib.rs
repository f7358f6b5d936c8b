pub mod normalizer;
pub mod subtitle_builder;

pub use normalizer::{normalize, NormalizerConfig};
pub use subtitle_builder::{build_subtitle_model, no_speaker_metadata, SpeakerMetadata};

pub mod cache;
pub mod client;
pub mod ola;
pub mod synthesizer;

pub use cache::{cache_path, content_hash, segment_path};
pub use client::{HttpSynthesisClient, SynthesisClient, SynthesisRequest};
pub use ola::time_compress;
pub use synthesizer::{synthesize_dub_model, SynthesizerConfig};

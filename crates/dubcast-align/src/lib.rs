pub mod aligner;
pub mod voice;

pub use aligner::{align, AlignerConfig, AlignmentResult};
pub use voice::{resolve_all, resolve_speaker};

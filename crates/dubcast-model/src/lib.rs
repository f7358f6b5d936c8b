pub mod align;
pub mod audio;
pub mod dub;
pub mod glossary;
pub mod manifest;
pub mod normalize;
pub mod recognition;
pub mod registry;
pub mod report;
pub mod segment;
pub mod subtitle;
pub mod voice;

pub use align::SubtitleAlignment;
pub use audio::AudioBuffer;
pub use dub::{DubModel, DubUtterance, TtsPolicy};
pub use glossary::{DomainHints, Glossary, GlossaryEntry};
pub use manifest::{Manifest, PhaseRecord, PhaseStatus};
pub use normalize::NormalizedUtterance;
pub use recognition::{Gender, ProviderUtterance, RawRecognitionResponse, Word};
pub use registry::{RoleCast, SpeakerToRole};
pub use report::{PhaseRunOutcome, PhaseSummary, RunSummary};
pub use segment::{SegmentEntry, SegmentIndex, SegmentStatus};
pub use subtitle::{AudioInfo, Cue, CueSource, Schema, SpeakerInfo, SubtitleModel, SubtitleUtterance};
pub use voice::{VoiceAssignment, VoiceAssignmentSnapshot, VoiceSource};

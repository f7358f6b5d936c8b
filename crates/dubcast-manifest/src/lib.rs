pub mod bless;
pub mod fingerprint;
pub mod should_run;
pub mod store;

pub use bless::{bless, OutputDeclaration};
pub use fingerprint::{digest_bytes, fingerprint_config, fingerprint_dir, fingerprint_file};
pub use should_run::{evaluate, PhaseEvaluation, RunReason, ShouldRun};
pub use store::ManifestStore;

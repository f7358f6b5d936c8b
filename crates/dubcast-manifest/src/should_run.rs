//! The eight ordered should-run rules. The first matching rule
//! wins; callers evaluate rules in this exact order and stop at the first
//! match, so reordering them would change behavior.

use std::collections::BTreeMap;

use dubcast_model::{Manifest, PhaseStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldRun {
    Run(RunReason),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunReason {
    Forced,
    NoManifestRecord,
    VersionBump,
    InputFingerprintMismatch,
    ConfigFingerprintMismatch,
    OutputFingerprintMismatch,
    PreviousFailure,
}

/// Everything the should-run decision needs to know about one phase for
/// one evaluation: its declared version, current config fingerprint, and
/// the current on-disk fingerprints of its declared inputs and outputs.
pub struct PhaseEvaluation<'a> {
    pub phase_name: &'a str,
    pub forced: bool,
    pub current_version: u32,
    pub current_config_fingerprint: &'a str,
    pub current_input_fingerprints: &'a BTreeMap<String, String>,
    pub current_output_fingerprints: &'a BTreeMap<String, String>,
}

/// Evaluates the eight should-run rules in order against the manifest's
/// recorded state for this phase.
pub fn evaluate(manifest: &Manifest, eval: &PhaseEvaluation) -> ShouldRun {
    if eval.forced {
        return ShouldRun::Run(RunReason::Forced);
    }

    let record = match manifest.record_for(eval.phase_name) {
        Some(record) => record,
        None => return ShouldRun::Run(RunReason::NoManifestRecord),
    };

    if record.version != eval.current_version {
        return ShouldRun::Run(RunReason::VersionBump);
    }

    if record.input_fingerprints != *eval.current_input_fingerprints {
        return ShouldRun::Run(RunReason::InputFingerprintMismatch);
    }

    if record.config_fingerprint != eval.current_config_fingerprint {
        return ShouldRun::Run(RunReason::ConfigFingerprintMismatch);
    }

    if record.output_fingerprints != *eval.current_output_fingerprints {
        return ShouldRun::Run(RunReason::OutputFingerprintMismatch);
    }

    if record.status != PhaseStatus::Succeeded {
        return ShouldRun::Run(RunReason::PreviousFailure);
    }

    ShouldRun::Skip
}

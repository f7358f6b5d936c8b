//! Foundation crate tests
//!
//! Tests cover:
//! - Error types (DubError variants, ConfigError, ManifestError, ExternalError)
//! - Workspace lock exclusivity
//! - Run state transitions

use dubcast_foundation::error::{
    ConfigError, DubError, ExternalError, ManifestError, ModelError, PhaseError, RecoveryStrategy,
};
use dubcast_foundation::lock::WorkspaceLock;
use dubcast_foundation::state::{RunState, RunStateManager};

// ─── Error Type Tests ───────────────────────────────────────────────

#[test]
fn manifest_error_fingerprint_mismatch_message() {
    let err = ManifestError::FingerprintMismatch {
        key: "recognition_raw".into(),
        expected: "abc123".into(),
        found: "def456".into(),
    };
    let msg = format!("{}", err);
    assert!(msg.contains("recognition_raw"));
    assert!(msg.contains("abc123"));
}

#[test]
fn phase_error_missing_dependency_message() {
    let err = PhaseError::MissingDependency {
        phase: "align".into(),
        missing: "subtitle_model".into(),
    };
    let msg = format!("{}", err);
    assert!(msg.contains("align"));
    assert!(msg.contains("subtitle_model"));
}

#[test]
fn model_error_unresolved_voice_message() {
    let err = ModelError::UnresolvedVoice("speaker_02".into());
    let msg = format!("{}", err);
    assert!(msg.contains("speaker_02"));
}

#[test]
fn dub_error_from_config_error() {
    let cfg_err = ConfigError::MissingField("silence_gap_ms".into());
    let err: DubError = cfg_err.into();
    assert!(matches!(err, DubError::Config(_)));
}

#[test]
fn dub_error_from_manifest_error() {
    let manifest_err = ManifestError::MissingPhase("translate".into());
    let err: DubError = manifest_err.into();
    assert!(matches!(err, DubError::Manifest(_)));
}

#[test]
fn dub_error_shutdown_message() {
    let err = DubError::ShutdownRequested;
    let msg = format!("{}", err);
    assert!(msg.contains("shutdown"));
}

#[test]
fn transient_external_error_retries() {
    let err = DubError::External(ExternalError::Transient {
        service: "recognition".into(),
        reason: "connection reset".into(),
    });
    assert!(matches!(
        err.recovery_strategy(),
        RecoveryStrategy::Retry { .. }
    ));
}

#[test]
fn permanent_external_error_is_per_item() {
    let err = DubError::External(ExternalError::Permanent {
        service: "synthesis".into(),
        reason: "quota exhausted".into(),
    });
    assert!(matches!(
        err.recovery_strategy(),
        RecoveryStrategy::PerItemFailure
    ));
}

#[test]
fn config_error_is_fatal() {
    let err = DubError::Config(ConfigError::MissingField("api_key".into()));
    assert!(matches!(err.recovery_strategy(), RecoveryStrategy::Fatal));
}

// ─── Workspace lock tests ───────────────────────────────────────────

#[test]
fn workspace_lock_excludes_concurrent_acquire() {
    let dir = tempfile::tempdir().unwrap();
    let lock = WorkspaceLock::acquire(dir.path()).unwrap();
    assert!(WorkspaceLock::acquire(dir.path()).is_err());
    drop(lock);
    assert!(WorkspaceLock::acquire(dir.path()).is_ok());
}

// ─── Run state tests ────────────────────────────────────────────────

#[test]
fn run_state_rejects_invalid_transition() {
    let mgr = RunStateManager::new();
    let result = mgr.transition(RunState::Stopped);
    assert!(result.is_err());
}

#[test]
fn run_state_allows_initializing_to_running() {
    let mgr = RunStateManager::new();
    mgr.transition(RunState::Running {
        phase: "demux".into(),
    })
    .unwrap();
    assert_eq!(
        mgr.current(),
        RunState::Running {
            phase: "demux".into()
        }
    );
}

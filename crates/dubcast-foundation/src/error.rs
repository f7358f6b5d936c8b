use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error("workspace lock held by another run: {0}")]
    WorkspaceLocked(PathBuf),

    #[error("shutdown requested")]
    ShutdownRequested,

    #[error("fatal error, cannot recover: {0}")]
    Fatal(String),
}

impl From<std::io::Error> for DubError {
    fn from(err: std::io::Error) -> Self {
        DubError::Manifest(ManifestError::Io(err))
    }
}

impl From<tokio::task::JoinError> for DubError {
    fn from(err: tokio::task::JoinError) -> Self {
        DubError::Fatal(format!("task join failed: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration parsing error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("missing environment variable: {0}")]
    EnvVar(String),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest at {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no manifest entry for phase {0:?}")]
    MissingPhase(String),

    #[error("fingerprint mismatch for {key}: expected {expected}, found {found}")]
    FingerprintMismatch {
        key: String,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("phase {phase} requires output {missing} from an earlier phase that has not run")]
    MissingDependency { phase: String, missing: String },

    #[error("phase {phase} failed: {reason}")]
    Failed { phase: String, reason: String },

    #[error("phase {phase} was cancelled")]
    Cancelled { phase: String },

    #[error("unknown phase name: {0}")]
    UnknownPhase(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid utterance sequence: {0}")]
    InvalidSequence(String),

    #[error("cue {cue_index} of utterance {utterance_id} exceeds utterance bounds")]
    CueOutOfBounds { utterance_id: String, cue_index: usize },

    #[error("speaker {0:?} has no resolved voice and no neutral fallback is configured")]
    UnresolvedVoice(String),

    #[error("deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{service} request failed transiently: {reason}")]
    Transient { service: String, reason: String },

    #[error("{service} request failed permanently: {reason}")]
    Permanent { service: String, reason: String },

    #[error("{service} returned a malformed response: {reason}")]
    MalformedResponse { service: String, reason: String },

    #[error("{service} request timed out after {0:?}", .elapsed)]
    Timeout { service: String, elapsed: Duration },
}

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    Retry { max_attempts: u32, delay: Duration },
    PerItemFailure,
    Fatal,
}

impl DubError {
    /// Classifies an error per the five-way taxonomy: Config and Input errors
    /// are fatal pre-flight conditions, transient external errors are retried
    /// with bounded backoff, permanent external errors and per-item synthesis
    /// failures are recorded rather than retried.
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            DubError::External(ExternalError::Transient { .. })
            | DubError::External(ExternalError::Timeout { .. }) => RecoveryStrategy::Retry {
                max_attempts: 4,
                delay: Duration::from_millis(500),
            },
            DubError::External(ExternalError::Permanent { .. })
            | DubError::External(ExternalError::MalformedResponse { .. }) => {
                RecoveryStrategy::PerItemFailure
            }
            DubError::Config(_) | DubError::Fatal(_) | DubError::ShutdownRequested => {
                RecoveryStrategy::Fatal
            }
            DubError::WorkspaceLocked(_) => RecoveryStrategy::Fatal,
            DubError::Manifest(_) | DubError::Phase(_) | DubError::Model(_) => {
                RecoveryStrategy::Fatal
            }
        }
    }
}

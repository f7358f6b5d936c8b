//! Environment detection utilities for DubCast.
//!
//! Centralizes logic for detecting whether the pipeline is running in a CI
//! or development context, and for checking that provider credentials are
//! present before any phase runs.

use std::env;

/// Checks if the application is running in a CI (Continuous Integration) environment.
pub fn is_ci() -> bool {
    env::var("CI").is_ok()
        || env::var("CONTINUOUS_INTEGRATION").is_ok()
        || env::var("GITHUB_ACTIONS").is_ok()
        || env::var("GITLAB_CI").is_ok()
        || env::var("JENKINS_URL").is_ok()
        || env::var("BUILDKITE").is_ok()
}

/// Checks if the application is running in a development build.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Checks that a named environment variable is present and non-empty,
/// returning a `ConfigError::EnvVar` if not. Used during preflight to
/// validate provider credentials before any phase runs.
pub fn require_env(name: &str) -> Result<String, crate::error::ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(crate::error::ConfigError::EnvVar(name.to_string())),
    }
}

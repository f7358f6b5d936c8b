//! Provider credential environment variables — authentication only, never
//! endpoint configuration. Centralized here so `doctor`/`validate` and
//! the phase constructors read the same names.

pub struct ProviderCredentials {
    pub app_id: String,
    pub token: String,
}

pub const RECOGNITION_ENDPOINT_VAR: &str = "DUBCAST_RECOGNITION_ENDPOINT";
pub const RECOGNITION_APP_ID_VAR: &str = "DUBCAST_RECOGNITION_APP_ID";
pub const RECOGNITION_TOKEN_VAR: &str = "DUBCAST_RECOGNITION_TOKEN";

pub const TRANSLATION_ENDPOINT_VAR: &str = "DUBCAST_TRANSLATION_ENDPOINT";
pub const TRANSLATION_APP_ID_VAR: &str = "DUBCAST_TRANSLATION_APP_ID";
pub const TRANSLATION_TOKEN_VAR: &str = "DUBCAST_TRANSLATION_TOKEN";

pub const SYNTHESIS_ENDPOINT_VAR: &str = "DUBCAST_SYNTHESIS_ENDPOINT";
pub const SYNTHESIS_APP_ID_VAR: &str = "DUBCAST_SYNTHESIS_APP_ID";
pub const SYNTHESIS_TOKEN_VAR: &str = "DUBCAST_SYNTHESIS_TOKEN";

/// Reads `{prefix}_APP_ID`/`{prefix}_TOKEN` via `require_env`, surfacing a
/// `ConfigError::EnvVar` for whichever is missing — fatal before any
/// phase runs.
pub fn read_credentials(
    app_id_var: &str,
    token_var: &str,
) -> Result<ProviderCredentials, dubcast_foundation::error::ConfigError> {
    Ok(ProviderCredentials {
        app_id: dubcast_foundation::env::require_env(app_id_var)?,
        token: dubcast_foundation::env::require_env(token_var)?,
    })
}

pub fn endpoint(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

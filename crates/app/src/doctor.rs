//! Preflight `doctor`/`validate`: config validity, provider credentials,
//! and external binary availability. The dev-only test below uses
//! `dubcast_foundation::env::{is_ci, is_dev}` to skip the binary checks
//! where `ffmpeg`/`demucs` aren't expected to be installed.

use std::process::{Command, Stdio};

use dubcast_foundation::error::ConfigError;
use dubcast_foundation::health::{ComponentHealth, HealthCheck, HealthMonitor};
use dubcast_foundation::PipelineConfig;

use crate::credentials::{
    self, RECOGNITION_APP_ID_VAR, RECOGNITION_TOKEN_VAR, SYNTHESIS_APP_ID_VAR, SYNTHESIS_TOKEN_VAR,
    TRANSLATION_APP_ID_VAR, TRANSLATION_TOKEN_VAR,
};

struct ConfigCheck {
    config: Result<PipelineConfig, ConfigError>,
}

impl HealthCheck for ConfigCheck {
    fn name(&self) -> &str {
        "config"
    }

    fn check(&self) -> ComponentHealth {
        match &self.config {
            Ok(_) => ComponentHealth {
                healthy: true,
                detail: "configuration loaded and validated".to_string(),
            },
            Err(err) => ComponentHealth {
                healthy: false,
                detail: err.to_string(),
            },
        }
    }
}

struct CredentialCheck {
    service: &'static str,
    app_id_var: &'static str,
    token_var: &'static str,
}

impl HealthCheck for CredentialCheck {
    fn name(&self) -> &str {
        self.service
    }

    fn check(&self) -> ComponentHealth {
        match credentials::read_credentials(self.app_id_var, self.token_var) {
            Ok(_) => ComponentHealth {
                healthy: true,
                detail: format!("{} credentials present", self.service),
            },
            Err(err) => ComponentHealth {
                healthy: false,
                detail: err.to_string(),
            },
        }
    }
}

struct BinaryCheck {
    program: &'static str,
}

impl HealthCheck for BinaryCheck {
    fn name(&self) -> &str {
        self.program
    }

    fn check(&self) -> ComponentHealth {
        let found = Command::new(self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        ComponentHealth {
            healthy: found,
            detail: if found {
                format!("{} is on PATH", self.program)
            } else {
                format!("{} not found on PATH", self.program)
            },
        }
    }
}

/// Registers every preflight check `run` performs before acquiring the
/// workspace lock: config validity, all three provider credential pairs,
/// and the external binaries the thin demux/separate/burn wrappers shell
/// out to.
pub fn build_health_monitor(
    show_config: Option<&std::path::Path>,
    episode_config: Option<&std::path::Path>,
) -> HealthMonitor {
    let monitor = HealthMonitor::new();
    monitor.register(Box::new(ConfigCheck {
        config: PipelineConfig::load(show_config, episode_config),
    }));
    monitor.register(Box::new(CredentialCheck {
        service: "recognition",
        app_id_var: RECOGNITION_APP_ID_VAR,
        token_var: RECOGNITION_TOKEN_VAR,
    }));
    monitor.register(Box::new(CredentialCheck {
        service: "translation",
        app_id_var: TRANSLATION_APP_ID_VAR,
        token_var: TRANSLATION_TOKEN_VAR,
    }));
    monitor.register(Box::new(CredentialCheck {
        service: "synthesis",
        app_id_var: SYNTHESIS_APP_ID_VAR,
        token_var: SYNTHESIS_TOKEN_VAR,
    }));
    monitor.register(Box::new(BinaryCheck { program: "ffmpeg" }));
    monitor.register(Box::new(BinaryCheck {
        program: "demucs",
    }));
    monitor
}

/// Runs every registered check once and prints a human-readable report,
/// returning `true` iff every component is healthy.
pub fn run_and_report(monitor: &HealthMonitor) -> bool {
    monitor.run_once();
    let statuses = monitor.get_status();
    let mut names: Vec<&String> = statuses.keys().collect();
    names.sort();
    for name in names {
        let health = &statuses[name];
        let marker = if health.healthy { "ok" } else { "FAIL" };
        println!("[{marker}] {name}: {}", health.detail);
    }
    monitor.all_healthy()
}

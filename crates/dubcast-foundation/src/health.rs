//! Preflight health checks: config validity, provider credentials, and
//! external binary availability, run before `run` or exposed via `doctor`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub detail: String,
}

/// A single preflight check: "can this pipeline run here".
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self) -> ComponentHealth;
}

pub struct HealthMonitor {
    statuses: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    checks: Arc<RwLock<Vec<Box<dyn HealthCheck>>>>,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(RwLock::new(HashMap::new())),
            checks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn register(&self, check: Box<dyn HealthCheck>) {
        self.checks.write().push(check);
    }

    /// Run every registered check once and record the results. Used by
    /// `doctor`/`validate` before `run` starts any phase.
    pub fn run_once(&self) {
        let checks = self.checks.read();
        let mut statuses = self.statuses.write();
        for check in checks.iter() {
            let health = check.check();
            tracing::info!(
                target: "dubcast::health",
                component = check.name(),
                healthy = health.healthy,
                "preflight check"
            );
            statuses.insert(check.name().to_string(), health);
        }
    }

    /// Run checks periodically in the background, via a consuming-builder
    /// `start(self) -> Self` idiom.
    pub fn start(self: Arc<Self>, interval: Duration) -> Arc<Self> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                monitor.run_once();
            }
        });
        self
    }

    pub fn get_status(&self) -> HashMap<String, ComponentHealth> {
        self.statuses.read().clone()
    }

    pub fn all_healthy(&self) -> bool {
        self.statuses.read().values().all(|h| h.healthy)
    }
}

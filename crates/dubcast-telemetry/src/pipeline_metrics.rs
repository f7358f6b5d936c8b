use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared metrics for cross-phase pipeline monitoring. Cloning shares the
/// same underlying atomics, so a single instance can be handed to every
/// phase and read concurrently by a CLI progress reporter.
#[derive(Clone)]
pub struct PipelineMetrics {
    // Per-phase should-run outcomes, aggregated across the whole run.
    pub phases_run: Arc<AtomicU64>,
    pub phases_skipped: Arc<AtomicU64>,
    pub phases_failed: Arc<AtomicU64>,

    // Fingerprint invalidation reasons (should-run rules 3-6).
    pub invalidated_by_version: Arc<AtomicU64>,
    pub invalidated_by_input: Arc<AtomicU64>,
    pub invalidated_by_config: Arc<AtomicU64>,
    pub invalidated_by_human_edit: Arc<AtomicU64>,

    // Timing, in milliseconds, of the currently or most recently run phase.
    pub last_phase_duration_ms: Arc<AtomicU64>,
    pub total_duration_ms: Arc<AtomicU64>,

    // External service calls (recognition/translation/synthesis combined).
    pub external_requests: Arc<AtomicU64>,
    pub external_retries: Arc<AtomicU64>,
    pub external_transient_failures: Arc<AtomicU64>,
    pub external_permanent_failures: Arc<AtomicU64>,

    // Synthesis-specific counters.
    pub synthesis_cache_hits: Arc<AtomicU64>,
    pub synthesis_cache_misses: Arc<AtomicU64>,
    pub synthesis_item_failures: Arc<AtomicU64>,
    pub synthesis_active_jobs: Arc<AtomicUsize>,

    // Bless operations applied during the run.
    pub bless_count: Arc<AtomicU64>,

    pub shutdown_requested: Arc<AtomicBool>,
    pub run_started_at: Arc<RwLock<Option<Instant>>>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            phases_run: Arc::new(AtomicU64::new(0)),
            phases_skipped: Arc::new(AtomicU64::new(0)),
            phases_failed: Arc::new(AtomicU64::new(0)),

            invalidated_by_version: Arc::new(AtomicU64::new(0)),
            invalidated_by_input: Arc::new(AtomicU64::new(0)),
            invalidated_by_config: Arc::new(AtomicU64::new(0)),
            invalidated_by_human_edit: Arc::new(AtomicU64::new(0)),

            last_phase_duration_ms: Arc::new(AtomicU64::new(0)),
            total_duration_ms: Arc::new(AtomicU64::new(0)),

            external_requests: Arc::new(AtomicU64::new(0)),
            external_retries: Arc::new(AtomicU64::new(0)),
            external_transient_failures: Arc::new(AtomicU64::new(0)),
            external_permanent_failures: Arc::new(AtomicU64::new(0)),

            synthesis_cache_hits: Arc::new(AtomicU64::new(0)),
            synthesis_cache_misses: Arc::new(AtomicU64::new(0)),
            synthesis_item_failures: Arc::new(AtomicU64::new(0)),
            synthesis_active_jobs: Arc::new(AtomicUsize::new(0)),

            bless_count: Arc::new(AtomicU64::new(0)),

            shutdown_requested: Arc::new(AtomicBool::new(false)),
            run_started_at: Arc::new(RwLock::new(None)),
        }
    }
}

impl PipelineMetrics {
    pub fn mark_run_started(&self) {
        *self.run_started_at.write() = Some(Instant::now());
    }

    pub fn record_phase_outcome(&self, outcome: PhaseOutcome, duration: Duration) {
        match outcome {
            PhaseOutcome::Ran => self.phases_run.fetch_add(1, Ordering::Relaxed),
            PhaseOutcome::Skipped => self.phases_skipped.fetch_add(1, Ordering::Relaxed),
            PhaseOutcome::Failed => self.phases_failed.fetch_add(1, Ordering::Relaxed),
        };
        let ms = duration.as_millis() as u64;
        self.last_phase_duration_ms.store(ms, Ordering::Relaxed);
        self.total_duration_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self, reason: InvalidationReason) {
        let counter = match reason {
            InvalidationReason::VersionBump => &self.invalidated_by_version,
            InvalidationReason::InputMismatch => &self.invalidated_by_input,
            InvalidationReason::ConfigMismatch => &self.invalidated_by_config,
            InvalidationReason::HumanEdit => &self.invalidated_by_human_edit,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_external_call(&self, retries: u32, outcome: ExternalOutcome) {
        self.external_requests.fetch_add(1, Ordering::Relaxed);
        self.external_retries.fetch_add(retries as u64, Ordering::Relaxed);
        match outcome {
            ExternalOutcome::Success => {}
            ExternalOutcome::Transient => {
                self.external_transient_failures.fetch_add(1, Ordering::Relaxed);
            }
            ExternalOutcome::Permanent => {
                self.external_permanent_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_synthesis_cache(&self, hit: bool) {
        if hit {
            self.synthesis_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.synthesis_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_synthesis_item_failure(&self) {
        self.synthesis_item_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bless(&self) {
        self.bless_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Ran,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    VersionBump,
    InputMismatch,
    ConfigMismatch,
    HumanEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalOutcome {
    Success,
    Transient,
    Permanent,
}

//! `PipelineRunner`: executes phases in strict dependency order, deciding
//! run/skip per the eight ordered rules below, holding the workspace lock for the
//! whole run, and committing the manifest only on each phase's clean
//! success.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use dubcast_foundation::error::{DubError, ManifestError, PhaseError};
use dubcast_foundation::lock::WorkspaceLock;
use dubcast_foundation::shutdown::ShutdownGuard;
use dubcast_manifest::{
    bless as bless_phase, evaluate, fingerprint_config, fingerprint_dir, fingerprint_file,
    ManifestStore, OutputDeclaration, PhaseEvaluation, RunReason, ShouldRun,
};
use dubcast_model::{Manifest, PhaseRecord, PhaseStatus};
use dubcast_telemetry::pipeline_metrics::{InvalidationReason, PhaseOutcome, PipelineMetrics};

use crate::phase::{OutputSpec, Phase, PhaseContext};

/// One phase's should-run decision from [`PipelineRunner::dry_run`].
pub struct DryRunEntry {
    pub phase_name: String,
    pub decision: ShouldRun,
}

pub struct PipelineRunner {
    workspace: PathBuf,
    phases: Vec<Box<dyn Phase>>,
    manifest_store: ManifestStore,
    metrics: PipelineMetrics,
}

impl PipelineRunner {
    pub fn open(workspace: PathBuf, phases: Vec<Box<dyn Phase>>) -> Self {
        let manifest_store = ManifestStore::new(&workspace);
        Self {
            workspace,
            phases,
            manifest_store,
            metrics: PipelineMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Artifact key → declared output path, built by unioning every
    /// phase's `provides()`. A later phase's `requires()` looks up its
    /// inputs' current paths here.
    fn artifact_table(&self) -> HashMap<String, OutputSpec> {
        let mut table = HashMap::new();
        for phase in &self.phases {
            for output in phase.provides() {
                table.insert(output.key.clone(), output);
            }
        }
        table
    }

    fn fingerprint_artifact(&self, spec: &OutputSpec) -> Result<String, ManifestError> {
        let path = self.workspace.join(&spec.relative_path);
        if !path.exists() {
            return Ok(String::new());
        }
        if spec.is_dir {
            fingerprint_dir(&path)
        } else {
            fingerprint_file(&path)
        }
    }

    /// Runs phases from `from_phase` (inclusive, or the start if `None`)
    /// through `to_phase` (inclusive, or the end if `None`), honoring the
    /// should-run rules for each. `forced` names phases the caller wants
    /// to rerun unconditionally regardless of fingerprints.
    pub async fn run<C: Serialize>(
        &mut self,
        config: &C,
        from_phase: Option<&str>,
        to_phase: Option<&str>,
        forced: &[String],
        shutdown: ShutdownGuard,
    ) -> Result<(), DubError> {
        self.metrics.mark_run_started();
        let config_fingerprint = fingerprint_config(config)?;
        let artifact_table = self.artifact_table();

        let started_index = from_phase
            .and_then(|name| self.phases.iter().position(|p| p.name() == name))
            .unwrap_or(0);
        let ended_index = to_phase
            .and_then(|name| self.phases.iter().position(|p| p.name() == name))
            .unwrap_or(self.phases.len().saturating_sub(1));

        for index in started_index..=ended_index {
            if shutdown.is_shutdown_requested() {
                return Err(DubError::ShutdownRequested);
            }

            let phase_name = self.phases[index].name().to_string();
            self.run_one_phase(
                index,
                &phase_name,
                &config_fingerprint,
                &artifact_table,
                forced.iter().any(|f| f == &phase_name),
                &shutdown,
            )
            .await?;
        }

        Ok(())
    }

    async fn run_one_phase(
        &mut self,
        index: usize,
        phase_name: &str,
        config_fingerprint: &str,
        artifact_table: &HashMap<String, OutputSpec>,
        forced: bool,
        shutdown: &ShutdownGuard,
    ) -> Result<(), DubError> {
        let mut manifest = self.manifest_store.load()?;

        let requires = self.phases[index].requires();
        let mut input_fingerprints = BTreeMap::new();
        for key in &requires {
            let spec = artifact_table.get(key).ok_or_else(|| {
                PhaseError::MissingDependency {
                    phase: phase_name.to_string(),
                    missing: key.clone(),
                }
            })?;
            input_fingerprints.insert(key.clone(), self.fingerprint_artifact(spec)?);
        }

        let provides = self.phases[index].provides();
        let mut output_fingerprints = BTreeMap::new();
        for spec in &provides {
            output_fingerprints.insert(spec.key.clone(), self.fingerprint_artifact(spec)?);
        }

        let eval = PhaseEvaluation {
            phase_name,
            forced,
            current_version: self.phases[index].version(),
            current_config_fingerprint: config_fingerprint,
            current_input_fingerprints: &input_fingerprints,
            current_output_fingerprints: &output_fingerprints,
        };

        let decision = evaluate(&manifest, &eval);
        let reason = match decision {
            ShouldRun::Skip => {
                tracing::info!(target: "dubcast::pipeline", phase = phase_name, "skipping phase, up to date");
                self.metrics.record_phase_outcome(PhaseOutcome::Skipped, Duration::ZERO);
                return Ok(());
            }
            ShouldRun::Run(reason) => reason,
        };

        if let Some(invalidation) = invalidation_reason(reason) {
            self.metrics.record_invalidation(invalidation);
        }

        tracing::info!(
            target: "dubcast::pipeline",
            phase = phase_name,
            reason = ?reason,
            "running phase {}/{}",
            index + 1,
            self.phases.len()
        );

        let ctx = PhaseContext {
            workspace: self.workspace.clone(),
            shutdown: shutdown.clone(),
        };

        let started_at = Utc::now();
        let timer = Instant::now();
        let run_result = self.phases[index].run(&ctx).await;
        let duration = timer.elapsed();
        let finished_at = Utc::now();

        if shutdown.is_shutdown_requested() {
            tracing::warn!(target: "dubcast::pipeline", phase = phase_name, "phase cancelled, manifest left unmodified");
            return Err(DubError::ShutdownRequested);
        }

        match run_result {
            Ok(()) => {
                let mut refreshed_outputs = BTreeMap::new();
                for spec in &provides {
                    refreshed_outputs.insert(spec.key.clone(), self.fingerprint_artifact(spec)?);
                }
                manifest.set_record(
                    phase_name,
                    PhaseRecord {
                        status: PhaseStatus::Succeeded,
                        version: self.phases[index].version(),
                        config_fingerprint: config_fingerprint.to_string(),
                        input_fingerprints,
                        output_fingerprints: refreshed_outputs,
                        started_at,
                        finished_at,
                        error: None,
                    },
                );
                self.manifest_store.save(&manifest)?;
                self.metrics.record_phase_outcome(PhaseOutcome::Ran, duration);
                Ok(())
            }
            Err(err) => {
                manifest.set_record(
                    phase_name,
                    PhaseRecord {
                        status: PhaseStatus::Failed,
                        version: self.phases[index].version(),
                        config_fingerprint: config_fingerprint.to_string(),
                        input_fingerprints,
                        output_fingerprints,
                        started_at,
                        finished_at,
                        error: Some(err.to_string()),
                    },
                );
                self.manifest_store.save(&manifest)?;
                self.metrics.record_phase_outcome(PhaseOutcome::Failed, duration);
                Err(err)
            }
        }
    }

    /// Evaluates the should-run decision for every phase in `from_phase`..
    /// `to_phase` against the current manifest and on-disk fingerprints,
    /// without running or recording anything. Useful for auditing why a
    /// phase would or wouldn't rerun before committing to a full pass.
    pub fn dry_run<C: Serialize>(
        &self,
        config: &C,
        from_phase: Option<&str>,
        to_phase: Option<&str>,
        forced: &[String],
    ) -> Result<Vec<DryRunEntry>, DubError> {
        let config_fingerprint = fingerprint_config(config)?;
        let artifact_table = self.artifact_table();
        let manifest = self.manifest_store.load()?;

        let started_index = from_phase
            .and_then(|name| self.phases.iter().position(|p| p.name() == name))
            .unwrap_or(0);
        let ended_index = to_phase
            .and_then(|name| self.phases.iter().position(|p| p.name() == name))
            .unwrap_or(self.phases.len().saturating_sub(1));

        let mut entries = Vec::new();
        for index in started_index..=ended_index {
            let phase_name = self.phases[index].name().to_string();

            let requires = self.phases[index].requires();
            let mut input_fingerprints = BTreeMap::new();
            for key in &requires {
                let spec = artifact_table.get(key).ok_or_else(|| {
                    PhaseError::MissingDependency {
                        phase: phase_name.clone(),
                        missing: key.clone(),
                    }
                })?;
                input_fingerprints.insert(key.clone(), self.fingerprint_artifact(spec)?);
            }

            let provides = self.phases[index].provides();
            let mut output_fingerprints = BTreeMap::new();
            for spec in &provides {
                output_fingerprints.insert(spec.key.clone(), self.fingerprint_artifact(spec)?);
            }

            let eval = PhaseEvaluation {
                phase_name: &phase_name,
                forced: forced.iter().any(|f| f == &phase_name),
                current_version: self.phases[index].version(),
                current_config_fingerprint: &config_fingerprint,
                current_input_fingerprints: &input_fingerprints,
                current_output_fingerprints: &output_fingerprints,
            };

            entries.push(DryRunEntry {
                phase_name,
                decision: evaluate(&manifest, &eval),
            });
        }

        Ok(entries)
    }

    /// Re-baselines a phase's output fingerprints against its current
    /// on-disk state, so a hand-edited authoritative document stops
    /// looking out-of-date on the next run.
    pub fn bless(&mut self, phase_name: &str) -> Result<(), DubError> {
        let phase = self
            .phases
            .iter()
            .find(|p| p.name() == phase_name)
            .ok_or_else(|| PhaseError::UnknownPhase(phase_name.to_string()))?;

        let provides = phase.provides();
        // Resolve every declared output to its absolute on-disk path
        // before building borrowed declarations, so bless hashes the
        // actual workspace file rather than the bare relative path.
        let absolute_paths: Vec<(String, PathBuf, bool)> = provides
            .iter()
            .map(|spec| {
                (
                    spec.key.clone(),
                    self.workspace.join(&spec.relative_path),
                    spec.is_dir,
                )
            })
            .collect();
        let declarations: Vec<OutputDeclaration> = absolute_paths
            .iter()
            .map(|(key, path, is_dir)| OutputDeclaration {
                key,
                path,
                is_dir: *is_dir,
            })
            .collect();

        let mut manifest = self.manifest_store.load()?;
        bless_phase(&mut manifest, phase_name, &declarations)?;
        self.manifest_store.save(&manifest)?;
        self.metrics.record_bless();
        Ok(())
    }

    pub fn acquire_lock(&self) -> Result<WorkspaceLock, DubError> {
        WorkspaceLock::acquire(&self.workspace)
    }
}

fn invalidation_reason(reason: RunReason) -> Option<InvalidationReason> {
    match reason {
        RunReason::VersionBump => Some(InvalidationReason::VersionBump),
        RunReason::InputFingerprintMismatch => Some(InvalidationReason::InputMismatch),
        RunReason::ConfigFingerprintMismatch => Some(InvalidationReason::ConfigMismatch),
        RunReason::OutputFingerprintMismatch => Some(InvalidationReason::HumanEdit),
        RunReason::Forced | RunReason::NoManifestRecord | RunReason::PreviousFailure => None,
    }
}

//! Integration tests against the testable properties in the "runner
//! determinism", "fingerprint-driven invalidation", and "bless semantics"
//! scenarios: a fake two-phase pipeline writing plain text artifacts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_foundation::shutdown::ShutdownHandler;
use dubcast_manifest::{RunReason, ShouldRun};
use dubcast_pipeline::{OutputSpec, Phase, PhaseContext, PipelineRunner};
use serde::Serialize;

#[derive(Serialize)]
struct EmptyConfig {}

struct WriteFilePhase {
    name: &'static str,
    version: u32,
    requires: Vec<String>,
    output_key: &'static str,
    output_path: &'static str,
    content: &'static str,
    run_count: Arc<AtomicUsize>,
}

#[async_trait]
impl Phase for WriteFilePhase {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn requires(&self) -> Vec<String> {
        self.requires.clone()
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::file(self.output_key, self.output_path)]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        self.run_count.fetch_add(1, Ordering::SeqCst);
        let path = ctx.resolve(std::path::Path::new(self.output_path));
        tokio::fs::write(&path, self.content).await?;
        Ok(())
    }
}

fn build_phases(
    demux_runs: Arc<AtomicUsize>,
    subtitle_runs: Arc<AtomicUsize>,
) -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(WriteFilePhase {
            name: "demux",
            version: 1,
            requires: vec![],
            output_key: "source_audio",
            output_path: "audio/source.wav",
            content: "fake-audio-bytes",
            run_count: demux_runs,
        }),
        Box::new(WriteFilePhase {
            name: "subtitle",
            version: 1,
            requires: vec!["source_audio".to_string()],
            output_key: "subtitle_model",
            output_path: "source/subtitle_model.json",
            content: "{\"utterances\":[]}",
            run_count: subtitle_runs,
        }),
    ]
}

async fn shutdown_guard() -> dubcast_foundation::shutdown::ShutdownGuard {
    ShutdownHandler::new().install().await
}

#[tokio::test]
async fn rerunning_unchanged_workspace_skips_every_phase() {
    let dir = tempfile::tempdir().unwrap();
    let demux_runs = Arc::new(AtomicUsize::new(0));
    let subtitle_runs = Arc::new(AtomicUsize::new(0));

    let mut runner = PipelineRunner::open(
        dir.path().to_path_buf(),
        build_phases(demux_runs.clone(), subtitle_runs.clone()),
    );
    let guard = shutdown_guard().await;
    runner
        .run(&EmptyConfig {}, None, None, &[], guard.clone())
        .await
        .unwrap();
    assert_eq!(demux_runs.load(Ordering::SeqCst), 1);
    assert_eq!(subtitle_runs.load(Ordering::SeqCst), 1);

    runner
        .run(&EmptyConfig {}, None, None, &[], guard)
        .await
        .unwrap();
    assert_eq!(demux_runs.load(Ordering::SeqCst), 1, "demux must not rerun");
    assert_eq!(subtitle_runs.load(Ordering::SeqCst), 1, "subtitle must not rerun");
}

#[tokio::test]
async fn editing_authoritative_output_reruns_only_that_phase_and_successors() {
    let dir = tempfile::tempdir().unwrap();
    let demux_runs = Arc::new(AtomicUsize::new(0));
    let subtitle_runs = Arc::new(AtomicUsize::new(0));

    let mut runner = PipelineRunner::open(
        dir.path().to_path_buf(),
        build_phases(demux_runs.clone(), subtitle_runs.clone()),
    );
    let guard = shutdown_guard().await;
    runner
        .run(&EmptyConfig {}, None, None, &[], guard.clone())
        .await
        .unwrap();

    let subtitle_path: PathBuf = dir.path().join("source/subtitle_model.json");
    tokio::fs::write(&subtitle_path, "{\"utterances\":[{\"utt_id\":\"utt_0001\"}]}")
        .await
        .unwrap();

    runner
        .run(&EmptyConfig {}, None, None, &[], guard)
        .await
        .unwrap();

    assert_eq!(demux_runs.load(Ordering::SeqCst), 1, "demux is unaffected by the edit");
    assert_eq!(
        subtitle_runs.load(Ordering::SeqCst),
        2,
        "subtitle reruns because its output fingerprint no longer matches"
    );
}

#[tokio::test]
async fn dry_run_reports_decisions_without_running_or_recording_anything() {
    let dir = tempfile::tempdir().unwrap();
    let demux_runs = Arc::new(AtomicUsize::new(0));
    let subtitle_runs = Arc::new(AtomicUsize::new(0));

    let runner = PipelineRunner::open(
        dir.path().to_path_buf(),
        build_phases(demux_runs.clone(), subtitle_runs.clone()),
    );
    let decisions = runner.dry_run(&EmptyConfig {}, None, None, &[]).unwrap();

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].phase_name, "demux");
    assert_eq!(decisions[0].decision, ShouldRun::Run(RunReason::NoManifestRecord));
    assert_eq!(demux_runs.load(Ordering::SeqCst), 0, "dry run must not execute any phase");
    assert_eq!(subtitle_runs.load(Ordering::SeqCst), 0, "dry run must not execute any phase");

    let mut runner = runner;
    let guard = shutdown_guard().await;
    runner
        .run(&EmptyConfig {}, None, None, &[], guard)
        .await
        .unwrap();

    let decisions = runner.dry_run(&EmptyConfig {}, None, None, &[]).unwrap();
    assert!(decisions.iter().all(|d| d.decision == ShouldRun::Skip), "a real run just completed, so everything should now report up to date");
}

#[tokio::test]
async fn bless_then_run_skips_the_blessed_phase() {
    let dir = tempfile::tempdir().unwrap();
    let demux_runs = Arc::new(AtomicUsize::new(0));
    let subtitle_runs = Arc::new(AtomicUsize::new(0));

    let mut runner = PipelineRunner::open(
        dir.path().to_path_buf(),
        build_phases(demux_runs.clone(), subtitle_runs.clone()),
    );
    let guard = shutdown_guard().await;
    runner
        .run(&EmptyConfig {}, None, None, &[], guard.clone())
        .await
        .unwrap();

    let subtitle_path: PathBuf = dir.path().join("source/subtitle_model.json");
    tokio::fs::write(&subtitle_path, "{\"utterances\":[{\"utt_id\":\"utt_0001\"}]}")
        .await
        .unwrap();

    runner.bless("subtitle").unwrap();

    runner
        .run(&EmptyConfig {}, None, None, &[], guard)
        .await
        .unwrap();

    assert_eq!(
        subtitle_runs.load(Ordering::SeqCst),
        1,
        "bless re-baselines the fingerprint so the edit is not seen as a mismatch"
    );
}

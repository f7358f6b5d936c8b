// CLI entrypoint for the nine-phase dubbing pipeline (demux -> separate ->
// recognize -> subtitle -> translate -> align -> synthesize -> mix -> burn).
//
// Logging behavior:
// - Writes logs to both stderr and a daily-rotated file at logs/dubcast.log.
// - Default log level is INFO. Control via RUST_LOG:
//   * RUST_LOG=info                        # standard logging (default)
//   * RUST_LOG=debug                       # verbose, includes per-phase detail
//   * RUST_LOG=dubcast=info,dubcast_mix=trace  # fine-grained per-module control
// - DUBCAST_LOG_RETENTION_DAYS prunes rotated files older than N days (0 disables).

mod credentials;
mod doctor;
mod logging;
mod phases;
mod process;
mod registries;
mod run_report;
mod workspace;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use dubcast_align::AlignerConfig;
use dubcast_foundation::error::DubError;
use dubcast_foundation::{PipelineConfig, RunState, RunStateManager, ShutdownHandler};
use dubcast_mix::MixerConfig;
use dubcast_model::SegmentIndex;
use dubcast_normalize::NormalizerConfig;
use dubcast_pipeline::{Phase, PipelineRunner};
use dubcast_synth::{HttpSynthesisClient, SynthesizerConfig};
use dubcast_translate::{HttpTranslationClient, RetryConfig};

use credentials::ProviderCredentials;
use workspace::EpisodePaths;

#[derive(Parser, Debug)]
#[command(name = "dubcast", author, version, about = "Incremental Chinese-to-English dubbing pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the nine-phase pipeline over a video, incrementally by default.
    Run {
        video: PathBuf,
        /// Rerun starting from this phase (inclusive), ignoring earlier phases.
        #[arg(long = "from")]
        from: Option<String>,
        /// Stop after this phase (inclusive).
        #[arg(long = "to")]
        to: Option<String>,
        /// Phase names to force-rerun regardless of fingerprint state.
        #[arg(long = "force", value_delimiter = ',')]
        force: Vec<String>,
        #[arg(long = "source-lang", default_value = "zh")]
        source_lang: String,
        #[arg(long = "target-lang", default_value = "en")]
        target_lang: String,
        /// Prints each phase's should-run decision and exits without running or
        /// touching the manifest. Useful for auditing why a phase would rerun.
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Re-baselines a phase's output fingerprints after a manual edit.
    Bless { video: PathBuf, phase: String },
    /// Runs preflight checks (config, credentials, external binaries) and exits.
    Doctor { video: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = logging::init_logging()?;
    let retention_days = std::env::var("DUBCAST_LOG_RETENTION_DAYS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());
    logging::prune_old_logs(retention_days);
    tracing::info!(target: "dubcast::cli", "starting dubcast");

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            video,
            from,
            to,
            force,
            source_lang,
            target_lang,
            dry_run,
        } => run_pipeline(video, from, to, force, source_lang, target_lang, dry_run).await,
        Command::Bless { video, phase } => bless_phase(video, phase).await,
        Command::Doctor { video } => {
            if run_doctor(video) {
                Ok(())
            } else {
                std::process::exit(1);
            }
        }
    }
}

fn run_doctor(video: Option<PathBuf>) -> bool {
    let (show_config, episode_config) = match &video {
        Some(v) => {
            let paths = EpisodePaths::for_video(v);
            (Some(paths.show_config_path()), Some(paths.episode_config_path()))
        }
        None => (None, None),
    };
    let monitor = doctor::build_health_monitor(show_config.as_deref(), episode_config.as_deref());
    doctor::run_and_report(&monitor)
}

async fn run_pipeline(
    video: PathBuf,
    from: Option<String>,
    to: Option<String>,
    force: Vec<String>,
    source_lang: String,
    target_lang: String,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = EpisodePaths::for_video(&video);
    tokio::fs::create_dir_all(&paths.workspace).await?;
    tokio::fs::create_dir_all(paths.show_dir.join("voices")).await?;
    tokio::fs::create_dir_all(paths.show_dir.join("dict")).await?;

    if !dry_run {
        let monitor = doctor::build_health_monitor(
            Some(&paths.show_config_path()),
            Some(&paths.episode_config_path()),
        );
        if !doctor::run_and_report(&monitor) {
            return Err(Box::new(DubError::Fatal(
                "preflight checks failed, see above".to_string(),
            )));
        }
    }

    let config = PipelineConfig::load(
        Some(&paths.show_config_path()),
        Some(&paths.episode_config_path()),
    )?;

    // A dry run only inspects fingerprints and the manifest, never calls a
    // provider, so missing credentials shouldn't block it.
    let phase_list = build_phases(&video, &paths, &config, &source_lang, &target_lang, !dry_run)?;

    if dry_run {
        let runner = PipelineRunner::open(paths.workspace.clone(), phase_list);
        let decisions = runner.dry_run(&config, from.as_deref(), to.as_deref(), &force)?;
        for entry in &decisions {
            match entry.decision {
                dubcast_manifest::ShouldRun::Skip => {
                    println!("[skip] {}: up to date", entry.phase_name);
                }
                dubcast_manifest::ShouldRun::Run(reason) => {
                    println!("[run ] {}: {:?}", entry.phase_name, reason);
                }
            }
        }
        return Ok(());
    }

    let state_manager = RunStateManager::new();
    let shutdown = ShutdownHandler::new().install().await;

    let mut runner = PipelineRunner::open(paths.workspace.clone(), phase_list);
    let _lock = runner.acquire_lock()?;

    state_manager.transition(RunState::Running {
        phase: "pipeline".to_string(),
    })?;

    let run_started_at = chrono::Utc::now();
    let run_result = runner
        .run(&config, from.as_deref(), to.as_deref(), &force, shutdown)
        .await;
    let run_finished_at = chrono::Utc::now();

    if let Err(err) = &run_result {
        tracing::error!(target: "dubcast::cli", error = %err, "pipeline run failed");
    }

    let manifest_store = dubcast_manifest::ManifestStore::new(&paths.workspace);
    let manifest = manifest_store.load()?;

    let segments_path = paths.workspace.join(workspace::TTS_SEGMENTS_INDEX);
    let segments = if segments_path.exists() {
        let bytes = tokio::fs::read(&segments_path).await?;
        Some(serde_json::from_slice::<SegmentIndex>(&bytes)?)
    } else {
        None
    };

    let summary = run_report::build_run_summary(
        &manifest,
        &phases::PHASE_NAMES,
        run_started_at,
        run_finished_at,
        segments.as_ref(),
    );
    let report_path = paths.workspace.join(workspace::RENDER_REPORT);
    dubcast_render::write_run_summary(&report_path, &summary)?;

    state_manager.transition(RunState::Stopping)?;
    state_manager.transition(RunState::Stopped)?;

    if !summary.failed_synthesis_items.is_empty() {
        tracing::warn!(
            target: "dubcast::cli",
            count = summary.failed_synthesis_items.len(),
            "synthesis failures present, mix substitutes silence for those utterances"
        );
    }

    run_result.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}

async fn bless_phase(video: PathBuf, phase_name: String) -> Result<(), Box<dyn std::error::Error>> {
    let paths = EpisodePaths::for_video(&video);
    let config = PipelineConfig::load(
        Some(&paths.show_config_path()),
        Some(&paths.episode_config_path()),
    )?;

    // Credentials aren't needed to bless — no phase actually runs — so
    // missing provider env vars don't block re-baselining an edited
    // authoritative document.
    let phase_list = build_phases(&video, &paths, &config, "zh", "en", false)?;
    let mut runner = PipelineRunner::open(paths.workspace.clone(), phase_list);
    let _lock = runner.acquire_lock()?;
    runner.bless(&phase_name)?;

    tracing::info!(target: "dubcast::cli", phase = %phase_name, episode = %paths.episode_key, "blessed phase output fingerprints");
    println!("blessed {phase_name} for {}", paths.episode_key);
    Ok(())
}

fn load_credentials(
    app_id_var: &str,
    token_var: &str,
    strict: bool,
) -> Result<ProviderCredentials, DubError> {
    match credentials::read_credentials(app_id_var, token_var) {
        Ok(creds) => Ok(creds),
        Err(err) if strict => Err(DubError::Config(err)),
        Err(_) => Ok(ProviderCredentials {
            app_id: String::new(),
            token: String::new(),
        }),
    }
}

/// Wires the layered config, show-level registries, and provider HTTP
/// clients into the nine phases of the DAG, in execution order.
fn build_phases(
    video: &Path,
    paths: &EpisodePaths,
    config: &PipelineConfig,
    source_lang: &str,
    target_lang: &str,
    strict_credentials: bool,
) -> Result<Vec<Box<dyn Phase>>, DubError> {
    let recognition_creds = load_credentials(
        credentials::RECOGNITION_APP_ID_VAR,
        credentials::RECOGNITION_TOKEN_VAR,
        strict_credentials,
    )?;
    let translation_creds = load_credentials(
        credentials::TRANSLATION_APP_ID_VAR,
        credentials::TRANSLATION_TOKEN_VAR,
        strict_credentials,
    )?;
    let synthesis_creds = load_credentials(
        credentials::SYNTHESIS_APP_ID_VAR,
        credentials::SYNTHESIS_TOKEN_VAR,
        strict_credentials,
    )?;

    let recognition_endpoint = credentials::endpoint(
        credentials::RECOGNITION_ENDPOINT_VAR,
        "https://api.dubcast.example/v1/recognize",
    );
    let translation_endpoint = credentials::endpoint(
        credentials::TRANSLATION_ENDPOINT_VAR,
        "https://api.dubcast.example/v1/translate",
    );
    let synthesis_endpoint = credentials::endpoint(
        credentials::SYNTHESIS_ENDPOINT_VAR,
        "https://api.dubcast.example/v1/synthesize",
    );

    let glossary = registries::load_glossary(&paths.glossary_path())?;
    let domain_hints = registries::load_domain_hints(&paths.domain_hints_path())?;

    let demux = phases::demux::DemuxPhase {
        video_path: video.to_path_buf(),
        sample_rate: 16_000,
    };

    let separate = phases::separate::SeparatePhase {
        separator_binary: std::env::var("DUBCAST_SEPARATOR_BIN").unwrap_or_else(|_| "demucs".to_string()),
    };

    let recognize = phases::recognize::RecognizePhase {
        client: Arc::new(phases::recognize::HttpRecognitionClient::new(
            recognition_endpoint,
            recognition_creds.app_id,
            recognition_creds.token,
        )),
        retry_max_attempts: config.retry_max_attempts,
        retry_base_delay_ms: config.retry_base_delay_ms,
        poll_interval_ms: config.recognition_poll_interval_ms,
        poll_deadline_secs: config.recognition_poll_deadline_secs,
    };

    let subtitle = phases::subtitle::SubtitlePhase {
        episode_key: paths.episode_key.clone(),
        source_lang: source_lang.to_string(),
        speaker_to_role_path: paths.speaker_to_role_path(),
        normalizer_config: NormalizerConfig {
            silence_gap_ms: config.silence_gap_ms,
            max_utterance_ms: config.max_utterance_ms,
        },
    };

    let translate = phases::translate::TranslatePhase {
        client: Box::new(HttpTranslationClient::new(
            translation_endpoint,
            translation_creds.app_id,
            translation_creds.token,
        )),
        glossary,
        domain_hints,
        include_episode_context: true,
        retry: RetryConfig {
            max_attempts: config.retry_max_attempts,
            base_delay_ms: config.retry_base_delay_ms,
        },
    };

    let align = phases::align::AlignPhase {
        episode_key: paths.episode_key.clone(),
        target_lang: target_lang.to_string(),
        speaker_to_role_path: paths.speaker_to_role_path(),
        role_cast_path: paths.role_cast_path(),
        aligner_config: AlignerConfig {
            default_max_rate: config.max_rate,
            cue_chars: config.cue_chars,
            end_extension_ms: config.end_extension_ms,
        },
        // No per-episode override input exists yet; left empty unless a
        // future config layer surfaces one.
        rate_overrides: BTreeMap::new(),
    };

    let synthesize = phases::synthesize::SynthesizePhase {
        client: Arc::new(HttpSynthesisClient::new(
            synthesis_endpoint,
            synthesis_creds.app_id,
            synthesis_creds.token,
        )),
        config: SynthesizerConfig {
            concurrency: config.synthesis_concurrency,
            retry_max_attempts: config.retry_max_attempts,
            retry_base_delay_ms: config.retry_base_delay_ms,
            ..SynthesizerConfig::default()
        },
    };

    let mix = phases::mix::MixPhase {
        config: MixerConfig {
            target_lufs: config.target_lufs,
            target_true_peak_dbtp: config.target_true_peak_dbtp,
            ..MixerConfig::default()
        },
    };

    let burn = phases::burn::BurnPhase {
        video_path: video.to_path_buf(),
    };

    Ok(vec![
        Box::new(demux),
        Box::new(separate),
        Box::new(recognize),
        Box::new(subtitle),
        Box::new(translate),
        Box::new(align),
        Box::new(synthesize),
        Box::new(mix),
        Box::new(burn),
    ])
}

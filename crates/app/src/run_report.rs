//! Reconstructs the machine-readable `RunSummary` from the manifest after a
//! run completes. `PipelineRunner` doesn't hand back a phase-by-phase trace
//! directly, but a phase's manifest record tells us whether it ran this
//! invocation (its `started_at` falls within the run's own window) or was
//! left untouched (skipped).

use chrono::{DateTime, Utc};
use dubcast_model::manifest::{Manifest, PhaseStatus};
use dubcast_model::report::{PhaseRunOutcome, PhaseSummary, RunSummary};
use dubcast_model::segment::SegmentIndex;

pub fn build_run_summary(
    manifest: &Manifest,
    phase_names: &[&str],
    run_started_at: DateTime<Utc>,
    run_finished_at: DateTime<Utc>,
    segments: Option<&SegmentIndex>,
) -> RunSummary {
    let mut phases = Vec::with_capacity(phase_names.len());
    for name in phase_names {
        let Some(record) = manifest.record_for(name) else {
            continue;
        };
        let ran_this_invocation = record.started_at >= run_started_at;
        let outcome = if !ran_this_invocation {
            PhaseRunOutcome::Skipped
        } else if record.status == PhaseStatus::Succeeded {
            PhaseRunOutcome::Ran
        } else {
            PhaseRunOutcome::Failed
        };
        let duration_ms = if ran_this_invocation {
            (record.finished_at - record.started_at).num_milliseconds().max(0) as u64
        } else {
            0
        };
        phases.push(PhaseSummary {
            phase: name.to_string(),
            outcome,
            duration_ms,
            error: record.error.clone(),
        });
    }

    let failed_synthesis_items = segments
        .map(|index| index.failed_utterances().into_iter().map(str::to_string).collect())
        .unwrap_or_default();

    RunSummary {
        started_at: run_started_at,
        finished_at: run_finished_at,
        phases,
        failed_synthesis_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubcast_model::manifest::PhaseRecord;
    use std::collections::BTreeMap;

    fn record(status: PhaseStatus, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> PhaseRecord {
        PhaseRecord {
            status,
            version: 1,
            config_fingerprint: "cfg".into(),
            input_fingerprints: BTreeMap::new(),
            output_fingerprints: BTreeMap::new(),
            started_at,
            finished_at,
            error: None,
        }
    }

    #[test]
    fn phases_started_before_the_run_are_reported_as_skipped() {
        let run_start = Utc::now();
        let run_end = run_start + chrono::Duration::seconds(5);
        let mut manifest = Manifest::new();
        manifest.set_record("demux", record(PhaseStatus::Succeeded, run_start - chrono::Duration::hours(1), run_start - chrono::Duration::hours(1)));
        manifest.set_record("separate", record(PhaseStatus::Succeeded, run_start, run_end));

        let summary = build_run_summary(&manifest, &["demux", "separate"], run_start, run_end, None);
        assert_eq!(summary.phases[0].outcome, PhaseRunOutcome::Skipped);
        assert_eq!(summary.phases[1].outcome, PhaseRunOutcome::Ran);
    }
}

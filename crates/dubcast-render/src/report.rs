//! Writes the run summary and per-phase machine-readable reports named in
//! the filesystem layout (`render/report.json`, `tts/report.json`).

use std::path::Path;

use dubcast_foundation::error::ManifestError;
use dubcast_model::report::RunSummary;
use dubcast_model::segment::SegmentIndex;

pub fn write_run_summary(path: &Path, summary: &RunSummary) -> Result<(), ManifestError> {
    write_json(path, summary)
}

pub fn write_segment_report(path: &Path, segments: &SegmentIndex) -> Result<(), ManifestError> {
    write_json(path, segments)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dubcast_model::report::{PhaseRunOutcome, PhaseSummary};

    #[test]
    fn writes_and_the_file_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render").join("report.json");
        let summary = RunSummary {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            phases: vec![PhaseSummary {
                phase: "mix".into(),
                outcome: PhaseRunOutcome::Ran,
                duration_ms: 42,
                error: None,
            }],
            failed_synthesis_items: vec![],
        };

        write_run_summary(&path, &summary).unwrap();
        let loaded: RunSummary = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.phases.len(), 1);
        assert!(loaded.succeeded());
    }
}

//! The `bless` operation: re-read a named phase's on-disk outputs,
//! recompute their fingerprints, and write them into the manifest's
//! output record, so a hand-edited authoritative file stops looking
//! out-of-date to rule 6.

use std::collections::BTreeMap;
use std::path::Path;

use dubcast_foundation::error::ManifestError;
use dubcast_model::Manifest;

use crate::fingerprint::{fingerprint_dir, fingerprint_file};

/// One declared output of a phase: a key and the workspace-relative path
/// it resolves to, plus whether that path is a directory (fingerprinted
/// as a canonical listing) or a single file.
pub struct OutputDeclaration<'a> {
    pub key: &'a str,
    pub path: &'a Path,
    pub is_dir: bool,
}

/// Re-fingerprints `outputs` and writes them into `phase_name`'s manifest
/// record. Fails if the phase has no existing manifest record — bless
/// re-baselines an existing run, it does not fabricate one.
pub fn bless(
    manifest: &mut Manifest,
    phase_name: &str,
    outputs: &[OutputDeclaration],
) -> Result<(), ManifestError> {
    let mut record = manifest
        .record_for(phase_name)
        .cloned()
        .ok_or_else(|| ManifestError::MissingPhase(phase_name.to_string()))?;

    let mut refreshed: BTreeMap<String, String> = BTreeMap::new();
    for output in outputs {
        let fingerprint = if output.is_dir {
            fingerprint_dir(output.path)?
        } else {
            fingerprint_file(output.path)?
        };
        refreshed.insert(output.key.to_string(), fingerprint);
    }

    record.output_fingerprints = refreshed;
    manifest.set_record(phase_name, record);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubcast_model::{PhaseRecord, PhaseStatus};

    fn record_with_outputs(outputs: BTreeMap<String, String>) -> PhaseRecord {
        PhaseRecord {
            status: PhaseStatus::Succeeded,
            version: 1,
            config_fingerprint: "cfg".into(),
            input_fingerprints: BTreeMap::new(),
            output_fingerprints: outputs,
            started_at: chrono::Utc::now(),
            finished_at: chrono::Utc::now(),
            error: None,
        }
    }

    #[test]
    fn bless_refreshes_output_fingerprint_after_edit() {
        let dir = tempfile::tempdir().unwrap();
        let subtitle_path = dir.path().join("subtitle_model.json");
        std::fs::write(&subtitle_path, b"{\"utterances\":[]}").unwrap();

        let mut manifest = Manifest::new();
        manifest.set_record(
            "subtitle",
            record_with_outputs(BTreeMap::from([(
                "subtitle_model".to_string(),
                "stale-fingerprint".to_string(),
            )])),
        );

        bless(
            &mut manifest,
            "subtitle",
            &[OutputDeclaration {
                key: "subtitle_model",
                path: &subtitle_path,
                is_dir: false,
            }],
        )
        .unwrap();

        let refreshed = manifest.record_for("subtitle").unwrap();
        let fp = refreshed.output_fingerprints.get("subtitle_model").unwrap();
        assert_ne!(fp, "stale-fingerprint");
    }

    #[test]
    fn bless_unknown_phase_is_an_error() {
        let mut manifest = Manifest::new();
        let result = bless(&mut manifest, "subtitle", &[]);
        assert!(result.is_err());
    }
}

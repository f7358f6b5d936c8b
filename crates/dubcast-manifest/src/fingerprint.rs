//! Content-addressed fingerprints: file digests, canonical directory
//! listings, and canonical-serialization config fingerprints.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use dubcast_foundation::error::ManifestError;

/// Hex-encoded 256-bit digest of a byte string.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Fingerprint of a single file's contents.
pub fn fingerprint_file(path: &Path) -> Result<String, ManifestError> {
    let bytes = std::fs::read(path)?;
    Ok(digest_bytes(&bytes))
}

/// Fingerprint of a directory: the digest of a canonical listing of
/// `name\0digest\n` lines sorted by name, so the fingerprint is
/// independent of traversal order and of anything but file identity and
/// content.
pub fn fingerprint_dir(path: &Path) -> Result<String, ManifestError> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| ManifestError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(path)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let file_digest = fingerprint_file(entry.path())?;
        entries.push((relative, file_digest));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut listing = String::new();
    for (name, digest) in &entries {
        listing.push_str(name);
        listing.push('\0');
        listing.push_str(digest);
        listing.push('\n');
    }
    Ok(digest_bytes(listing.as_bytes()))
}

/// Fingerprint of a phase's effective configuration: the digest of its
/// canonical serialization (sorted keys via `serde_json`'s `BTreeMap`
/// round-trip, no insignificant whitespace).
pub fn fingerprint_config<T: Serialize>(config: &T) -> Result<String, ManifestError> {
    let value = serde_json::to_value(config).map_err(|e| ManifestError::Corrupt {
        path: std::path::PathBuf::from("<config>"),
        reason: e.to_string(),
    })?;
    let canonical = canonicalize_value(&value);
    let text = serde_json::to_string(&canonical).map_err(|e| ManifestError::Corrupt {
        path: std::path::PathBuf::from("<config>"),
        reason: e.to_string(),
    })?;
    Ok(digest_bytes(text.as_bytes()))
}

/// Recursively rewrites JSON objects into a `BTreeMap` so `serde_json`
/// serializes their keys in sorted order regardless of insertion order.
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize_value(v)))
                .collect();
            serde_json::to_value(sorted).unwrap_or(serde_json::Value::Null)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).expect("writing to a String cannot fail");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_fingerprint_is_stable_and_content_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();
        let fp1 = fingerprint_file(&path).unwrap();
        let fp2 = fingerprint_file(&path).unwrap();
        assert_eq!(fp1, fp2);

        std::fs::write(&path, b"hello world").unwrap();
        let fp3 = fingerprint_file(&path).unwrap();
        assert_ne!(fp1, fp3);
    }

    #[test]
    fn dir_fingerprint_independent_of_traversal_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.wav"), b"bbb").unwrap();
        std::fs::write(dir.path().join("a.wav"), b"aaa").unwrap();
        let fp1 = fingerprint_dir(dir.path()).unwrap();

        let dir2 = tempfile::tempdir().unwrap();
        std::fs::write(dir2.path().join("a.wav"), b"aaa").unwrap();
        std::fs::write(dir2.path().join("b.wav"), b"bbb").unwrap();
        let fp2 = fingerprint_dir(dir2.path()).unwrap();

        assert_eq!(fp1, fp2);
    }

    #[test]
    fn config_fingerprint_ignores_key_order() {
        #[derive(Serialize)]
        struct A {
            z: u32,
            a: u32,
        }
        #[derive(Serialize)]
        struct B {
            a: u32,
            z: u32,
        }
        let fp_a = fingerprint_config(&A { z: 1, a: 2 }).unwrap();
        let fp_b = fingerprint_config(&B { a: 2, z: 1 }).unwrap();
        assert_eq!(fp_a, fp_b);
    }
}

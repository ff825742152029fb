//! Content-hash ledger of processed images.
//!
//! The ledger answers two questions before any pixel work happens:
//!
//! 1. **Is this file one of our own outputs?** Scanned folders often hold
//!    both sources and results (web thumbnails are written next to their
//!    originals). A candidate whose SHA-256 matches a recorded `output_hash`
//!    is skipped regardless of its extension, so a hand-placed `.webp` is
//!    still processed while our results are never re-encoded.
//! 2. **Is this output up to date?** An item is fresh when every output path
//!    has an entry with matching `source_hash` and `params_hash` and the file
//!    is still on disk.
//!
//! ## Storage
//!
//! A JSON file, [`LEDGER_FILENAME`], next to the config file. Keys are output
//! paths relative to that directory. A missing, corrupt, or version-mismatched
//! file loads as empty; the next run rebuilds it.

use crate::imaging::TransformPolicy;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the ledger file within the config directory.
pub const LEDGER_FILENAME: &str = ".portfolio-ledger.json";

/// Bump to invalidate existing ledgers when the format or hashing changes.
const LEDGER_VERSION: u32 = 1;

/// One produced output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub source_hash: String,
    pub params_hash: String,
    pub output_hash: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Ledger {
    pub version: u32,
    pub entries: HashMap<String, LedgerEntry>,
    /// Runtime index of every recorded `output_hash`. Never serialized.
    #[serde(skip)]
    outputs: HashSet<String>,
    /// Directory output keys are relative to.
    #[serde(skip)]
    root: PathBuf,
}

impl Ledger {
    /// Create an empty ledger rooted at `root` (used for `--force` or first run).
    pub fn empty(root: &Path) -> Self {
        Self {
            version: LEDGER_VERSION,
            entries: HashMap::new(),
            outputs: HashSet::new(),
            root: root.to_path_buf(),
        }
    }

    /// Load from `root`. Returns an empty ledger if the file doesn't exist
    /// or can't be parsed.
    pub fn load(root: &Path) -> Self {
        let path = ledger_path(root);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(root),
        };
        let mut ledger: Self = match serde_json::from_str(&content) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("ignoring unreadable ledger {}: {e}", path.display());
                return Self::empty(root);
            }
        };
        if ledger.version != LEDGER_VERSION {
            log::info!(
                "ledger {} has version {}, starting fresh",
                path.display(),
                ledger.version
            );
            return Self::empty(root);
        }
        ledger.outputs = ledger
            .entries
            .values()
            .map(|e| e.output_hash.clone())
            .collect();
        ledger.root = root.to_path_buf();
        ledger
    }

    /// Save to the root directory.
    pub fn save(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(ledger_path(&self.root), json)
    }

    /// Key for an output path: relative to the root when possible.
    pub fn key_for(&self, output: &Path) -> String {
        output
            .strip_prefix(&self.root)
            .unwrap_or(output)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Whether `content_hash` belongs to a file this tool produced.
    pub fn is_output(&self, content_hash: &str) -> bool {
        self.outputs.contains(content_hash)
    }

    /// Whether every output was produced from this exact source + policy and
    /// still exists on disk.
    pub fn is_fresh(&self, outputs: &[PathBuf], source_hash: &str, params_hash: &str) -> bool {
        !outputs.is_empty()
            && outputs.iter().all(|output| {
                output.exists()
                    && self.entries.get(&self.key_for(output)).is_some_and(|e| {
                        e.source_hash == source_hash && e.params_hash == params_hash
                    })
            })
    }

    /// Record an output file.
    pub fn record(&mut self, output: &Path, entry: LedgerEntry) {
        let key = self.key_for(output);
        if let Some(old) = self.entries.get(&key)
            && old.output_hash != entry.output_hash
            && !self
                .entries
                .iter()
                .any(|(k, e)| *k != key && e.output_hash == old.output_hash)
        {
            self.outputs.remove(&old.output_hash);
        }
        self.outputs.insert(entry.output_hash.clone());
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the ledger path for a root directory.
pub fn ledger_path(root: &Path) -> PathBuf {
    root.join(LEDGER_FILENAME)
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// SHA-256 hash of an in-memory buffer, returned as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 hash of a transform policy.
///
/// Covers geometry, format, quality, and effort; changing any of them
/// invalidates previously produced outputs.
pub fn hash_policy(policy: &TransformPolicy) -> String {
    use crate::imaging::Geometry;

    let mut hasher = Sha256::new();
    match policy.geometry {
        Geometry::CenterSquare { edge } => {
            hasher.update(b"center_square\0");
            hasher.update(edge.to_le_bytes());
        }
        Geometry::MaxDimension { limit } => {
            hasher.update(b"max_dimension\0");
            hasher.update(limit.to_le_bytes());
        }
    }
    hasher.update(policy.encode.format.extension().as_bytes());
    hasher.update(policy.encode.quality.value().to_le_bytes());
    hasher.update(policy.encode.effort.value().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{EncodeParams, Quality};
    use std::fs;
    use tempfile::TempDir;

    fn entry(source: &str, params: &str, output: &str) -> LedgerEntry {
        LedgerEntry {
            source_hash: source.into(),
            params_hash: params.into(),
            output_hash: output.into(),
        }
    }

    #[test]
    fn empty_ledger_has_no_entries() {
        let l = Ledger::empty(Path::new("/site"));
        assert_eq!(l.version, LEDGER_VERSION);
        assert!(l.is_empty());
        assert!(!l.is_output("anything"));
    }

    #[test]
    fn key_is_relative_to_root() {
        let l = Ledger::empty(Path::new("/site"));
        assert_eq!(
            l.key_for(Path::new("/site/photos/astro-01.webp")),
            "photos/astro-01.webp"
        );
        assert_eq!(l.key_for(Path::new("/elsewhere/x.webp")), "/elsewhere/x.webp");
    }

    #[test]
    fn record_marks_output_hash() {
        let tmp = TempDir::new().unwrap();
        let mut l = Ledger::empty(tmp.path());
        l.record(&tmp.path().join("a.webp"), entry("src", "prm", "out1"));
        assert!(l.is_output("out1"));
        assert!(!l.is_output("src"));
    }

    #[test]
    fn rerecord_drops_stale_output_hash() {
        let tmp = TempDir::new().unwrap();
        let mut l = Ledger::empty(tmp.path());
        let out = tmp.path().join("a.webp");
        l.record(&out, entry("src", "prm", "out1"));
        l.record(&out, entry("src2", "prm", "out2"));
        assert!(!l.is_output("out1"));
        assert!(l.is_output("out2"));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn shared_output_hash_survives_rerecord_of_one_path() {
        // hero.webp and portrait-01.webp carry identical bytes
        let tmp = TempDir::new().unwrap();
        let mut l = Ledger::empty(tmp.path());
        l.record(&tmp.path().join("hero.webp"), entry("s", "p", "same"));
        l.record(&tmp.path().join("portrait-01.webp"), entry("s", "p", "same"));
        l.record(&tmp.path().join("hero.webp"), entry("s2", "p", "new"));
        assert!(l.is_output("same"));
        assert!(l.is_output("new"));
    }

    #[test]
    fn fresh_requires_matching_hashes_and_existing_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("thumb.webp");
        let mut l = Ledger::empty(tmp.path());
        l.record(&out, entry("src", "prm", "o"));

        // File not on disk yet
        assert!(!l.is_fresh(std::slice::from_ref(&out), "src", "prm"));

        fs::write(&out, "data").unwrap();
        assert!(l.is_fresh(std::slice::from_ref(&out), "src", "prm"));
        assert!(!l.is_fresh(std::slice::from_ref(&out), "other", "prm"));
        assert!(!l.is_fresh(std::slice::from_ref(&out), "src", "other"));
        assert!(!l.is_fresh(&[], "src", "prm"));
    }

    #[test]
    fn fresh_requires_all_outputs() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("hero.webp");
        let b = tmp.path().join("astro-01.webp");
        fs::write(&a, "x").unwrap();
        fs::write(&b, "x").unwrap();
        let mut l = Ledger::empty(tmp.path());
        l.record(&a, entry("src", "prm", "o"));
        assert!(!l.is_fresh(&[a.clone(), b.clone()], "src", "prm"));
        l.record(&b, entry("src", "prm", "o"));
        assert!(l.is_fresh(&[a, b], "src", "prm"));
    }

    #[test]
    fn save_load_roundtrip_rebuilds_index() {
        let tmp = TempDir::new().unwrap();
        let mut l = Ledger::empty(tmp.path());
        l.record(&tmp.path().join("x/a.webp"), entry("s", "p", "o"));
        l.save().unwrap();

        let loaded = Ledger::load(tmp.path());
        assert_eq!(loaded.len(), 1);
        assert!(loaded.is_output("o"));
        assert_eq!(loaded.entries["x/a.webp"], entry("s", "p", "o"));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(Ledger::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(ledger_path(tmp.path()), "{not json").unwrap();
        assert!(Ledger::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_version_mismatch_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            ledger_path(tmp.path()),
            r#"{"version": 999, "entries": {"a.webp": {"source_hash": "s", "params_hash": "p", "output_hash": "o"}}}"#,
        )
        .unwrap();
        assert!(Ledger::load(tmp.path()).is_empty());
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("f.bin");
        fs::write(&p, b"abc").unwrap();
        let h = hash_file(&p).unwrap();
        assert_eq!(h, hash_bytes(b"abc"));
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn policy_hash_changes_with_every_parameter() {
        let base = TransformPolicy::center_square(256, EncodeParams::default());
        let variants = [
            TransformPolicy::center_square(257, EncodeParams::default()),
            TransformPolicy::max_dimension(256, EncodeParams::default()),
            TransformPolicy::center_square(
                256,
                EncodeParams {
                    quality: Quality::new(90),
                    ..EncodeParams::default()
                },
            ),
        ];
        let h = hash_policy(&base);
        assert_eq!(h, hash_policy(&base));
        for v in &variants {
            assert_ne!(h, hash_policy(v));
        }
    }
}

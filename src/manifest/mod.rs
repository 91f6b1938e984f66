//! Persistent record of everything a previous run generated.
//!
//! The manifest is loaded once at run start, threaded through the
//! reconciliation engine as an explicit value, and saved exactly once at
//! the end of a successful run. History snapshots are immutable copies.
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

mod hash;
mod store;

pub use hash::{canonical_json, schema_hash, sha256_hex};
pub use store::{history_entries, load_manifest, prune_history, save_manifest, save_to_history};

/// Manifest file name, relative to the project root.
pub const MANIFEST_FILE: &str = ".ai-native-manifest.json";
/// History directory, relative to the project root.
pub const HISTORY_DIR: &str = ".ai-native/history";
/// Number of history snapshots retained after pruning.
pub const HISTORY_KEEP: usize = 10;
/// Manifest format version.
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Artifact kinds tracked in the manifest, one bucket each.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Models,
    Migrations,
    Controllers,
    Routes,
    Factories,
    Seeders,
    Policies,
    Observers,
    Config,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 9] = [
        ArtifactKind::Models,
        ArtifactKind::Migrations,
        ArtifactKind::Controllers,
        ArtifactKind::Routes,
        ArtifactKind::Factories,
        ArtifactKind::Seeders,
        ArtifactKind::Policies,
        ArtifactKind::Observers,
        ArtifactKind::Config,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Models => "models",
            ArtifactKind::Migrations => "migrations",
            ArtifactKind::Controllers => "controllers",
            ArtifactKind::Routes => "routes",
            ArtifactKind::Factories => "factories",
            ArtifactKind::Seeders => "seeders",
            ArtifactKind::Policies => "policies",
            ArtifactKind::Observers => "observers",
            ArtifactKind::Config => "config",
        }
    }

    /// Parse an `--only` component token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "models" => Some(ArtifactKind::Models),
            "migrations" => Some(ArtifactKind::Migrations),
            "controllers" => Some(ArtifactKind::Controllers),
            "routes" => Some(ArtifactKind::Routes),
            "factories" => Some(ArtifactKind::Factories),
            "seeders" => Some(ArtifactKind::Seeders),
            "policies" => Some(ArtifactKind::Policies),
            "observers" => Some(ArtifactKind::Observers),
            "config" => Some(ArtifactKind::Config),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated file's record. Created on (re)generation, removed on
/// cleanup; metadata refreshed when the file is regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub generated_at: String,
    /// sha256 of the on-disk content; `None` when the file is missing.
    pub content_hash: Option<String>,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// The serialized manifest. Key ordering is stable (BTreeMap buckets)
/// so saved output diffs cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub generated_at: String,
    pub schema_hash: Option<String>,
    pub schema_snapshot: Option<Value>,
    pub files: BTreeMap<ArtifactKind, BTreeMap<String, FileRecord>>,
    pub total_file_count: usize,
}

impl Default for Manifest {
    fn default() -> Self {
        let files = ArtifactKind::ALL
            .iter()
            .map(|kind| (*kind, BTreeMap::new()))
            .collect();
        Self {
            version: MANIFEST_VERSION.to_string(),
            generated_at: now_rfc3339(),
            schema_hash: None,
            schema_snapshot: None,
            files,
            total_file_count: 0,
        }
    }
}

impl Manifest {
    /// Compare the canonical hash of `schema` against the stored hash.
    pub fn has_schema_changed(&self, schema: &Schema) -> bool {
        self.schema_hash.as_deref() != Some(schema_hash(&schema.raw).as_str())
    }

    /// Record the schema that produced the current generation state.
    pub fn set_schema(&mut self, schema: &Schema) {
        self.schema_hash = Some(schema_hash(&schema.raw));
        self.schema_snapshot = Some(schema.raw.clone());
        self.generated_at = now_rfc3339();
    }

    /// Upsert a file record, computing hash and size from disk when the
    /// file exists. Calling twice with the same path overwrites.
    pub fn add_generated_file(
        &mut self,
        kind: ArtifactKind,
        relative_path: &str,
        metadata: BTreeMap<String, Value>,
        project_root: &Path,
    ) {
        let on_disk = project_root.join(relative_path);
        let (content_hash, size_bytes) = match std::fs::read(&on_disk) {
            Ok(bytes) => (Some(sha256_hex(&bytes)), bytes.len() as u64),
            Err(_) => (None, 0),
        };
        self.files.entry(kind).or_default().insert(
            relative_path.to_string(),
            FileRecord {
                generated_at: now_rfc3339(),
                content_hash,
                size_bytes,
                metadata,
            },
        );
        self.recount();
    }

    /// Remove a path from every bucket it appears under.
    pub fn remove_path(&mut self, relative_path: &str) {
        for bucket in self.files.values_mut() {
            bucket.remove(relative_path);
        }
        self.recount();
    }

    /// All tracked paths across every bucket, with their kinds.
    pub fn tracked_paths(&self) -> Vec<(ArtifactKind, String)> {
        self.files
            .iter()
            .flat_map(|(kind, bucket)| bucket.keys().map(|path| (*kind, path.clone())))
            .collect()
    }

    fn recount(&mut self) {
        self.total_file_count = self.files.values().map(BTreeMap::len).sum();
    }
}

/// One immutable history snapshot as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub schema_hash: String,
    pub manifest: Manifest,
}

/// Typed paths into the project layout.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    pub fn env_path(&self) -> PathBuf {
        self.root.join(".env")
    }

    /// Absolute path for a manifest-relative artifact path.
    pub fn artifact(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    #[test]
    fn default_manifest_has_empty_buckets() {
        let manifest = Manifest::default();
        assert_eq!(manifest.files.len(), ArtifactKind::ALL.len());
        assert_eq!(manifest.total_file_count, 0);
        assert!(manifest.schema_hash.is_none());
    }

    #[test]
    fn schema_change_detection_ignores_key_order() {
        let a = schema_from_value(
            serde_json::from_str(r#"{"meta": {"project": "X"}, "models": {}}"#).expect("json"),
        );
        let b = schema_from_value(
            serde_json::from_str(r#"{"models": {}, "meta": {"project": "X"}}"#).expect("json"),
        );
        let mut manifest = Manifest::default();
        assert!(manifest.has_schema_changed(&a));
        manifest.set_schema(&a);
        assert!(!manifest.has_schema_changed(&a));
        assert!(!manifest.has_schema_changed(&b));

        let c = schema_from_value(json!({"meta": {"project": "Y"}, "models": {}}));
        assert!(manifest.has_schema_changed(&c));
    }

    #[test]
    fn add_generated_file_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.php"), b"<?php\n").expect("write");

        let mut manifest = Manifest::default();
        manifest.add_generated_file(
            ArtifactKind::Models,
            "a.php",
            BTreeMap::new(),
            dir.path(),
        );
        manifest.add_generated_file(
            ArtifactKind::Models,
            "a.php",
            BTreeMap::new(),
            dir.path(),
        );
        assert_eq!(manifest.total_file_count, 1);
        let record = &manifest.files[&ArtifactKind::Models]["a.php"];
        assert_eq!(record.size_bytes, 6);
        assert!(record.content_hash.is_some());
    }

    #[test]
    fn missing_file_records_null_hash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manifest = Manifest::default();
        manifest.add_generated_file(
            ArtifactKind::Models,
            "missing.php",
            BTreeMap::new(),
            dir.path(),
        );
        let record = &manifest.files[&ArtifactKind::Models]["missing.php"];
        assert!(record.content_hash.is_none());
        assert_eq!(record.size_bytes, 0);
    }

    #[test]
    fn remove_path_drops_from_every_bucket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manifest = Manifest::default();
        manifest.add_generated_file(
            ArtifactKind::Routes,
            "routes/api.php",
            BTreeMap::new(),
            dir.path(),
        );
        manifest.add_generated_file(
            ArtifactKind::Config,
            "routes/api.php",
            BTreeMap::new(),
            dir.path(),
        );
        assert_eq!(manifest.total_file_count, 2);
        manifest.remove_path("routes/api.php");
        assert_eq!(manifest.total_file_count, 0);
    }
}

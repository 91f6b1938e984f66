//! Manifest persistence and history snapshots.
//!
//! Loading synthesizes a default manifest when none exists, but a file
//! that exists and fails to parse is fatal: discarding prior state would
//! defeat the cleanup/diff safety guarantee.
use super::{HistoryEntry, Manifest, ProjectPaths, HISTORY_KEEP};
use crate::error::ManifestError;
use std::fs;
use std::path::{Path, PathBuf};

/// Load the manifest for a project root, or a default when absent.
pub fn load_manifest(project_root: &Path) -> Result<Manifest, ManifestError> {
    let path = ProjectPaths::new(project_root.to_path_buf()).manifest_path();
    if !path.exists() {
        return Ok(Manifest::default());
    }
    let bytes = fs::read(&path).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ManifestError::CorruptManifest { path, source })
}

/// Serialize the manifest to its project path. Must be the last mutation
/// of a successful run.
pub fn save_manifest(manifest: &Manifest, project_root: &Path) -> Result<(), ManifestError> {
    let path = ProjectPaths::new(project_root.to_path_buf()).manifest_path();
    let text = serde_json::to_string_pretty(manifest).map_err(|source| {
        ManifestError::CorruptManifest {
            path: path.clone(),
            source,
        }
    })?;
    fs::write(&path, text.as_bytes()).map_err(|source| ManifestError::Io { path, source })
}

/// Write an immutable timestamped snapshot and prune old entries.
///
/// Returns the snapshot path, or `None` when the manifest has no schema
/// yet (nothing worth snapshotting).
pub fn save_to_history(
    manifest: &Manifest,
    project_root: &Path,
) -> Result<Option<PathBuf>, ManifestError> {
    let Some(schema_hash) = manifest.schema_hash.as_deref() else {
        return Ok(None);
    };

    let history_dir = ProjectPaths::new(project_root.to_path_buf()).history_dir();
    fs::create_dir_all(&history_dir).map_err(|source| ManifestError::Io {
        path: history_dir.clone(),
        source,
    })?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let prefix: String = schema_hash.chars().take(8).collect();
    let mut path = history_dir.join(format!("{timestamp}_{prefix}.json"));
    // Same-second saves of the same schema would collide; suffix until
    // the name is free.
    let mut attempt = 1;
    while path.exists() {
        path = history_dir.join(format!("{timestamp}_{prefix}-{attempt}.json"));
        attempt += 1;
    }

    let entry = HistoryEntry {
        timestamp: super::now_rfc3339(),
        schema_hash: schema_hash.to_string(),
        manifest: manifest.clone(),
    };
    let text =
        serde_json::to_string_pretty(&entry).map_err(|source| ManifestError::CorruptManifest {
            path: path.clone(),
            source,
        })?;
    fs::write(&path, text.as_bytes()).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;

    prune_history(project_root)?;
    Ok(Some(path))
}

/// Delete history files beyond the newest [`HISTORY_KEEP`], oldest first.
/// Filenames are timestamp-prefixed so ascending name order is ascending
/// time order.
pub fn prune_history(project_root: &Path) -> Result<(), ManifestError> {
    let files = history_files(project_root)?;
    if files.len() <= HISTORY_KEEP {
        return Ok(());
    }
    for stale in &files[..files.len() - HISTORY_KEEP] {
        // Already-gone files are not an error.
        let _ = fs::remove_file(stale);
    }
    Ok(())
}

/// History snapshot paths in ascending timestamp order.
pub fn history_entries(project_root: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    history_files(project_root)
}

fn history_files(project_root: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let history_dir = ProjectPaths::new(project_root.to_path_buf()).history_dir();
    if !history_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&history_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    #[test]
    fn load_defaults_when_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = load_manifest(dir.path()).expect("load");
        assert!(manifest.schema_hash.is_none());
    }

    #[test]
    fn corrupt_manifest_is_fatal_not_discarded() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(super::super::MANIFEST_FILE), b"{not json")
            .expect("write");
        let err = load_manifest(dir.path()).expect_err("must fail");
        assert!(matches!(err, ManifestError::CorruptManifest { .. }));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let schema = schema_from_value(json!({"meta": {}, "models": {}}));
        let mut manifest = Manifest::default();
        manifest.set_schema(&schema);
        save_manifest(&manifest, dir.path()).expect("save");

        let reloaded = load_manifest(dir.path()).expect("reload");
        assert_eq!(reloaded.schema_hash, manifest.schema_hash);
        assert!(!reloaded.has_schema_changed(&schema));
    }

    #[test]
    fn history_is_pruned_to_the_newest_ten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history_dir = dir.path().join(super::super::HISTORY_DIR);
        fs::create_dir_all(&history_dir).expect("mkdir");
        for i in 0..14 {
            fs::write(
                history_dir.join(format!("2026-01-{:02}_00-00-00_{:08x}.json", i + 1, i)),
                b"{}",
            )
            .expect("write");
        }

        prune_history(dir.path()).expect("prune");
        let remaining = history_entries(dir.path()).expect("list");
        assert_eq!(remaining.len(), HISTORY_KEEP);
        // The oldest four are gone; the newest survives.
        let names: Vec<String> = remaining
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names[0].starts_with("2026-01-05"));
        assert!(names.last().unwrap().starts_with("2026-01-14"));
    }

    #[test]
    fn save_to_history_skips_empty_manifests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = Manifest::default();
        let written = save_to_history(&manifest, dir.path()).expect("history");
        assert!(written.is_none());
    }

    #[test]
    fn save_to_history_writes_snapshot_and_prunes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let schema = schema_from_value(json!({"meta": {}, "models": {}}));
        let mut manifest = Manifest::default();
        manifest.set_schema(&schema);

        for _ in 0..12 {
            save_to_history(&manifest, dir.path())
                .expect("history")
                .expect("path");
        }
        let entries = history_entries(dir.path()).expect("list");
        assert_eq!(entries.len(), HISTORY_KEEP);

        let text = fs::read_to_string(&entries[0]).expect("read");
        let entry: HistoryEntry = serde_json::from_str(&text).expect("parse");
        assert_eq!(Some(entry.schema_hash), manifest.schema_hash);
    }
}

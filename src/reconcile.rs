//! Reconciliation between the previous manifest and the new schema.
//!
//! Computes the artifact set the schema requires, diffs it against what
//! the manifest tracks, and deletes only the obsolete remainder. Glob
//! patterns (timestamp-prefixed migrations) are matched by pattern at
//! diff time and expanded against the filesystem only at delete time.
use crate::error::IoFailure;
use crate::manifest::{ArtifactKind, Manifest};
use crate::naming;
use crate::schema::Schema;
use globset::{Glob, GlobSetBuilder};
use std::path::Path;

/// Framework tables that never get a create migration. The `users` table
/// is modified in place instead.
pub const RESERVED_TABLES: [&str; 4] = [
    "users",
    "password_resets",
    "failed_jobs",
    "personal_access_tokens",
];

/// Infrastructure paths kept regardless of schema content.
pub const INFRA_PATHS: [(ArtifactKind, &str); 4] = [
    (ArtifactKind::Routes, "routes/api.php"),
    (ArtifactKind::Seeders, "database/seeders/DatabaseSeeder.php"),
    (ArtifactKind::Config, "app/Providers/AuthServiceProvider.php"),
    (ArtifactKind::Config, "app/Providers/ObserverServiceProvider.php"),
];

/// One required artifact: a concrete relative path or a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredArtifact {
    pub kind: ArtifactKind,
    pub pattern: String,
}

impl RequiredArtifact {
    fn new(kind: ArtifactKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }

    pub fn is_glob(&self) -> bool {
        self.pattern.contains('*')
    }
}

/// Effective run mode after resolving the mutually exclusive flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Delete obsolete artifacts, then regenerate everything required.
    Clean,
    /// Skip or textually merge into existing files instead of overwriting.
    Merge,
    /// Report the diff; zero filesystem writes, zero manifest mutation.
    Preview,
}

impl RunMode {
    /// Preview wins over merge wins over clean; clean is the default.
    pub fn resolve(merge: bool, preview: bool, dry_run: bool) -> Self {
        if preview || dry_run {
            RunMode::Preview
        } else if merge {
            RunMode::Merge
        } else {
            RunMode::Clean
        }
    }
}

/// Derive every artifact path the schema requires, deterministically in
/// entity declaration order, pivots next, infrastructure last.
pub fn required_artifacts(schema: &Schema) -> Vec<RequiredArtifact> {
    let mut required = Vec::new();

    for entity in schema.entities.values() {
        let studly = naming::studly(&entity.name);
        required.push(RequiredArtifact::new(
            ArtifactKind::Models,
            format!("app/Models/{studly}.php"),
        ));

        if entity.has_routes() {
            required.push(RequiredArtifact::new(
                ArtifactKind::Controllers,
                format!("app/Http/Controllers/{studly}Controller.php"),
            ));
        }

        if entity.table == "users" {
            required.push(RequiredArtifact::new(
                ArtifactKind::Migrations,
                "database/migrations/*_modify_users_table.php",
            ));
        } else if !RESERVED_TABLES.contains(&entity.table.as_str()) {
            required.push(RequiredArtifact::new(
                ArtifactKind::Migrations,
                format!("database/migrations/*_create_{}_table.php", entity.table),
            ));
        }

        if entity.factory.is_some() {
            required.push(RequiredArtifact::new(
                ArtifactKind::Factories,
                format!("database/factories/{studly}Factory.php"),
            ));
        }

        if entity.seeder {
            required.push(RequiredArtifact::new(
                ArtifactKind::Seeders,
                format!("database/seeders/{studly}Seeder.php"),
            ));
        }

        if entity.has_policies() {
            required.push(RequiredArtifact::new(
                ArtifactKind::Policies,
                format!("app/Policies/{studly}Policy.php"),
            ));
        }

        if entity.has_observers() {
            required.push(RequiredArtifact::new(
                ArtifactKind::Observers,
                format!("app/Observers/{studly}Observer.php"),
            ));
        }
    }

    for pivot in schema.pivots.values() {
        required.push(RequiredArtifact::new(
            ArtifactKind::Migrations,
            format!("database/migrations/*_create_{}_table.php", pivot.name),
        ));
    }

    if schema.auth_enabled() {
        required.push(RequiredArtifact::new(
            ArtifactKind::Controllers,
            "app/Http/Controllers/AuthController.php",
        ));
    }

    for (kind, path) in INFRA_PATHS {
        required.push(RequiredArtifact::new(kind, path));
    }

    required
}

/// Tracked paths that the new schema no longer requires.
///
/// A tracked path survives when it equals a required path or matches a
/// required glob pattern, so a concrete migration path is kept by its
/// timestamp-wildcard pattern. Never returns a path present in
/// `required_artifacts`.
pub fn files_to_cleanup(manifest: &Manifest, schema: &Schema) -> Vec<String> {
    let required = required_artifacts(schema);
    let mut exact: Vec<&str> = Vec::new();
    let mut globs = GlobSetBuilder::new();
    for artifact in &required {
        if artifact.is_glob() {
            if let Ok(glob) = Glob::new(&artifact.pattern) {
                globs.add(glob);
            }
        } else {
            exact.push(&artifact.pattern);
        }
    }
    let globs = globs.build().unwrap_or_else(|_| {
        GlobSetBuilder::new()
            .build()
            .expect("empty glob set always builds")
    });

    let mut obsolete = Vec::new();
    for (_, path) in manifest.tracked_paths() {
        let kept = exact.contains(&path.as_str()) || globs.is_match(&path);
        if !kept && !obsolete.contains(&path) {
            obsolete.push(path);
        }
    }
    obsolete
}

/// Result of a cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupOutcome {
    pub deleted: Vec<String>,
    pub failures: Vec<IoFailure>,
}

/// Delete every obsolete path and drop its records from the manifest.
///
/// Wildcard entries are expanded against the filesystem first. Deleting
/// a path that no longer exists is a no-op; real I/O failures are
/// collected, not fatal, so one locked file cannot block the rest.
pub fn cleanup(manifest: &mut Manifest, schema: &Schema, project_root: &Path) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();

    for path in files_to_cleanup(manifest, schema) {
        let targets = if path.contains('*') {
            expand_glob(project_root, &path)
        } else {
            vec![path.clone()]
        };

        for target in targets {
            let on_disk = project_root.join(&target);
            if on_disk.exists() {
                match std::fs::remove_file(&on_disk) {
                    Ok(()) => outcome.deleted.push(target.clone()),
                    Err(source) => {
                        outcome.failures.push(IoFailure::new("delete", on_disk, source));
                        continue;
                    }
                }
            }
            manifest.remove_path(&target);
        }
        manifest.remove_path(&path);
    }

    outcome
}

/// Expand a relative glob pattern against the filesystem. Patterns only
/// carry wildcards in the file name, so one directory listing suffices.
pub fn expand_glob(project_root: &Path, pattern: &str) -> Vec<String> {
    let Ok(glob) = Glob::new(pattern) else {
        return Vec::new();
    };
    let matcher = glob.compile_matcher();
    let dir = Path::new(pattern)
        .parent()
        .map(|p| project_root.join(p))
        .unwrap_or_else(|| project_root.to_path_buf());
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut matches: Vec<String> = walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(project_root)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            matcher.is_match(&relative).then_some(relative)
        })
        .collect();
    matches.sort();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::schema::schema_from_value;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema_one_user() -> Schema {
        schema_from_value(json!({
            "meta": {"project": "T"},
            "models": {
                "User": {
                    "fields": {
                        "name": "string|required",
                        "email": "string|email|unique|required"
                    },
                    "routes": ["list", "create"]
                }
            }
        }))
    }

    #[test]
    fn scenario_one_required_set() {
        let required = required_artifacts(&schema_one_user());
        let patterns: Vec<&str> = required.iter().map(|r| r.pattern.as_str()).collect();
        assert!(patterns.contains(&"app/Models/User.php"));
        assert!(patterns.contains(&"app/Http/Controllers/UserController.php"));
        assert!(!patterns.iter().any(|p| p.contains("Factory")));
        // users is a reserved table: modify, not create.
        assert!(patterns.contains(&"database/migrations/*_modify_users_table.php"));
        assert!(patterns.contains(&"routes/api.php"));
        assert!(patterns.contains(&"database/seeders/DatabaseSeeder.php"));
    }

    #[test]
    fn cleanup_diff_spares_required_and_glob_matched_paths() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Post": {
                    "fields": {"title": "string|required"},
                    "routes": ["list"]
                }
            }
        }));
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manifest = Manifest::default();
        for (kind, path) in [
            (ArtifactKind::Models, "app/Models/Post.php"),
            (ArtifactKind::Models, "app/Models/Tag.php"),
            (
                ArtifactKind::Migrations,
                "database/migrations/2026_01_02_000000_create_posts_table.php",
            ),
            (
                ArtifactKind::Migrations,
                "database/migrations/2026_01_02_000000_create_tags_table.php",
            ),
        ] {
            manifest.add_generated_file(kind, path, BTreeMap::new(), dir.path());
        }

        let obsolete = files_to_cleanup(&manifest, &schema);
        assert_eq!(
            obsolete,
            vec![
                "app/Models/Tag.php".to_string(),
                "database/migrations/2026_01_02_000000_create_tags_table.php".to_string(),
            ]
        );

        // Cleanup safety: nothing obsolete may also be required.
        let required = required_artifacts(&schema);
        for path in &obsolete {
            assert!(!required.iter().any(|r| r.pattern == *path));
        }
    }

    #[test]
    fn cleanup_expands_wildcards_and_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let migrations = dir.path().join("database/migrations");
        std::fs::create_dir_all(&migrations).expect("mkdir");
        std::fs::write(
            migrations.join("2026_01_02_000000_create_tags_table.php"),
            b"<?php\n",
        )
        .expect("write");

        let mut manifest = Manifest::default();
        manifest.add_generated_file(
            ArtifactKind::Migrations,
            "database/migrations/*_create_tags_table.php",
            BTreeMap::new(),
            dir.path(),
        );
        manifest.add_generated_file(
            ArtifactKind::Models,
            "app/Models/Tag.php",
            BTreeMap::new(),
            dir.path(),
        );

        let schema = schema_from_value(json!({"meta": {}, "models": {}}));
        let outcome = cleanup(&mut manifest, &schema, dir.path());
        assert!(outcome.failures.is_empty());
        assert_eq!(
            outcome.deleted,
            vec!["database/migrations/2026_01_02_000000_create_tags_table.php".to_string()]
        );
        assert!(!migrations.join("2026_01_02_000000_create_tags_table.php").exists());
        // The missing model file was a no-op; both records are gone.
        assert_eq!(manifest.total_file_count, 0);
    }

    #[test]
    fn mode_resolution_is_deterministic() {
        assert_eq!(RunMode::resolve(false, false, false), RunMode::Clean);
        assert_eq!(RunMode::resolve(true, false, false), RunMode::Merge);
        assert_eq!(RunMode::resolve(true, true, false), RunMode::Preview);
        assert_eq!(RunMode::resolve(false, false, true), RunMode::Preview);
    }

    #[test]
    fn pivot_and_auth_artifacts_are_required() {
        let schema = schema_from_value(json!({
            "meta": {"auth": {"enabled": true, "provider": "sanctum"}},
            "models": {
                "Post": {"fields": {"title": "string"}}
            },
            "pivots": {
                "post_tag": {"fields": {"post_id": "foreign:posts"}}
            }
        }));
        let patterns: Vec<String> = required_artifacts(&schema)
            .into_iter()
            .map(|r| r.pattern)
            .collect();
        assert!(patterns.contains(&"database/migrations/*_create_post_tag_table.php".to_string()));
        assert!(patterns.contains(&"app/Http/Controllers/AuthController.php".to_string()));
    }
}

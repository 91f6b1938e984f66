//! Run orchestration for the generate/validate/status commands.
//!
//! One invocation drives one manifest transition: load schema, validate,
//! diff against the previous manifest, render artifacts, save manifest
//! and history. Per-file I/O failures are accumulated into the run
//! report instead of aborting, so one locked file cannot block the rest;
//! the final exit status still reflects them.
use crate::envfile;
use crate::error::IoFailure;
use crate::generate;
use crate::manifest::{
    load_manifest, save_manifest, save_to_history, ArtifactKind, Manifest, ProjectPaths,
};
use crate::merge;
use crate::naming;
use crate::reconcile::{
    cleanup, expand_glob, files_to_cleanup, required_artifacts, RunMode, RESERVED_TABLES,
};
use crate::schema::{load_schema, Entity, Schema};
use crate::validate::{validate, ValidationIssue};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Inputs for one generate run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub schema_path: PathBuf,
    pub project_root: PathBuf,
    pub merge: bool,
    pub preview: bool,
    pub dry_run: bool,
    /// Restrict per-entity generation to these kinds.
    pub only: Option<Vec<ArtifactKind>>,
}

/// What a generate run produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// Validation errors; nothing was generated or mutated.
    ValidationFailed(Vec<ValidationIssue>),
    /// Schema hash matches the manifest; nothing to do.
    Unchanged,
    /// Preview mode: the computed diff, zero writes.
    Preview(PreviewReport),
    /// Artifacts were generated (possibly with per-file failures).
    Completed(RunReport),
}

#[derive(Debug, Default)]
pub struct PreviewReport {
    pub cleanup: Vec<String>,
    pub creates: Vec<String>,
    pub warnings: Vec<ValidationIssue>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub deleted: Vec<String>,
    pub failures: Vec<IoFailure>,
    pub warnings: Vec<ValidationIssue>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse and validate a schema; the validate command's whole job.
pub fn run_validate(schema_path: &Path) -> Result<(Schema, Vec<ValidationIssue>)> {
    let schema = load_schema(schema_path)?;
    let issues = validate(&schema);
    Ok((schema, issues))
}

/// Execute one generation run.
pub fn run_generate(options: &GenerateOptions) -> Result<RunOutcome> {
    let schema = load_schema(&options.schema_path)?;

    let issues = validate(&schema);
    let (errors, warnings): (Vec<_>, Vec<_>) =
        issues.into_iter().partition(ValidationIssue::is_error);
    if !errors.is_empty() {
        return Ok(RunOutcome::ValidationFailed(errors));
    }

    let mut manifest = load_manifest(&options.project_root)?;
    let mode = RunMode::resolve(options.merge, options.preview, options.dry_run);
    let changed = manifest.has_schema_changed(&schema);

    if mode == RunMode::Preview {
        return Ok(RunOutcome::Preview(preview(&manifest, &schema, warnings)));
    }

    if !changed {
        tracing::info!("schema unchanged since last generation");
        return Ok(RunOutcome::Unchanged);
    }

    let mut report = RunReport {
        warnings,
        ..RunReport::default()
    };

    if mode == RunMode::Clean {
        let outcome = cleanup(&mut manifest, &schema, &options.project_root);
        report.deleted = outcome.deleted;
        report.failures.extend(outcome.failures);
        for path in &report.deleted {
            tracing::info!(path = %path, "deleted obsolete artifact");
        }
    }

    manifest.set_schema(&schema);

    configure_environment(&schema, &options.project_root, &mut report);

    let ctx = GenerationContext {
        schema: &schema,
        root: options.project_root.clone(),
        mode,
        only: options.only.clone(),
    };

    ctx.generate_entities(&mut manifest, &mut report);
    ctx.generate_pivots(&mut manifest, &mut report);
    ctx.generate_routes(&mut manifest, &mut report);
    ctx.generate_auth(&mut manifest, &mut report);
    ctx.generate_service_providers(&mut manifest, &mut report);

    save_manifest(&manifest, &options.project_root)
        .context("save manifest after generation")?;
    save_to_history(&manifest, &options.project_root).context("save manifest history")?;

    tracing::info!(
        written = report.written.len(),
        deleted = report.deleted.len(),
        failures = report.failures.len(),
        "generation finished"
    );
    Ok(RunOutcome::Completed(report))
}

fn preview(manifest: &Manifest, schema: &Schema, warnings: Vec<ValidationIssue>) -> PreviewReport {
    PreviewReport {
        cleanup: files_to_cleanup(manifest, schema),
        creates: required_artifacts(schema)
            .into_iter()
            .map(|artifact| artifact.pattern)
            .collect(),
        warnings,
    }
}

fn configure_environment(schema: &Schema, root: &Path, report: &mut RunReport) {
    let pairs = envfile::flatten_meta(&schema.raw);
    if pairs.is_empty() {
        return;
    }
    let env_path = ProjectPaths::new(root.to_path_buf()).env_path();
    let existing = std::fs::read_to_string(&env_path).unwrap_or_default();
    let updated = envfile::apply_pairs(&existing, &pairs);
    if updated != existing {
        if let Err(source) = std::fs::write(&env_path, updated) {
            report.failures.push(IoFailure::new("write", env_path, source));
        } else {
            report.written.push(".env".to_string());
        }
    }
}

struct GenerationContext<'a> {
    schema: &'a Schema,
    root: PathBuf,
    mode: RunMode,
    only: Option<Vec<ArtifactKind>>,
}

impl GenerationContext<'_> {
    fn wants(&self, kind: ArtifactKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }

    /// Merge mode skips per-entity files that already exist on disk.
    fn skip_existing(&self, relative: &str) -> bool {
        self.mode == RunMode::Merge && self.root.join(relative).exists()
    }

    fn generate_entities(&self, manifest: &mut Manifest, report: &mut RunReport) {
        for entity in self.schema.entities.values() {
            let studly = naming::studly(&entity.name);

            if self.wants(ArtifactKind::Models) {
                self.write_tracked(
                    manifest,
                    report,
                    ArtifactKind::Models,
                    &format!("app/Models/{studly}.php"),
                    generate::model::render(entity),
                    metadata(&[("model_name", json!(entity.name))]),
                );
            }

            if self.wants(ArtifactKind::Migrations) {
                self.generate_migration(manifest, report, entity);
            }

            if self.wants(ArtifactKind::Controllers) && entity.has_routes() {
                let routes: Vec<&str> =
                    entity.routes.iter().map(|verb| verb.as_str()).collect();
                self.write_tracked(
                    manifest,
                    report,
                    ArtifactKind::Controllers,
                    &format!("app/Http/Controllers/{studly}Controller.php"),
                    generate::controller::render(entity),
                    metadata(&[
                        ("model_name", json!(entity.name)),
                        ("routes", json!(routes)),
                    ]),
                );
            }

            if self.wants(ArtifactKind::Factories) && entity.factory.is_some() {
                self.write_tracked(
                    manifest,
                    report,
                    ArtifactKind::Factories,
                    &format!("database/factories/{studly}Factory.php"),
                    generate::factory::render(entity),
                    metadata(&[("model_name", json!(entity.name))]),
                );
            }

            if self.wants(ArtifactKind::Seeders) && entity.seeder {
                self.write_tracked(
                    manifest,
                    report,
                    ArtifactKind::Seeders,
                    &format!("database/seeders/{studly}Seeder.php"),
                    generate::seeder::render(entity, self.schema),
                    metadata(&[("model_name", json!(entity.name))]),
                );
            }

            if self.wants(ArtifactKind::Policies) && entity.has_policies() {
                self.write_tracked(
                    manifest,
                    report,
                    ArtifactKind::Policies,
                    &format!("app/Policies/{studly}Policy.php"),
                    generate::policy::render(entity),
                    metadata(&[("model_name", json!(entity.name))]),
                );
            }

            if self.wants(ArtifactKind::Observers) && entity.has_observers() {
                self.write_tracked(
                    manifest,
                    report,
                    ArtifactKind::Observers,
                    &format!("app/Observers/{studly}Observer.php"),
                    generate::observer::render(entity),
                    metadata(&[("model_name", json!(entity.name))]),
                );
            }
        }

        if self.wants(ArtifactKind::Seeders) && self.schema.any_seeder() {
            self.write_tracked(
                manifest,
                report,
                ArtifactKind::Seeders,
                "database/seeders/DatabaseSeeder.php",
                generate::seeder::render_database_seeder(self.schema),
                metadata(&[("modified", json!(true))]),
            );
        }
    }

    fn generate_migration(&self, manifest: &mut Manifest, report: &mut RunReport, entity: &Entity) {
        let table = entity.table.as_str();
        if RESERVED_TABLES.contains(&table) && table != "users" {
            return;
        }

        let (pattern, content, kind_meta) = if table == "users" {
            (
                "database/migrations/*_modify_users_table.php".to_string(),
                generate::migration::render_modify_users(entity),
                "modify",
            )
        } else {
            (
                format!("database/migrations/*_create_{table}_table.php"),
                generate::migration::render_create(entity),
                "create",
            )
        };

        let existing = expand_glob(&self.root, &pattern);
        if self.mode == RunMode::Merge && !existing.is_empty() {
            report.skipped.push(pattern);
            return;
        }

        // Regenerating a table's migration replaces any prior ones.
        for existing in existing {
            let on_disk = self.root.join(&existing);
            match std::fs::remove_file(&on_disk) {
                Ok(()) => {
                    manifest.remove_path(&existing);
                    report.deleted.push(existing);
                }
                Err(source) => {
                    report.failures.push(IoFailure::new("delete", on_disk, source));
                }
            }
        }

        let file_name = pattern.replace('*', &migration_timestamp(manifest));
        self.write_tracked(
            manifest,
            report,
            ArtifactKind::Migrations,
            &file_name,
            content,
            metadata(&[
                ("table_name", json!(table)),
                ("model_name", json!(entity.name)),
                ("type", json!(kind_meta)),
            ]),
        );
    }

    fn generate_pivots(&self, manifest: &mut Manifest, report: &mut RunReport) {
        for pivot in self.schema.pivots.values() {
            if !self.wants(ArtifactKind::Migrations) {
                return;
            }
            let pattern = format!("database/migrations/*_create_{}_table.php", pivot.name);
            if !expand_glob(&self.root, &pattern).is_empty() {
                tracing::info!(pivot = %pivot.name, "pivot migration already exists");
                report.skipped.push(pattern);
                continue;
            }
            let file_name = pattern.replace('*', &migration_timestamp(manifest));
            self.write_tracked(
                manifest,
                report,
                ArtifactKind::Migrations,
                &file_name,
                generate::migration::render_pivot(pivot),
                metadata(&[("table_name", json!(pivot.name)), ("type", json!("pivot"))]),
            );
        }
    }

    fn generate_routes(&self, manifest: &mut Manifest, report: &mut RunReport) {
        if !self.wants(ArtifactKind::Routes) {
            return;
        }
        let relative = "routes/api.php";
        let path = self.root.join(relative);
        let content = match std::fs::read_to_string(&path) {
            Ok(existing) => merge::replace_or_append(
                &existing,
                merge::ROUTES_MARKER,
                &generate::routes::render_section(self.schema),
            ),
            Err(_) => generate::routes::render_file(self.schema),
        };
        self.write_raw(manifest, report, ArtifactKind::Routes, relative, content);
    }

    fn generate_auth(&self, manifest: &mut Manifest, report: &mut RunReport) {
        if !self.schema.auth_enabled() {
            return;
        }

        self.write_tracked(
            manifest,
            report,
            ArtifactKind::Controllers,
            "app/Http/Controllers/AuthController.php",
            generate::auth::render_controller(self.schema),
            metadata(&[
                ("type", json!("auth")),
                ("provider", json!(self.schema.auth.provider)),
            ]),
        );

        // Auth routes live in the routes file, above the resource block.
        let relative = "routes/api.php";
        let path = self.root.join(relative);
        let existing = std::fs::read_to_string(&path).unwrap_or_default();
        if !existing.contains("AuthController") {
            let content = merge::replace_or_append(
                &existing,
                merge::AUTH_ROUTES_MARKER,
                &generate::auth::render_routes(self.schema),
            );
            self.write_raw(manifest, report, ArtifactKind::Routes, relative, content);
        }
    }

    fn generate_service_providers(&self, manifest: &mut Manifest, report: &mut RunReport) {
        if self.schema.any_policies() {
            self.write_tracked(
                manifest,
                report,
                ArtifactKind::Config,
                "app/Providers/AuthServiceProvider.php",
                generate::policy::render_service_provider(self.schema),
                metadata(&[("modified", json!(true))]),
            );
        }
        if self.schema.any_observers() {
            self.write_tracked(
                manifest,
                report,
                ArtifactKind::Config,
                "app/Providers/ObserverServiceProvider.php",
                generate::observer::render_service_provider(self.schema),
                metadata(&[("modified", json!(true))]),
            );
        }
    }

    /// Write a per-entity artifact, honoring merge-mode skip semantics.
    fn write_tracked(
        &self,
        manifest: &mut Manifest,
        report: &mut RunReport,
        kind: ArtifactKind,
        relative: &str,
        content: String,
        metadata: BTreeMap<String, Value>,
    ) {
        if self.skip_existing(relative) {
            tracing::debug!(path = relative, "merge mode: keeping existing file");
            report.skipped.push(relative.to_string());
            return;
        }
        self.write_with_metadata(manifest, report, kind, relative, content, metadata);
    }

    /// Write a shared file (routes) that merge mode edits rather than
    /// skips.
    fn write_raw(
        &self,
        manifest: &mut Manifest,
        report: &mut RunReport,
        kind: ArtifactKind,
        relative: &str,
        content: String,
    ) {
        self.write_with_metadata(
            manifest,
            report,
            kind,
            relative,
            content,
            metadata(&[("modified", json!(true))]),
        );
    }

    fn write_with_metadata(
        &self,
        manifest: &mut Manifest,
        report: &mut RunReport,
        kind: ArtifactKind,
        relative: &str,
        content: String,
        metadata: BTreeMap<String, Value>,
    ) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            if let Err(source) = std::fs::create_dir_all(parent) {
                report
                    .failures
                    .push(IoFailure::new("create", parent.to_path_buf(), source));
                return;
            }
        }
        match std::fs::write(&path, content.as_bytes()) {
            Ok(()) => {
                tracing::info!(path = relative, "wrote artifact");
                manifest.add_generated_file(kind, relative, metadata, &self.root);
                report.written.push(relative.to_string());
            }
            Err(source) => {
                report.failures.push(IoFailure::new("write", path, source));
            }
        }
    }
}

fn metadata(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Migration file-name timestamps: wall clock plus a per-run sequence so
/// names stay unique and ordered within one run.
fn migration_timestamp(manifest: &Manifest) -> String {
    let sequence = 10
        + manifest
            .files
            .get(&ArtifactKind::Migrations)
            .map(BTreeMap::len)
            .unwrap_or(0)
            % 90;
    format!(
        "{}{sequence}",
        chrono::Utc::now().format("%Y_%m_%d_%H%M%S")
    )
}

/// Manifest/history summary for the status command.
#[derive(Debug, serde::Serialize)]
pub struct StatusSummary {
    pub manifest_present: bool,
    pub schema_hash: Option<String>,
    pub generated_at: Option<String>,
    pub total_file_count: usize,
    pub files_by_kind: BTreeMap<String, usize>,
    pub history: Vec<String>,
}

pub fn run_status(project_root: &Path) -> Result<StatusSummary> {
    let paths = ProjectPaths::new(project_root.to_path_buf());
    let manifest_present = paths.manifest_path().exists();
    let manifest = load_manifest(project_root)?;
    let history = crate::manifest::history_entries(project_root)?
        .into_iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();

    Ok(StatusSummary {
        manifest_present,
        schema_hash: manifest.schema_hash.clone(),
        generated_at: manifest_present.then(|| manifest.generated_at.clone()),
        total_file_count: manifest.total_file_count,
        files_by_kind: manifest
            .files
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(kind, bucket)| (kind.as_str().to_string(), bucket.len()))
            .collect(),
        history,
    })
}

/// Parse the `--only` flag value into artifact kinds; unknown tokens are
/// reported, not ignored.
pub fn parse_only(value: &str) -> Result<Vec<ArtifactKind>> {
    let mut kinds = Vec::new();
    for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let kind = ArtifactKind::parse(token)
            .with_context(|| format!("unknown component `{token}` in --only"))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

// Exercised end-to-end in tests/generate_integration.rs; unit tests here
// cover the pure helpers.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_only_accepts_known_kinds() {
        let kinds = parse_only("models, migrations,controllers").expect("parse");
        assert_eq!(
            kinds,
            vec![
                ArtifactKind::Models,
                ArtifactKind::Migrations,
                ArtifactKind::Controllers
            ]
        );
        assert!(parse_only("models,nonsense").is_err());
    }

    #[test]
    fn migration_timestamps_are_ordered_and_suffixed() {
        let manifest = Manifest::default();
        let stamp = migration_timestamp(&manifest);
        assert_eq!(stamp.len(), "2026_01_01_000000".len() + 2);
        assert!(stamp.ends_with("10"));
    }
}

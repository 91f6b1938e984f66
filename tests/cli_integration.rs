//! CLI-level tests spawning the built binary.
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;

fn aigen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aigen"))
}

fn write_schema(dir: &Path, value: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("schema.json");
    fs::write(&path, serde_json::to_string(value).expect("serialize")).expect("write");
    path
}

fn valid_schema() -> serde_json::Value {
    json!({
        "meta": {"project": "Demo"},
        "models": {
            "Item": {
                "fields": {"name": "string|required"},
                "routes": ["list", "show"]
            }
        }
    })
}

#[test]
fn validate_accepts_a_valid_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path(), &valid_schema());

    let output = aigen()
        .arg("validate")
        .arg(&schema)
        .output()
        .expect("run validate");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Schema is valid"));
    assert!(stdout.contains("Item"));
}

#[test]
fn validate_rejects_broken_schemas_with_exit_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(
        dir.path(),
        &json!({
            "meta": {},
            "models": {
                "Orphan": {
                    "fields": {"ref_id": "foreign:nowhere"}
                }
            }
        }),
    );

    let output = aigen()
        .arg("validate")
        .arg(&schema)
        .output()
        .expect("run validate");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nowhere"));
}

#[test]
fn invalid_json_fails_with_the_parser_diagnostic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("schema.json");
    fs::write(&path, "{\"meta\": ").expect("write");

    let output = aigen()
        .arg("validate")
        .arg(&path)
        .output()
        .expect("run validate");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid schema JSON"));
}

#[test]
fn generate_then_status_reports_tracked_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path(), &valid_schema());

    let output = aigen()
        .arg("generate")
        .arg(&schema)
        .arg("--project-root")
        .arg(dir.path())
        .output()
        .expect("run generate");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = aigen()
        .arg("status")
        .arg("--project-root")
        .arg(dir.path())
        .arg("--json")
        .output()
        .expect("run status");
    assert!(output.status.success());
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status JSON");
    assert_eq!(summary["manifest_present"], json!(true));
    assert!(summary["total_file_count"].as_u64().unwrap() > 0);
    assert_eq!(summary["history"].as_array().unwrap().len(), 1);
}

#[test]
fn preview_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path(), &valid_schema());

    let output = aigen()
        .arg("generate")
        .arg(&schema)
        .arg("--project-root")
        .arg(dir.path())
        .arg("--preview")
        .output()
        .expect("run preview");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("app/Models/Item.php"));
    assert!(!dir.path().join("app").exists());
    assert!(!dir.path().join(".ai-native-manifest.json").exists());
}

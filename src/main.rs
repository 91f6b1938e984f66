use ai_native_gen::cli::{Command, GenerateArgs, RootArgs, StatusArgs, ValidateArgs};
use ai_native_gen::workflow::{
    parse_only, run_generate, run_status, run_validate, GenerateOptions, RunOutcome,
};
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(verbose(&args.command));

    match args.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Status(args) => cmd_status(args),
    }
}

fn verbose(command: &Command) -> bool {
    match command {
        Command::Generate(args) => args.verbose,
        Command::Validate(args) => args.verbose,
        Command::Status(_) => false,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_generate(args: GenerateArgs) -> Result<ExitCode> {
    let only = args.only.as_deref().map(parse_only).transpose()?;
    let options = GenerateOptions {
        schema_path: args.schema,
        project_root: args.project_root,
        merge: args.merge,
        preview: args.preview,
        dry_run: args.dry_run,
        only,
    };

    match run_generate(&options)? {
        RunOutcome::ValidationFailed(errors) => {
            eprintln!("Schema validation failed:");
            for error in errors {
                eprintln!("  - {error}");
            }
            Ok(ExitCode::FAILURE)
        }
        RunOutcome::Unchanged => {
            println!("Schema unchanged since last generation; nothing to do.");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Preview(preview) => {
            for warning in &preview.warnings {
                eprintln!("{warning}");
            }
            if !preview.cleanup.is_empty() {
                println!("Files that would be deleted:");
                for path in &preview.cleanup {
                    println!("  - {path}");
                }
            }
            println!("Files that would be created or updated:");
            for path in &preview.creates {
                println!("  + {path}");
            }
            println!("  ~ .ai-native-manifest.json");
            println!("  + .ai-native/history/<timestamp>_<hash>.json");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Completed(report) => {
            for warning in &report.warnings {
                eprintln!("{warning}");
            }
            for path in &report.deleted {
                println!("  deleted: {path}");
            }
            for path in &report.written {
                println!("  wrote:   {path}");
            }
            for path in &report.skipped {
                println!("  skipped: {path}");
            }
            if report.success() {
                println!("Generation completed successfully.");
                Ok(ExitCode::SUCCESS)
            } else {
                for failure in &report.failures {
                    eprintln!("I/O failure: {failure}");
                }
                eprintln!("Generation finished with {} failure(s).", report.failures.len());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn cmd_validate(args: ValidateArgs) -> Result<ExitCode> {
    let (schema, issues) = run_validate(&args.schema)?;
    let (errors, warnings): (Vec<_>, Vec<_>) =
        issues.into_iter().partition(|issue| issue.is_error());

    for warning in &warnings {
        eprintln!("{warning}");
    }

    if errors.is_empty() {
        println!("Schema is valid.");
        println!("Project: {}", schema.project);
        println!("Version: {}", schema.version);
        println!(
            "Models: {} ({})",
            schema.entities.len(),
            schema
                .entities
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
        if schema.auth_enabled() {
            println!("Authentication: enabled ({})", schema.auth.provider);
        } else {
            println!("Authentication: disabled");
        }
        if !schema.pivots.is_empty() {
            println!(
                "Pivot tables: {} ({})",
                schema.pivots.len(),
                schema.pivots.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        if !schema.custom_routes.is_empty() {
            println!("Custom routes: {}", schema.custom_routes.len());
        }
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Schema validation failed:");
        for error in errors {
            eprintln!("  - {error}");
        }
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_status(args: StatusArgs) -> Result<ExitCode> {
    let summary = run_status(&args.project_root)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(ExitCode::SUCCESS);
    }

    if !summary.manifest_present {
        println!("No manifest found; nothing has been generated yet.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("Generated at: {}", summary.generated_at.as_deref().unwrap_or("-"));
    println!(
        "Schema hash:  {}",
        summary.schema_hash.as_deref().unwrap_or("-")
    );
    println!("Tracked files: {}", summary.total_file_count);
    for (kind, count) in &summary.files_by_kind {
        println!("  {kind}: {count}");
    }
    if !summary.history.is_empty() {
        println!("History ({} entries):", summary.history.len());
        for entry in &summary.history {
            println!("  {entry}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

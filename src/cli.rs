//! CLI argument parsing for the generator.
//!
//! The CLI is intentionally thin: it resolves flags into workflow inputs
//! and maps run outcomes to exit codes, without embedding policy.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "aigen",
    version,
    about = "Generate Laravel components from a JSON schema",
    after_help = "Examples:\n  aigen validate schema.json\n  aigen generate schema.json --preview\n  aigen generate schema.json --only models,migrations\n  aigen status --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Generate(GenerateArgs),
    Validate(ValidateArgs),
    Status(StatusArgs),
}

/// Generate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Generate components and reconcile the manifest")]
pub struct GenerateArgs {
    /// Path to the JSON schema file
    pub schema: PathBuf,

    /// Project root receiving generated files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Clean previous generation and regenerate (default)
    #[arg(long, conflicts_with_all = ["merge", "preview"])]
    pub clean: bool,

    /// Merge with existing files instead of overwriting
    #[arg(long)]
    pub merge: bool,

    /// Show what would be generated/cleaned without writing
    #[arg(long)]
    pub preview: bool,

    /// Alias for --preview
    #[arg(long)]
    pub dry_run: bool,

    /// Generate only specific components (comma-separated kinds)
    #[arg(long, value_name = "KINDS")]
    pub only: Option<String>,

    /// Emit a verbose transcript of the run
    #[arg(long)]
    pub verbose: bool,
}

/// Validate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Validate a JSON schema file")]
pub struct ValidateArgs {
    /// Path to the JSON schema file
    pub schema: PathBuf,

    /// Emit a verbose transcript of the run
    #[arg(long)]
    pub verbose: bool,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize manifest state and history")]
pub struct StatusArgs {
    /// Project root containing the manifest
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

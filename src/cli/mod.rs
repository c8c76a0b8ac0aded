//! Command-line parsing for the emissions engine.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! engine; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Period, SchemaKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "emx", version, about = "Validate and summarize facility emissions data")]
pub struct Cli {
    /// Column preset (overrides EMX_SCHEMA).
    #[arg(long, value_enum, global = true)]
    pub schema: Option<SchemaKind>,

    /// Log filter, e.g. `debug` (overrides EMX_LOG / RUST_LOG).
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process the bundled sample upload and print the report (default).
    Demo(OutputArgs),
    /// Validate and summarize a CSV file.
    Process(ProcessArgs),
    /// Run a CSV file through the upload endpoint handler and print the response.
    Upload(UploadArgs),
    /// Upload a CSV file, then query one facility through the facility endpoint handler.
    Facility(FacilityArgs),
    /// Run the engine against fixed inputs and check the results.
    Selftest,
}

/// Output options shared by `demo` and `process`.
#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Print the report as JSON instead of the text summary.
    #[arg(long)]
    pub json: bool,

    /// Export per-facility metrics to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the full report to a JSON file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// CSV file to process.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// CSV file to upload.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Maximum accepted upload size in bytes (overrides EMX_MAX_UPLOAD_BYTES).
    #[arg(long)]
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Args)]
pub struct FacilityArgs {
    /// Facility identifier to query.
    pub facility_id: String,

    /// CSV file to upload before querying.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// First period to include (YYYY, YYYY-MM or a date).
    #[arg(long)]
    pub start: Option<Period>,

    /// Last period to include.
    #[arg(long)]
    pub end: Option<Period>,

    /// Print the facility as a text block instead of the JSON response.
    #[arg(long)]
    pub text: bool,
}

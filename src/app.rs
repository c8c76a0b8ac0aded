//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads settings
//! - initializes logging
//! - runs the engine (directly or through the REST handlers)
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::{self, ApiResponse, FacilityQuery, MemoryStore, UploadLimits};
use crate::cli::{Cli, Command, FacilityArgs, OutputArgs, ProcessArgs, UploadArgs};
use crate::config::Settings;
use crate::error::AppError;

pub mod pipeline;
pub mod selftest;

/// Entry point for the `emx` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(schema) = cli.schema {
        settings.schema = schema;
    }
    if let Some(filter) = cli.log {
        settings.log_filter = filter;
    }
    init_logging(&settings.log_filter)?;

    match cli.command.unwrap_or(Command::Demo(OutputArgs::default())) {
        Command::Demo(args) => handle_demo(&args, &settings),
        Command::Process(args) => handle_process(&args, &settings),
        Command::Upload(args) => handle_upload(&args, &settings),
        Command::Facility(args) => handle_facility(&args, &settings),
        Command::Selftest => selftest::run(),
    }
}

fn init_logging(filter: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| AppError::new(2, format!("Invalid log filter '{filter}': {e}")))?;
    // Logs go to stderr so JSON on stdout stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn handle_demo(args: &OutputArgs, settings: &Settings) -> Result<(), AppError> {
    let run = pipeline::run_sample(settings.schema)?;
    emit(&run, args)
}

fn handle_process(args: &ProcessArgs, settings: &Settings) -> Result<(), AppError> {
    let run = pipeline::run_file(&args.csv, settings.schema)?;
    emit(&run, &args.output)
}

fn emit(run: &pipeline::RunOutput, args: &OutputArgs) -> Result<(), AppError> {
    if args.json {
        let json = serde_json::to_string_pretty(&run.report)
            .map_err(|e| AppError::new(4, format!("Failed to serialize report: {e}")))?;
        println!("{json}");
    } else {
        println!("Source: {}", run.source);
        println!("{}", crate::report::format_report(&run.report));
    }

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_facilities_csv(path, &run.report)?;
    }
    if let Some(path) = &args.report {
        crate::io::export::write_report_json(path, &run.report)?;
    }

    Ok(())
}

fn handle_upload(args: &UploadArgs, settings: &Settings) -> Result<(), AppError> {
    let limits = UploadLimits {
        max_bytes: args.max_bytes.unwrap_or(settings.limits.max_bytes),
    };
    let body = read_body(&args.csv)?;

    let mut store = MemoryStore::default();
    let response = api::upload(&mut store, &body, settings.schema, &limits);
    print_response("POST", api::UPLOAD_ROUTE, &response)
}

fn handle_facility(args: &FacilityArgs, settings: &Settings) -> Result<(), AppError> {
    let body = read_body(&args.csv)?;

    let mut store = MemoryStore::default();
    let uploaded = api::upload(&mut store, &body, settings.schema, &settings.limits);
    if !uploaded.is_success() {
        return print_response("POST", api::UPLOAD_ROUTE, &uploaded);
    }

    let query = FacilityQuery {
        start: args.start,
        end: args.end,
        ..FacilityQuery::default()
    };
    if args.text {
        return match api::query_facility(&store, &args.facility_id, &query) {
            Ok(facility) => {
                println!("{}", crate::report::format_facility(&facility));
                Ok(())
            }
            Err(err) => Err(AppError::new(exit_code_for_status(err.status()), err.to_string())),
        };
    }

    let route = api::FACILITY_ROUTE.replace("{facility_id}", &args.facility_id);
    let response = api::facility_emissions(&store, &args.facility_id, &query);
    print_response("GET", &route, &response)
}

fn read_body(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))
}

fn print_response(method: &str, route: &str, response: &ApiResponse) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(&response.body)
        .map_err(|e| AppError::new(4, format!("Failed to serialize response: {e}")))?;
    println!("{method} {route} -> {}", response.status);
    println!("{body}");

    if response.is_success() {
        return Ok(());
    }
    Err(AppError::new(
        exit_code_for_status(response.status),
        format!("{method} {route} failed with status {}", response.status),
    ))
}

/// 400 means the input itself was bad; 404/413 are caller problems.
fn exit_code_for_status(status: u16) -> u8 {
    match status {
        400 => 3,
        404 | 413 => 2,
        _ => 4,
    }
}

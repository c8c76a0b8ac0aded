//! `emissions-engine` library crate.
//!
//! The binary (`emx`) is a thin wrapper around this library so that:
//!
//! - the engine is testable without spawning processes
//! - the REST handlers can be mounted by any HTTP server
//! - the CLI only deals with arguments and printing

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod report;

pub use domain::{FacilityMetrics, Report, Schema, SchemaKind, ValidationIssue};
pub use engine::{process, process_csv};
pub use error::{AppError, MalformedInputError};
pub use io::RawTable;

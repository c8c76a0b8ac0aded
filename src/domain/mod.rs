//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - the column configuration (`Schema`, `SchemaKind`, `PeriodColumns`)
//! - reporting periods (`Period`)
//! - typed records and validation issues (`EmissionRecord`, `ValidationIssue`)
//! - computed outputs (`Metrics`, `FacilityMetrics`, `Report`)

pub mod period;
pub mod schema;
pub mod types;

pub use period::*;
pub use schema::*;
pub use types::*;

//! Input/output helpers.
//!
//! - raw table parsing from CSV/JSON (`table`)
//! - report exports (CSV/JSON) (`export`)

pub mod export;
pub mod table;

pub use export::*;
pub use table::*;

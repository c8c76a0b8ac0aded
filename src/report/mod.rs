//! Terminal rendering of engine reports.

pub mod format;

pub use format::*;

//! Bundled data used by the demo and self-test commands.

pub mod sample;

pub use sample::*;

//! Schema module - Configuration and run statistics for painter runs.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;

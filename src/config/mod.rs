//! Configuration for the scan pipeline.

pub mod constants;
mod types;

pub use constants::*;
pub use types::{LogFormat, LogLevel, ScanConfig};

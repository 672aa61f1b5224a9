//! Error taxonomy and recovery policy for the scan pipeline.

mod types;

pub use types::{InitializationError, ScanError};

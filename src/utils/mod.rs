//! Utility functions shared across the crate
//!
//! Arrow column extraction, atomic file writes, and logging/progress helpers.

pub mod arrow_utils;
pub mod io;
pub mod logging;

pub use io::write_atomic;
pub use logging::{log_operation_complete, log_operation_start, log_warning};

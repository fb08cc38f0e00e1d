//! Utility functions for error handling
//!
//! Helpers that open and read files while attaching the path and the reason the
//! file was needed to any error.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Result, TriageError};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(
            TriageError::io_error(format!("File not found, needed for: {purpose}")).with_path(path),
        );
    }

    if !path.is_file() {
        return Err(
            TriageError::io_error(format!("Path is not a file, expected a file for: {purpose}"))
                .with_path(path),
        );
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "Permission denied - check file permissions".to_string()
            }
            io::ErrorKind::NotFound => {
                "File not found - it may have been deleted during operation".to_string()
            }
            _ => format!("Failed to open file for: {purpose}"),
        };
        TriageError::io_error_with_source(context, e).with_path(path)
    })
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    match io::Read::read_to_string(&mut file, &mut content) {
        Ok(_) => Ok(content),
        Err(e) => {
            let context = match e.kind() {
                io::ErrorKind::InvalidData => {
                    "File contains invalid UTF-8 data - cannot read as text".to_string()
                }
                _ => format!("Failed to read file content for: {purpose}"),
            };
            Err(TriageError::io_error_with_source(context, e).with_path(path))
        }
    }
}

/// Turn a missing or unreadable artifact into a configuration error.
///
/// Inference and evaluation must fail fast when the trained artifacts are absent,
/// so IO failures on those paths are reported as configuration problems.
pub fn require_artifact<T>(result: Result<T>, artifact: &str, path: &Path) -> Result<T> {
    result.map_err(|e| match e {
        TriageError::ConfigurationError(_) => e,
        other => TriageError::configuration(format!(
            "{artifact} at {} is missing or unreadable: {other}",
            path.display()
        )),
    })
}

//! IO utilities for artifact files
//!
//! Artifacts are replaced wholesale: the new content is written to a temporary
//! sibling file and renamed over the target, so a concurrent reader sees either
//! the old file or the new one, never a partial write.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, TriageError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(
        ".{file_name}.{}.{unique}.tmp",
        std::process::id()
    ))
}

/// Write a file atomically
///
/// # Arguments
/// * `path` - Final location of the file
/// * `write` - Callback producing the file content
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            TriageError::io_error_with_source("Failed to create artifact directory", e)
                .with_path(parent)
        })?;
    }

    let temp_path = temp_sibling(path);
    let result = (|| {
        let file = File::create(&temp_path).map_err(|e| {
            TriageError::io_error_with_source("Failed to create temporary file", e)
                .with_path(&temp_path)
        })?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| TriageError::io_error(format!("Failed to flush file: {e}")))?;
        file.sync_all()?;
        fs::rename(&temp_path, path).map_err(|e| {
            TriageError::io_error_with_source("Failed to move file into place", e).with_path(path)
        })
    })();

    if result.is_err() {
        // Best effort: the temporary file may not exist
        let _ = fs::remove_file(&temp_path);
    }
    result
}

//! Column name normalization and artifact-column detection.
//!
//! Dataset revisions exported from different tools disagree on case, spacing and
//! punctuation in symptom headers (`"Skin Rash"`, `"skin_rash "`, `"skin__rash."`).
//! Normalizing them gives a stable schema across exports.

use arrow::datatypes::Schema;
use rustc_hash::FxHashSet;

use crate::error::{Result, TriageError};

/// Normalize a raw column header
///
/// Trims, lower-cases, turns whitespace and `-` into `_`, removes all other
/// punctuation, collapses runs of `_` and strips leading/trailing `_`.
#[must_use]
pub fn normalize_column_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut last_was_separator = false;

    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            normalized.push(ch);
            last_was_separator = false;
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            if !last_was_separator {
                normalized.push('_');
                last_was_separator = true;
            }
        }
    }

    normalized.trim_matches('_').to_string()
}

/// Whether a normalized column name is an export artifact rather than a symptom
///
/// Placeholder index columns (`unnamed...`, empty headers) and names ending in
/// a digit run (duplicate-disambiguation suffixes such as `fluid_overload1`)
/// are artifacts.
#[must_use]
pub fn is_artifact_column(name: &str) -> bool {
    name.is_empty()
        || name.starts_with("unnamed")
        || name.chars().last().is_some_and(|c| c.is_ascii_digit())
}

/// Which batch columns feed the dataset, and under which names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    /// (batch column index, normalized name) of every kept feature column
    pub features: Vec<(usize, String)>,
    /// Batch column index of the disease label
    pub label: usize,
    /// Raw names of the columns that were dropped
    pub dropped: Vec<String>,
}

impl ColumnPlan {
    /// Normalized feature names in column order
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|(_, name)| name.clone()).collect()
    }
}

/// Decide which columns of `schema` are features and which one is the label
///
/// # Arguments
/// * `schema` - Schema of the loaded batches
/// * `label_column` - Label column name, compared after normalization
pub fn plan_columns(schema: &Schema, label_column: &str) -> Result<ColumnPlan> {
    let label_name = normalize_column_name(label_column);
    let mut label = None;
    let mut features = Vec::new();
    let mut dropped = Vec::new();
    let mut seen = FxHashSet::default();

    for (idx, field) in schema.fields().iter().enumerate() {
        let raw = field.name();
        let name = normalize_column_name(raw);

        if name == label_name {
            if label.is_none() {
                label = Some(idx);
            } else {
                dropped.push(raw.clone());
            }
            continue;
        }

        if is_artifact_column(&name) {
            log::debug!("Dropping artifact column '{raw}'");
            dropped.push(raw.clone());
            continue;
        }

        if !seen.insert(name.clone()) {
            log::warn!("Column '{raw}' normalizes to duplicate name '{name}', dropping it");
            dropped.push(raw.clone());
            continue;
        }

        features.push((idx, name));
    }

    let label = label.ok_or_else(|| {
        TriageError::data(format!("Dataset has no '{label_column}' label column"))
    })?;

    if !dropped.is_empty() {
        log::info!("Dropped {} non-symptom columns", dropped.len());
    }

    Ok(ColumnPlan {
        features,
        label,
        dropped,
    })
}

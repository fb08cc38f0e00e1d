//! Labeled symptom datasets and class balancing.
//!
//! A [`LabeledDataset`] is the validated, column-normalized form of a training or
//! test table: one 0/1 flag per symptom column plus the disease label of each row.

pub mod balance;
pub mod columns;

use std::path::Path;

use arrow::record_batch::RecordBatch;

pub use balance::{BalancedDataset, TrainingRecord, build_balanced_dataset};
pub use columns::{ColumnPlan, is_artifact_column, normalize_column_name, plan_columns};

use crate::error::{Result, TriageError};
use crate::reader::read_table;
use crate::schema::{FeatureVector, SymptomSchema};
use crate::utils::arrow_utils::{binary_flags, string_values};

/// One labeled row: symptom flags in dataset column order and the disease label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRow {
    /// Flags aligned to [`LabeledDataset::feature_names`]
    pub features: Vec<u8>,
    /// Disease label as found in the data (trimmed)
    pub disease: String,
}

/// Validated labeled table with normalized feature column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledDataset {
    feature_names: Vec<String>,
    rows: Vec<LabeledRow>,
}

impl LabeledDataset {
    /// Create a dataset from already-normalized parts
    pub fn new(feature_names: Vec<String>, rows: Vec<LabeledRow>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.features.len() != feature_names.len())
        {
            return Err(TriageError::data(format!(
                "Row {idx} has {} features, expected {}",
                row.features.len(),
                feature_names.len()
            )));
        }
        if let Some(idx) = rows
            .iter()
            .position(|row| row.features.iter().any(|&v| v > 1))
        {
            return Err(TriageError::data(format!(
                "Row {idx} holds a feature value other than 0 or 1"
            )));
        }
        Ok(Self {
            feature_names,
            rows,
        })
    }

    /// Load a CSV or Parquet table
    pub fn load(path: &Path, label_column: &str) -> Result<Self> {
        let batches = read_table(path, "labeled symptom data")?;
        Self::from_batches(&batches, label_column)
    }

    /// Build from record batches: normalize headers, drop artifact columns,
    /// and validate every feature cell and label
    pub fn from_batches(batches: &[RecordBatch], label_column: &str) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(TriageError::data("Dataset contains no record batches"));
        };
        let schema = first.schema();
        let plan = plan_columns(&schema, label_column)?;
        let feature_names = plan.feature_names();
        let mut rows = Vec::new();

        for batch in batches {
            if batch.schema().fields() != schema.fields() {
                return Err(TriageError::data(
                    "Record batches in one dataset have differing schemas",
                ));
            }

            let label_name = schema.field(plan.label).name();
            let labels = string_values(batch.column(plan.label), label_name)?;

            let columns = plan
                .features
                .iter()
                .map(|(idx, name)| binary_flags(batch.column(*idx), name))
                .collect::<Result<Vec<_>>>()?;

            for (row_idx, label) in labels.into_iter().enumerate() {
                let disease = label
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| {
                        TriageError::data(format!(
                            "Row {} has an empty '{label_name}' label",
                            rows.len()
                        ))
                    })?;
                let features = columns.iter().map(|column| column[row_idx]).collect();
                rows.push(LabeledRow { features, disease });
            }
        }

        log::info!(
            "Loaded {} labeled rows with {} symptom columns",
            rows.len(),
            feature_names.len()
        );

        Ok(Self {
            feature_names,
            rows,
        })
    }

    /// Normalized feature names in column order
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Rows in load order
    #[must_use]
    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature vectors of every row aligned to `schema`
    ///
    /// Columns the schema does not know are dropped and schema symptoms missing
    /// from this dataset are zero-filled.
    #[must_use]
    pub fn reindex(&self, schema: &SymptomSchema) -> Vec<FeatureVector> {
        self.rows
            .iter()
            .map(|row| schema.reindex(&self.feature_names, &row.features))
            .collect()
    }
}

//! Offline accuracy measurement on held-out data
//!
//! Ground truth is compared at category granularity: each held-out disease is
//! resolved through the category map, and the classifier's prediction for the
//! row's symptoms is compared with that category.

pub mod metrics;

use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

pub use metrics::{AverageMetrics, ClassMetrics, ClassificationReport, ConfusionMatrix};

use crate::category::DiseaseCategoryMap;
use crate::config::TriageConfig;
use crate::dataset::LabeledDataset;
use crate::error::{Result, TriageError};
use crate::model::{ArtifactStore, TrainedArtifacts};

/// Result of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Rows evaluated
    pub rows: usize,
    /// Fraction of rows whose predicted category matched
    pub accuracy: f64,
    /// Per-category metrics
    pub report: ClassificationReport,
    /// True vs predicted category counts
    pub confusion: ConfusionMatrix,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows evaluated: {}", self.rows)?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f)?;
        writeln!(f, "Classification report:")?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "Confusion matrix (rows: true, columns: predicted):")?;
        write!(f, "{}", self.confusion)
    }
}

/// Evaluate trained artifacts against a labeled dataset
///
/// Columns are reindexed to the persisted schema: symptoms the schema lacks are
/// dropped and schema symptoms the dataset lacks are zero.
///
/// # Errors
/// `DataError` when the dataset has no rows.
pub fn evaluate(
    dataset: &LabeledDataset,
    category_map: &DiseaseCategoryMap,
    artifacts: &TrainedArtifacts,
) -> Result<EvaluationReport> {
    if dataset.is_empty() {
        return Err(TriageError::data("Evaluation dataset has no rows"));
    }
    let start = Instant::now();

    let missing = artifacts
        .schema
        .iter()
        .filter(|s| !dataset.feature_names().iter().any(|f| f == s))
        .count();
    if missing > 0 {
        log::warn!(
            "{missing} schema symptom(s) are absent from the evaluation data and read as 0"
        );
    }

    let vectors = dataset.reindex(&artifacts.schema);
    let predicted: Vec<String> = vectors
        .par_iter()
        .map(|v| {
            let aligned = v.reindex(&artifacts.schema, artifacts.model.schema());
            artifacts.model.predict(&aligned)
        })
        .collect();
    let truth: Vec<String> = dataset
        .rows()
        .iter()
        .map(|row| category_map.resolve(&row.disease).to_string())
        .collect();

    let confusion = ConfusionMatrix::from_labels(&truth, &predicted);
    let report = confusion.report();
    log::info!(
        "Evaluated {} rows in {:?}: accuracy {:.4}",
        dataset.len(),
        start.elapsed(),
        report.accuracy
    );

    Ok(EvaluationReport {
        rows: dataset.len(),
        accuracy: report.accuracy,
        report,
        confusion,
    })
}

/// Load artifacts, category map and held-out data named by a configuration, then evaluate
pub fn evaluate_from_config(config: &TriageConfig) -> Result<EvaluationReport> {
    let artifacts = ArtifactStore::from_config(config).load()?;
    let category_map = DiseaseCategoryMap::load(&config.category_map)?;
    let dataset = LabeledDataset::load(&config.testing_data, &config.label_column)?;
    evaluate(&dataset, &category_map, &artifacts)
}

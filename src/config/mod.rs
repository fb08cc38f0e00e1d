//! Configuration for training, inference and evaluation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::util::safe_read_to_string;
use crate::error::{Result, TriageError};

/// File name of the persisted symptom schema inside the artifact directory
pub const SCHEMA_FILE_NAME: &str = "symptoms.txt";

/// File name of the persisted model inside the artifact directory
pub const MODEL_FILE_NAME: &str = "model.json";

/// Predictions below this confidence (in percent) carry an advisory
pub const DEFAULT_ADVISORY_THRESHOLD: f64 = 55.0;

/// Hyperparameters for the random forest classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum number of distinct rows in each leaf
    pub min_samples_leaf: usize,
    /// Candidate features per split. `None` means the square root of the feature count.
    pub max_features: Option<usize>,
    /// Weight classes inversely to their frequency
    pub balanced_class_weight: bool,
    /// Worker threads for tree construction. `None` uses every available CPU.
    pub n_jobs: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 18,
            min_samples_leaf: 3,
            max_features: None,
            balanced_class_weight: true,
            n_jobs: None,
        }
    }
}

impl ForestConfig {
    /// Number of worker threads to use
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.n_jobs.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }

    /// Number of candidate features per split for a given feature count
    #[must_use]
    pub fn features_per_split(&self, n_features: usize) -> usize {
        let default = (n_features as f64).sqrt().floor() as usize;
        self.max_features
            .unwrap_or(default)
            .clamp(1, n_features.max(1))
    }

    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(TriageError::configuration(
                "forest.n_estimators must be at least 1",
            ));
        }
        if self.max_depth == 0 {
            return Err(TriageError::configuration(
                "forest.max_depth must be at least 1",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(TriageError::configuration(
                "forest.min_samples_leaf must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Configuration for the triage engine and its offline jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Labeled training dataset (CSV or Parquet)
    pub training_data: PathBuf,
    /// Held-out labeled dataset used by evaluation
    pub testing_data: PathBuf,
    /// Two-column disease/category table
    pub category_map: PathBuf,
    /// Directory holding the persisted schema and model
    pub artifact_dir: PathBuf,
    /// Optional JSON file replacing the built-in specialists, aliases and override rules
    pub reference_data: Option<PathBuf>,
    /// Name of the disease label column (matched after column normalization)
    pub label_column: String,
    /// Seed for sampling, shuffling and tree construction
    pub seed: u64,
    /// Confidence (percent) below which an advisory is attached
    pub advisory_threshold: f64,
    /// Upper bound for a single classifier call in the async path
    pub inference_timeout_ms: u64,
    /// Classifier hyperparameters
    pub forest: ForestConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            training_data: PathBuf::from("Dataset/Training.csv"),
            testing_data: PathBuf::from("Dataset/Testing.csv"),
            category_map: PathBuf::from("Dataset/disease_category_map.csv"),
            artifact_dir: PathBuf::from("artifacts"),
            reference_data: None,
            label_column: "prognosis".to_string(),
            seed: 42,
            advisory_threshold: DEFAULT_ADVISORY_THRESHOLD,
            inference_timeout_ms: 30_000,
            forest: ForestConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "triage configuration")?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            TriageError::configuration(format!(
                "Invalid configuration file {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    ///
    /// Recognised keys: `TRIAGE_DATA_DIR`, `TRIAGE_ARTIFACT_DIR`, `TRIAGE_SEED`,
    /// `TRIAGE_TIMEOUT_MS`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("TRIAGE_DATA_DIR") {
            let dir = PathBuf::from(dir);
            self.training_data = dir.join(file_name_or(&self.training_data, "Training.csv"));
            self.testing_data = dir.join(file_name_or(&self.testing_data, "Testing.csv"));
            self.category_map =
                dir.join(file_name_or(&self.category_map, "disease_category_map.csv"));
        }
        if let Some(dir) = lookup("TRIAGE_ARTIFACT_DIR") {
            self.artifact_dir = PathBuf::from(dir);
        }
        if let Some(seed) = lookup("TRIAGE_SEED") {
            self.seed = seed.trim().parse().map_err(|_| {
                TriageError::configuration(format!("TRIAGE_SEED is not an integer: {seed}"))
            })?;
        }
        if let Some(timeout) = lookup("TRIAGE_TIMEOUT_MS") {
            self.inference_timeout_ms = timeout.trim().parse().map_err(|_| {
                TriageError::configuration(format!(
                    "TRIAGE_TIMEOUT_MS is not an integer: {timeout}"
                ))
            })?;
        }
        Ok(self)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.label_column.trim().is_empty() {
            return Err(TriageError::configuration("label_column must not be empty"));
        }
        if !(0.0..=100.0).contains(&self.advisory_threshold) {
            return Err(TriageError::configuration(format!(
                "advisory_threshold must be a percentage, got {}",
                self.advisory_threshold
            )));
        }
        self.forest.validate()
    }

    /// Path of the persisted symptom schema
    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        self.artifact_dir.join(SCHEMA_FILE_NAME)
    }

    /// Path of the persisted model artifact
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(MODEL_FILE_NAME)
    }

    /// Timeout for one classifier call
    #[must_use]
    pub const fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

fn file_name_or(path: &Path, fallback: &str) -> PathBuf {
    path.file_name()
        .map_or_else(|| PathBuf::from(fallback), PathBuf::from)
}

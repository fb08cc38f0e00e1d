//! Random forest category classifier
//!
//! The model is trained once per run on the balanced training set and replaced
//! wholesale on retraining. It stores the symptom schema it was trained on so
//! that vectors built against any other column order can be reindexed first.

pub mod store;
pub mod tree;

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub use store::{ArtifactStore, TrainedArtifacts};
pub use tree::{DecisionTree, TreeParams, WeightedSample};

use crate::config::ForestConfig;
use crate::error::{Result, TriageError};
use crate::schema::{FeatureVector, SymptomSchema};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

/// Version of the persisted model layout
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Information recorded about a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// When training finished
    pub trained_at: DateTime<Utc>,
    /// Seed used for bootstrapping and feature sampling
    pub seed: u64,
    /// Hyperparameters used
    pub forest: ForestConfig,
    /// Number of training rows
    pub training_rows: usize,
    /// Training rows per category
    pub category_counts: BTreeMap<String, usize>,
}

/// Class probabilities for one prediction, keyed by category label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbabilities {
    probabilities: BTreeMap<String, f64>,
}

impl ClassProbabilities {
    /// Probability of a category (0 for unknown labels)
    #[must_use]
    pub fn get(&self, category: &str) -> f64 {
        self.probabilities.get(category).copied().unwrap_or(0.0)
    }

    /// Iterate (category, probability) in lexicographic label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probabilities.iter().map(|(c, p)| (c.as_str(), *p))
    }

    /// Most probable category and its probability
    ///
    /// Ties go to the lexicographically smallest label, so the choice does not
    /// depend on the order labels happened to have during training.
    #[must_use]
    pub fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (category, probability) in self.iter() {
            if best.is_none_or(|(_, current)| probability > current) {
                best = Some((category, probability));
            }
        }
        best
    }

    /// Sum of all probabilities
    #[must_use]
    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }
}

/// Trained random forest over a symptom schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    format_version: u32,
    labels: Vec<String>,
    schema: SymptomSchema,
    trees: Vec<DecisionTree>,
    metadata: ModelMetadata,
}

impl Model {
    /// Train a forest
    ///
    /// # Arguments
    /// * `schema` - Schema every vector in `features` is aligned to
    /// * `features` - Training vectors
    /// * `categories` - Category label of every vector
    /// * `config` - Forest hyperparameters
    /// * `seed` - Base seed; tree `i` uses `seed + i`
    pub fn train(
        schema: &SymptomSchema,
        features: &[FeatureVector],
        categories: &[String],
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self> {
        if features.is_empty() {
            return Err(TriageError::data("Cannot train on an empty dataset"));
        }
        if features.len() != categories.len() {
            return Err(TriageError::data(format!(
                "{} feature rows but {} labels",
                features.len(),
                categories.len()
            )));
        }
        if let Some(idx) = features.iter().position(|f| f.len() != schema.len()) {
            return Err(TriageError::data(format!(
                "Training row {idx} has {} features, schema has {}",
                features[idx].len(),
                schema.len()
            )));
        }

        let mut labels: Vec<String> = categories.to_vec();
        labels.sort();
        labels.dedup();
        let label_index: FxHashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let targets: Vec<usize> = categories
            .iter()
            .map(|c| label_index[c.as_str()])
            .collect();

        let class_weights = class_weights(&targets, labels.len(), config.balanced_class_weight);
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.features_per_split(schema.len()),
        };

        log::info!(
            "Training {} trees on {} rows, {} symptoms, {} categories ({} workers)",
            config.n_estimators,
            features.len(),
            schema.len(),
            labels.len(),
            config.worker_count()
        );

        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .build()
            .map_err(|e| TriageError::configuration(format!("Cannot start worker pool: {e}")))?;
        let pb = create_main_progress_bar(config.n_estimators as u64, Some("Growing trees"));

        let trees: Vec<DecisionTree> = pool.install(|| {
            (0..config.n_estimators)
                .into_par_iter()
                .map(|i| {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                    let samples = bootstrap(&targets, &class_weights, &mut rng);
                    let tree = DecisionTree::fit(
                        features,
                        &targets,
                        labels.len(),
                        samples,
                        params,
                        &mut rng,
                    );
                    pb.inc(1);
                    tree
                })
                .collect()
        });

        finish_progress_bar(&pb, Some("Forest trained"));
        log::info!("Trained {} trees in {:?}", trees.len(), start.elapsed());

        let category_counts = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), targets.iter().filter(|&&t| t == i).count()))
            .collect();

        Ok(Self {
            format_version: MODEL_FORMAT_VERSION,
            labels,
            schema: schema.clone(),
            trees,
            metadata: ModelMetadata {
                trained_at: Utc::now(),
                seed,
                forest: config.clone(),
                training_rows: features.len(),
                category_counts,
            },
        })
    }

    /// Category labels in lexicographic order
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Schema the model was trained on
    #[must_use]
    pub fn schema(&self) -> &SymptomSchema {
        &self.schema
    }

    /// Training run information
    #[must_use]
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Number of trees
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Class probabilities for a vector aligned to [`Model::schema`]
    ///
    /// The per-tree leaf distributions are averaged, so the result sums to 1
    /// across [`Model::labels`].
    #[must_use]
    pub fn predict_proba(&self, features: &FeatureVector) -> ClassProbabilities {
        let mut sums = vec![0.0; self.labels.len()];
        for tree in &self.trees {
            for (sum, p) in sums.iter_mut().zip(tree.predict_distribution(features)) {
                *sum += p;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        ClassProbabilities {
            probabilities: self
                .labels
                .iter()
                .cloned()
                .zip(sums.into_iter().map(|s| s / n_trees))
                .collect(),
        }
    }

    /// Class probabilities for a vector aligned to some other schema
    #[must_use]
    pub fn predict_proba_aligned(
        &self,
        features: &FeatureVector,
        schema: &SymptomSchema,
    ) -> ClassProbabilities {
        self.predict_proba(&features.reindex(schema, &self.schema))
    }

    /// Most probable category for a vector aligned to [`Model::schema`]
    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> String {
        self.predict_proba(features)
            .best()
            .map(|(category, _)| category.to_string())
            .unwrap_or_default()
    }

    /// Check a deserialized model before use
    pub(crate) fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(TriageError::configuration(format!(
                "Model format version {} is not supported (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.labels.is_empty() {
            return Err(TriageError::configuration("Model has no category labels"));
        }
        if self.labels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TriageError::configuration(
                "Model category labels are not sorted and unique",
            ));
        }
        if self.trees.is_empty() {
            return Err(TriageError::configuration("Model has no trees"));
        }
        for tree in &self.trees {
            tree.validate(self.schema.len(), self.labels.len())?;
        }
        Ok(())
    }
}

/// Per-class weights; "balanced" gives `n_samples / (n_classes * count)`
fn class_weights(targets: &[usize], n_classes: usize, balanced: bool) -> Vec<f64> {
    if !balanced {
        return vec![1.0; n_classes];
    }
    let mut counts = vec![0usize; n_classes];
    for &t in targets {
        counts[t] += 1;
    }
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                0.0
            } else {
                targets.len() as f64 / (n_classes as f64 * count as f64)
            }
        })
        .collect()
}

/// Draw a bootstrap sample, folding multiplicity and class weight into one weight
fn bootstrap<R>(targets: &[usize], class_weights: &[f64], rng: &mut R) -> Vec<WeightedSample>
where
    R: Rng + ?Sized,
{
    let n = targets.len();
    let mut counts = vec![0u32; n];
    for _ in 0..n {
        counts[rng.random_range(0..n)] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(row, &count)| WeightedSample {
            row,
            weight: f64::from(count) * class_weights[targets[row]],
        })
        .collect()
}

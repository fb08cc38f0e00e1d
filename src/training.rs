//! Offline training job
//!
//! Loads the labeled data and the category table, builds the balanced training
//! set, fits the forest and writes the schema and model. Everything random is
//! driven by the configured seed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::category::DiseaseCategoryMap;
use crate::config::TriageConfig;
use crate::dataset::{LabeledDataset, build_balanced_dataset};
use crate::error::Result;
use crate::model::{ArtifactStore, Model, TrainedArtifacts};
use crate::utils::logging::{create_spinner, finish_progress_bar};

/// What a training run produced
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Rows in the raw training table
    pub source_rows: usize,
    /// Rows in the balanced training set
    pub training_rows: usize,
    /// Per-category size of the balanced set
    pub category_counts: BTreeMap<String, usize>,
    /// The trained schema and model
    pub artifacts: TrainedArtifacts,
    /// Where the schema was written
    pub schema_path: PathBuf,
    /// Where the model was written
    pub model_path: PathBuf,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

/// Balance `dataset` and fit a model on it
///
/// # Errors
/// `DataError` when balancing fails, e.g. a non-General category has no rows.
pub fn train(
    dataset: &LabeledDataset,
    category_map: &DiseaseCategoryMap,
    config: &TriageConfig,
) -> Result<TrainedArtifacts> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let balanced = build_balanced_dataset(dataset, category_map, &mut rng)?;
    log::info!(
        "Balanced training set: {} rows, {} per non-General category",
        balanced.len(),
        balanced.min_count()
    );

    let model = Model::train(
        balanced.schema(),
        &balanced.features(),
        &balanced.categories(),
        &config.forest,
        config.seed,
    )?;
    Ok(TrainedArtifacts {
        schema: balanced.schema().clone(),
        model,
    })
}

/// Run the full job described by `config` and persist the result
pub fn train_from_config(config: &TriageConfig) -> Result<TrainingSummary> {
    let start = Instant::now();

    let spinner = create_spinner(Some("Loading training data"));
    let category_map = DiseaseCategoryMap::load(&config.category_map)?;
    let dataset = LabeledDataset::load(&config.training_data, &config.label_column)?;
    finish_progress_bar(&spinner, Some("Training data loaded"));

    let artifacts = train(&dataset, &category_map, config)?;
    let store = ArtifactStore::from_config(config);
    store.save(&artifacts)?;

    let metadata = artifacts.model.metadata();
    Ok(TrainingSummary {
        source_rows: dataset.len(),
        training_rows: metadata.training_rows,
        category_counts: metadata.category_counts.clone(),
        schema_path: store.schema_path().to_path_buf(),
        model_path: store.model_path().to_path_buf(),
        artifacts,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::dataset::LabeledRow;
    use crate::error::TriageError;

    fn config() -> TriageConfig {
        TriageConfig {
            seed: 3,
            forest: ForestConfig {
                n_estimators: 8,
                min_samples_leaf: 1,
                n_jobs: Some(2),
                ..ForestConfig::default()
            },
            ..TriageConfig::default()
        }
    }

    fn dataset() -> LabeledDataset {
        let mut rows = Vec::new();
        for (disease, features, n) in [
            ("Heart attack", vec![1, 0, 0], 9),
            ("Pneumonia", vec![0, 1, 0], 6),
            ("Malaria", vec![0, 0, 1], 20),
        ] {
            for _ in 0..n {
                rows.push(LabeledRow {
                    features: features.clone(),
                    disease: disease.to_string(),
                });
            }
        }
        LabeledDataset::new(
            vec!["chest_pain".into(), "cough".into(), "high_fever".into()],
            rows,
        )
        .unwrap()
    }

    fn category_map() -> DiseaseCategoryMap {
        DiseaseCategoryMap::from_pairs([("Heart attack", "Heart"), ("Pneumonia", "Respiratory")])
    }

    #[test]
    fn test_train_balances_before_fitting() {
        let artifacts = train(&dataset(), &category_map(), &config()).unwrap();
        let counts = &artifacts.model.metadata().category_counts;
        assert_eq!(counts["Heart"], 6);
        assert_eq!(counts["Respiratory"], 6);
        assert_eq!(counts["General"], 6);
        assert_eq!(artifacts.model.labels(), &["General", "Heart", "Respiratory"]);
        assert!(artifacts.is_aligned());
    }

    #[test]
    fn test_train_is_reproducible() {
        let first = train(&dataset(), &category_map(), &config()).unwrap();
        let second = train(&dataset(), &category_map(), &config()).unwrap();
        assert_eq!(first.schema, second.schema);
        let vector = crate::schema::FeatureVector::from_symptoms(&first.schema, ["cough"]);
        assert_eq!(
            first.model.predict_proba(&vector),
            second.model.predict_proba(&vector)
        );
    }

    #[test]
    fn test_missing_category_fails() {
        let mut map = category_map();
        map.insert("Migraine", "Brain");
        let err = train(&dataset(), &map, &config()).unwrap_err();
        assert!(matches!(err, TriageError::DataError(_)));
    }
}

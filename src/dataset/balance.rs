//! Class balancing for classifier training
//!
//! Raw historical data over-represents some categories. Every non-General
//! category is downsampled to the size of the smallest one, General is capped
//! at that same size, and the result is shuffled. All randomness comes from the
//! generator passed in, so a fixed seed reproduces the same training set.

use std::collections::BTreeMap;

use itertools::Itertools;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::category::{DiseaseCategoryMap, GENERAL_CATEGORY};
use crate::dataset::LabeledDataset;
use crate::error::{Result, TriageError};
use crate::schema::{FeatureVector, SymptomSchema};
use crate::utils::logging::log_category_counts;

/// One row of the balanced training set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRecord {
    /// Symptom flags aligned to the training schema
    pub features: FeatureVector,
    /// Disease label from the source data
    pub disease: String,
    /// Category the disease resolves to
    pub category: String,
}

/// Class-balanced training set together with the schema derived from it
#[derive(Debug, Clone)]
pub struct BalancedDataset {
    schema: SymptomSchema,
    records: Vec<TrainingRecord>,
    min_count: usize,
}

impl BalancedDataset {
    /// Schema the feature vectors are aligned to
    #[must_use]
    pub fn schema(&self) -> &SymptomSchema {
        &self.schema
    }

    /// Records in shuffled order
    #[must_use]
    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    /// Size of the smallest non-General category before balancing
    #[must_use]
    pub fn min_count(&self) -> usize {
        self.min_count
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature vectors in record order
    #[must_use]
    pub fn features(&self) -> Vec<FeatureVector> {
        self.records.iter().map(|r| r.features.clone()).collect()
    }

    /// Category labels in record order
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.records.iter().map(|r| r.category.clone()).collect()
    }

    /// Rows per category
    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        self.records
            .iter()
            .map(|r| r.category.clone())
            .counts()
            .into_iter()
            .collect()
    }
}

/// Build the balanced training set
///
/// # Arguments
/// * `dataset` - Column-normalized labeled data
/// * `category_map` - Disease to category lookup; unmapped diseases are `General`
/// * `rng` - Seeded generator used for sampling and the final shuffle
///
/// # Errors
/// `DataError` when any non-General category (including one declared in the
/// category map) has no rows, or when there are no non-General rows at all.
pub fn build_balanced_dataset<R>(
    dataset: &LabeledDataset,
    category_map: &DiseaseCategoryMap,
    rng: &mut R,
) -> Result<BalancedDataset>
where
    R: Rng + ?Sized,
{
    let schema = SymptomSchema::new(dataset.feature_names().to_vec())?;
    if schema.is_empty() {
        return Err(TriageError::data("Dataset has no symptom columns"));
    }

    // Row indices per category, categories in label order
    let mut by_category: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, row) in dataset.rows().iter().enumerate() {
        let category = category_map.resolve(&row.disease);
        by_category.entry(category.to_string()).or_default().push(idx);
    }
    for declared in category_map.categories() {
        by_category.entry(declared.to_string()).or_default();
    }

    let counts: BTreeMap<String, usize> = by_category
        .iter()
        .map(|(category, rows)| (category.clone(), rows.len()))
        .collect();
    log_category_counts("Category distribution before balancing", &counts);

    let empty = counts
        .iter()
        .filter(|(category, count)| category.as_str() != GENERAL_CATEGORY && **count == 0)
        .map(|(category, _)| category.as_str())
        .collect_vec();
    if !empty.is_empty() {
        return Err(TriageError::data(format!(
            "No training rows for categories: {}",
            empty.join(", ")
        )));
    }

    let min_count = counts
        .iter()
        .filter(|(category, _)| category.as_str() != GENERAL_CATEGORY)
        .map(|(_, count)| *count)
        .min()
        .ok_or_else(|| {
            TriageError::data("No rows map to a non-General category; cannot balance")
        })?;

    let mut records = Vec::new();
    for (category, mut indices) in by_category {
        let take = min_count.min(indices.len());
        let (selected, _) = indices.partial_shuffle(rng, take);

        records.extend(selected.iter().map(|&idx| {
            let row = &dataset.rows()[idx];
            TrainingRecord {
                features: schema.reindex(dataset.feature_names(), &row.features),
                disease: row.disease.clone(),
                category: category.clone(),
            }
        }));
    }
    records.shuffle(rng);

    let balanced = BalancedDataset {
        schema,
        records,
        min_count,
    };
    log_category_counts(
        "Category distribution after balancing",
        &balanced.category_counts(),
    );
    Ok(balanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabeledRow;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dataset(labels: &[(&str, usize)]) -> LabeledDataset {
        let mut rows = Vec::new();
        for (disease, n) in labels {
            for i in 0..*n {
                rows.push(LabeledRow {
                    features: vec![u8::from(i % 2 == 0), u8::from(i % 3 == 0)],
                    disease: (*disease).to_string(),
                });
            }
        }
        LabeledDataset::new(vec!["cough".into(), "headache".into()], rows).unwrap()
    }

    fn category_map() -> DiseaseCategoryMap {
        DiseaseCategoryMap::from_pairs([
            ("Heart attack", "Heart"),
            ("Hypertension", "Heart"),
            ("Pneumonia", "Respiratory"),
            ("Migraine", "Brain"),
        ])
    }

    #[test]
    fn test_non_general_categories_equal_minimum() {
        let data = dataset(&[
            ("Heart attack", 30),
            ("Hypertension", 20),
            ("Pneumonia", 12),
            ("Migraine", 25),
            ("Malaria", 40),
        ]);
        let mut rng = StdRng::seed_from_u64(42);
        let balanced = build_balanced_dataset(&data, &category_map(), &mut rng).unwrap();

        let counts = balanced.category_counts();
        assert_eq!(balanced.min_count(), 12);
        assert_eq!(counts["Heart"], 12);
        assert_eq!(counts["Respiratory"], 12);
        assert_eq!(counts["Brain"], 12);
        assert_eq!(counts[GENERAL_CATEGORY], 12);
        assert_eq!(balanced.len(), 48);
        assert_eq!(balanced.schema().symptoms(), &["cough", "headache"]);
    }

    #[test]
    fn test_general_capped_at_available_rows() {
        let data = dataset(&[
            ("Heart attack", 10),
            ("Pneumonia", 10),
            ("Migraine", 10),
            ("Malaria", 3),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let balanced = build_balanced_dataset(&data, &category_map(), &mut rng).unwrap();
        assert_eq!(balanced.category_counts()[GENERAL_CATEGORY], 3);
    }

    #[test]
    fn test_same_seed_same_output() {
        let data = dataset(&[
            ("Heart attack", 30),
            ("Pneumonia", 15),
            ("Migraine", 22),
            ("Malaria", 9),
        ]);
        let first =
            build_balanced_dataset(&data, &category_map(), &mut StdRng::seed_from_u64(42))
                .unwrap();
        let second =
            build_balanced_dataset(&data, &category_map(), &mut StdRng::seed_from_u64(42))
                .unwrap();
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_declared_category_without_rows_fails() {
        let data = dataset(&[("Heart attack", 5), ("Pneumonia", 5)]);
        let err =
            build_balanced_dataset(&data, &category_map(), &mut StdRng::seed_from_u64(42))
                .unwrap_err();
        assert!(matches!(err, TriageError::DataError(_)));
        assert!(err.to_string().contains("Brain"));
    }

    #[test]
    fn test_only_general_rows_fails() {
        let data = dataset(&[("Malaria", 5)]);
        let err = build_balanced_dataset(
            &data,
            &DiseaseCategoryMap::new(),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap_err();
        assert!(matches!(err, TriageError::DataError(_)));
    }
}

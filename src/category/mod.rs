//! Disease → category → specialist lookups.
//!
//! Both lookups are total: an unknown disease resolves to [`GENERAL_CATEGORY`]
//! and an unknown category to [`GENERAL_PHYSICIAN`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::reader::read_table;
use crate::utils::log_warning;

/// Catch-all category for diseases without a mapping
pub const GENERAL_CATEGORY: &str = "General";

/// Specialist for categories without a mapping
pub const GENERAL_PHYSICIAN: &str = "General Physician";

/// Normalize a disease label for lookup: trimmed and lower-cased
#[must_use]
pub fn normalize_disease(disease: &str) -> String {
    disease.trim().to_lowercase()
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    disease: Option<String>,
    category: Option<String>,
}

/// Mapping from normalized disease name to category label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiseaseCategoryMap {
    entries: FxHashMap<String, String>,
}

impl DiseaseCategoryMap {
    /// Create an empty map (every disease resolves to `General`)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (disease, category) pairs
    pub fn from_pairs<I, D, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (D, C)>,
        D: AsRef<str>,
        C: AsRef<str>,
    {
        let mut map = Self::new();
        for (disease, category) in pairs {
            map.insert(disease.as_ref(), category.as_ref());
        }
        map
    }

    /// Add a mapping. Returns the category previously mapped for the disease.
    pub fn insert(&mut self, disease: &str, category: &str) -> Option<String> {
        self.entries
            .insert(normalize_disease(disease), category.trim().to_string())
    }

    /// Load the two-column `disease`,`category` table (CSV or Parquet)
    ///
    /// Rows with an empty disease or category are skipped; duplicated diseases
    /// keep the last category seen.
    pub fn load(path: &Path) -> Result<Self> {
        let batches = read_table(path, "disease category map")?;
        let mut map = Self::new();

        for batch in &batches {
            for column in ["disease", "category"] {
                if batch.schema().index_of(column).is_err() {
                    return Err(TriageError::data(format!(
                        "Disease category map {} has no '{column}' column",
                        path.display()
                    )));
                }
            }

            let rows: Vec<CategoryRow> = serde_arrow::from_record_batch(batch).map_err(|e| {
                TriageError::data(format!(
                    "Disease category map {} is malformed: {e}",
                    path.display()
                ))
            })?;

            for row in rows {
                let (Some(disease), Some(category)) = (row.disease, row.category) else {
                    log_warning("Skipping incomplete disease category row", Some(path));
                    continue;
                };
                if disease.trim().is_empty() || category.trim().is_empty() {
                    log_warning("Skipping incomplete disease category row", Some(path));
                    continue;
                }
                if let Some(previous) = map.insert(&disease, &category) {
                    if previous != category.trim() {
                        log::warn!(
                            "Disease '{}' mapped twice ('{previous}' then '{}'), keeping the latter",
                            disease.trim(),
                            category.trim()
                        );
                    }
                }
            }
        }

        log::info!(
            "Loaded {} disease mappings across {} categories",
            map.len(),
            map.categories().len()
        );
        Ok(map)
    }

    /// Resolve a disease to its category. Never fails; unknown diseases are `General`.
    #[must_use]
    pub fn resolve(&self, disease: &str) -> &str {
        self.entries
            .get(&normalize_disease(disease))
            .map_or(GENERAL_CATEGORY, String::as_str)
    }

    /// Every category the table declares, in label order
    #[must_use]
    pub fn categories(&self) -> BTreeSet<&str> {
        self.entries.values().map(String::as_str).collect()
    }

    /// Number of mapped diseases
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no disease is mapped
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Static mapping from category to specialist title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySpecialistMap {
    entries: BTreeMap<String, String>,
}

impl Default for CategorySpecialistMap {
    fn default() -> Self {
        Self::from_pairs([
            ("Heart", "Cardiologist"),
            ("Brain", "Neurologist"),
            ("Respiratory", "Pulmonologist"),
            ("Liver", "Hepatologist"),
            ("Endocrine", "Endocrinologist"),
            ("Mental_Health", "Psychiatrist"),
            ("Skin", "Dermatologist"),
            (GENERAL_CATEGORY, GENERAL_PHYSICIAN),
        ])
    }
}

impl CategorySpecialistMap {
    /// Build from (category, specialist) pairs
    pub fn from_pairs<I, C, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, S)>,
        C: Into<String>,
        S: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(c, s)| (c.into(), s.into()))
                .collect(),
        }
    }

    /// Specialist for a category. Never fails; unknown categories go to a General Physician.
    #[must_use]
    pub fn specialist_for(&self, category: &str) -> &str {
        self.entries
            .get(category)
            .map_or(GENERAL_PHYSICIAN, String::as_str)
    }

    /// Iterate (category, specialist) pairs in category order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, s)| (c.as_str(), s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_normalizes_case_and_whitespace() {
        let map = DiseaseCategoryMap::from_pairs([("Heart attack", "Heart")]);
        assert_eq!(map.resolve("  HEART ATTACK "), "Heart");
        assert_eq!(map.resolve("heart attack"), "Heart");
    }

    #[test]
    fn test_unmapped_disease_is_general() {
        let map = DiseaseCategoryMap::from_pairs([("Heart attack", "Heart")]);
        assert_eq!(map.resolve("Malaria"), GENERAL_CATEGORY);
        assert_eq!(map.resolve(""), GENERAL_CATEGORY);
        assert_eq!(DiseaseCategoryMap::new().resolve("anything"), GENERAL_CATEGORY);
    }

    #[test]
    fn test_specialist_lookup_defaults_to_general_physician() {
        let specialists = CategorySpecialistMap::default();
        assert_eq!(specialists.specialist_for("Heart"), "Cardiologist");
        assert_eq!(specialists.specialist_for(GENERAL_CATEGORY), GENERAL_PHYSICIAN);
        assert_eq!(specialists.specialist_for("Orthopedic"), GENERAL_PHYSICIAN);
    }

    #[test]
    fn test_load_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disease_category_map.csv");
        std::fs::write(
            &path,
            "disease,category\nHeart attack , Heart\nPneumonia,Respiratory\n,Skin\nMigraine,Brain\n",
        )
        .unwrap();

        let map = DiseaseCategoryMap::load(&path).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.resolve("heart attack"), "Heart");
        assert_eq!(map.resolve("Pneumonia"), "Respiratory");
        assert_eq!(
            map.categories().into_iter().collect::<Vec<_>>(),
            vec!["Brain", "Heart", "Respiratory"]
        );
    }

    #[test]
    fn test_load_requires_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        std::fs::write(&path, "name,group\nA,B\n").unwrap();
        assert!(matches!(
            DiseaseCategoryMap::load(&path).unwrap_err(),
            TriageError::DataError(_)
        ));
    }
}

//! Symptom schema and feature vectors.
//!
//! The schema is the ordered list of canonical symptom identifiers fixed at
//! training time. Its order is the contract between the training columns and
//! every feature vector built later, so vectors built against a different
//! column list are always reindexed rather than rejected.

use std::fmt;
use std::io::Write;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::util::{require_artifact, safe_read_to_string};
use crate::error::{Result, TriageError};
use crate::utils::write_atomic;

/// Ordered, duplicate-free list of canonical symptom identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SymptomSchema {
    symptoms: Vec<String>,
    positions: FxHashMap<String, usize>,
}

impl PartialEq for SymptomSchema {
    fn eq(&self, other: &Self) -> bool {
        self.symptoms == other.symptoms
    }
}

impl Eq for SymptomSchema {}

impl TryFrom<Vec<String>> for SymptomSchema {
    type Error = TriageError;

    fn try_from(symptoms: Vec<String>) -> Result<Self> {
        Self::new(symptoms)
    }
}

impl From<SymptomSchema> for Vec<String> {
    fn from(schema: SymptomSchema) -> Self {
        schema.symptoms
    }
}

impl SymptomSchema {
    /// Create a schema, rejecting empty or duplicate identifiers
    pub fn new(symptoms: Vec<String>) -> Result<Self> {
        let mut positions = FxHashMap::default();
        for (idx, symptom) in symptoms.iter().enumerate() {
            if symptom.trim().is_empty() {
                return Err(TriageError::data(format!(
                    "Symptom schema entry {idx} is empty"
                )));
            }
            if positions.insert(symptom.clone(), idx).is_some() {
                return Err(TriageError::data(format!(
                    "Symptom schema lists '{symptom}' more than once"
                )));
            }
        }
        Ok(Self {
            symptoms,
            positions,
        })
    }

    /// Number of symptoms
    #[must_use]
    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    /// Whether the schema has no symptoms
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    /// Symptoms in schema order
    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    /// Iterate symptoms in schema order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symptoms.iter().map(String::as_str)
    }

    /// Position of a symptom in the schema
    #[must_use]
    pub fn position(&self, symptom: &str) -> Option<usize> {
        self.positions.get(symptom).copied()
    }

    /// Whether the schema contains a symptom
    #[must_use]
    pub fn contains(&self, symptom: &str) -> bool {
        self.positions.contains_key(symptom)
    }

    /// Align values given in `columns` order to this schema.
    ///
    /// Columns unknown to the schema are dropped and schema entries missing from
    /// `columns` are zero-filled. The result always has exactly `self.len()` entries.
    #[must_use]
    pub fn reindex(&self, columns: &[String], values: &[u8]) -> FeatureVector {
        let mut vector = FeatureVector::zeros(self.len());
        for (column, &value) in columns.iter().zip(values) {
            if value != 0 {
                if let Some(idx) = self.position(column) {
                    vector.set(idx);
                }
            }
        }
        vector
    }

    /// Render the schema file format: one identifier per line
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for symptom in &self.symptoms {
            text.push_str(symptom);
            text.push('\n');
        }
        text
    }

    /// Parse the schema file format. Blank lines are ignored.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Load a persisted schema. A missing or malformed file is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        let schema = require_artifact(
            safe_read_to_string(path, "symptom schema").and_then(|text| Self::from_text(&text)),
            "Symptom schema",
            path,
        )?;
        if schema.is_empty() {
            return Err(TriageError::configuration(format!(
                "Symptom schema at {} is empty",
                path.display()
            )));
        }
        Ok(schema)
    }

    /// Persist the schema, atomically replacing any previous file
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |writer| {
            writer.write_all(self.to_text().as_bytes())?;
            Ok(())
        })
    }
}

/// Symptom flags aligned to a [`SymptomSchema`]. Every value is 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct FeatureVector {
    values: Vec<u8>,
}

impl TryFrom<Vec<u8>> for FeatureVector {
    type Error = TriageError;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        Self::from_values(values)
    }
}

impl From<FeatureVector> for Vec<u8> {
    fn from(vector: FeatureVector) -> Self {
        vector.values
    }
}

impl FeatureVector {
    /// All-zero vector of the given length
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0; len],
        }
    }

    /// Build from raw values, rejecting anything other than 0 or 1
    pub fn from_values(values: Vec<u8>) -> Result<Self> {
        if let Some(pos) = values.iter().position(|&v| v > 1) {
            return Err(TriageError::data(format!(
                "Feature value at position {pos} is {}, expected 0 or 1",
                values[pos]
            )));
        }
        Ok(Self { values })
    }

    /// Build a vector for `schema` with the given symptoms set
    pub fn from_symptoms<'a, I>(schema: &SymptomSchema, symptoms: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vector = Self::zeros(schema.len());
        for symptom in symptoms {
            if let Some(idx) = schema.position(symptom) {
                vector.set(idx);
            }
        }
        vector
    }

    /// Set the flag at `idx`
    pub fn set(&mut self, idx: usize) {
        if let Some(value) = self.values.get_mut(idx) {
            *value = 1;
        }
    }

    /// Flag at `idx`; positions past the end read as 0
    #[must_use]
    pub fn get(&self, idx: usize) -> u8 {
        self.values.get(idx).copied().unwrap_or(0)
    }

    /// Whether the flag at `idx` is set
    #[must_use]
    pub fn is_set(&self, idx: usize) -> bool {
        self.get(idx) == 1
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of set flags
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }

    /// Raw values
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    /// Names of the set flags according to `schema`
    #[must_use]
    pub fn active_symptoms<'a>(&self, schema: &'a SymptomSchema) -> Vec<&'a str> {
        schema
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.is_set(*idx))
            .map(|(_, name)| name)
            .collect()
    }

    /// Re-express this vector, built against `from`, in the order of `to`
    #[must_use]
    pub fn reindex(&self, from: &SymptomSchema, to: &SymptomSchema) -> Self {
        if from == to {
            return self.clone();
        }
        to.reindex(from.symptoms(), &self.values)
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in &self.values {
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

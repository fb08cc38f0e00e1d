//! Free text → schema-aligned feature vector
//!
//! Matching is case-insensitive substring containment with no word
//! boundaries. Two passes feed one detected set: the alias table maps
//! everyday phrases to canonical symptoms, then every schema symptom is
//! looked for under its underscore-to-space spelling.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::schema::{FeatureVector, SymptomSchema};

/// Lower-case text before matching
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

/// Many-to-one mapping from free-text phrase to canonical symptom id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct SymptomAliasTable {
    entries: BTreeMap<String, String>,
}

impl TryFrom<BTreeMap<String, String>> for SymptomAliasTable {
    type Error = TriageError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self> {
        let mut table = Self {
            entries: BTreeMap::new(),
        };
        for (phrase, symptom) in entries {
            table.insert(&phrase, &symptom)?;
        }
        Ok(table)
    }
}

impl From<SymptomAliasTable> for BTreeMap<String, String> {
    fn from(table: SymptomAliasTable) -> Self {
        table.entries
    }
}

impl Default for SymptomAliasTable {
    fn default() -> Self {
        let entries = [
            // Heart
            ("chest pain", "chest_pain"),
            ("pressure in chest", "chest_pain"),
            ("heart pain", "chest_pain"),
            ("short breath", "breathlessness"),
            ("shortness of breath", "breathlessness"),
            ("difficulty breathing", "breathlessness"),
            ("fast heart rate", "fast_heart_rate"),
            ("rapid heartbeat", "fast_heart_rate"),
            ("palpitations", "palpitations"),
            ("sweating", "sweating"),
            // Respiratory
            ("breathing problem", "breathlessness"),
            ("breathing difficulty", "breathlessness"),
            ("chest congestion", "congestion"),
            ("cough", "cough"),
            ("phlegm", "phlegm"),
            ("mucus", "mucoid_sputum"),
            ("runny nose", "runny_nose"),
            ("sinus pressure", "sinus_pressure"),
            ("wheezing", "phlegm"),
            // Brain
            ("severe headache", "headache"),
            ("headache", "headache"),
            ("dizziness", "dizziness"),
            ("confusion", "altered_sensorium"),
            ("memory loss", "lack_of_concentration"),
            ("blurred vision", "blurred_and_distorted_vision"),
            ("loss of balance", "loss_of_balance"),
            ("slurred speech", "slurred_speech"),
            ("seizure", "coma"),
            // Liver
            ("yellow skin", "yellowish_skin"),
            ("yellow eyes", "yellowing_of_eyes"),
            ("dark urine", "dark_urine"),
            ("abdominal pain", "abdominal_pain"),
            ("loss of appetite", "loss_of_appetite"),
            ("alcohol history", "history_of_alcohol_consumption"),
            // Endocrine
            ("weight gain", "weight_gain"),
            ("weight loss", "weight_loss"),
            ("fatigue", "fatigue"),
            ("excessive hunger", "excessive_hunger"),
            ("frequent urination", "polyuria"),
            ("increased appetite", "increased_appetite"),
            // Mental health
            ("anxiety", "anxiety"),
            ("panic", "anxiety"),
            ("depression", "depression"),
            ("mood swings", "mood_swings"),
            ("irritability", "irritability"),
            ("insomnia", "restlessness"),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(p, s)| (p.to_string(), s.to_string()))
                .collect(),
        }
    }
}

impl SymptomAliasTable {
    /// Empty table
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an alias. The phrase is stored lower-cased.
    pub fn insert(&mut self, phrase: &str, symptom: &str) -> Result<()> {
        let phrase = normalize_text(phrase.trim());
        let symptom = symptom.trim();
        if phrase.is_empty() || symptom.is_empty() {
            return Err(TriageError::configuration(format!(
                "Alias '{phrase}' -> '{symptom}' has an empty side"
            )));
        }
        self.entries.insert(phrase, symptom.to_string());
        Ok(())
    }

    /// Iterate (phrase, canonical symptom)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, s)| (p.as_str(), s.as_str()))
    }

    /// Number of aliases
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of normalizing one description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSymptoms {
    /// Every canonical symptom found, including alias targets the schema lacks
    pub detected: BTreeSet<String>,
    /// Flags aligned to the schema
    pub features: FeatureVector,
}

/// Turns descriptions into feature vectors for one schema
#[derive(Debug, Clone, Copy)]
pub struct SymptomNormalizer<'a> {
    aliases: &'a SymptomAliasTable,
    schema: &'a SymptomSchema,
}

impl<'a> SymptomNormalizer<'a> {
    /// Normalizer over an alias table and a schema
    #[must_use]
    pub const fn new(aliases: &'a SymptomAliasTable, schema: &'a SymptomSchema) -> Self {
        Self { aliases, schema }
    }

    /// Canonical symptoms mentioned in `text`. Both passes always run in full.
    #[must_use]
    pub fn detect(&self, text: &str) -> BTreeSet<String> {
        let text = normalize_text(text);
        let mut detected = BTreeSet::new();

        for (phrase, symptom) in self.aliases.iter() {
            if text.contains(phrase) {
                detected.insert(symptom.to_string());
            }
        }

        for symptom in self.schema.iter() {
            if text.contains(&symptom.replace('_', " ")) {
                detected.insert(symptom.to_string());
            }
        }

        detected
    }

    /// Detected symptoms and the schema-aligned vector. Unmatched text gives all zeros.
    #[must_use]
    pub fn normalize(&self, text: &str) -> NormalizedSymptoms {
        let detected = self.detect(text);
        let features =
            FeatureVector::from_symptoms(self.schema, detected.iter().map(String::as_str));

        let unknown: Vec<&str> = detected
            .iter()
            .map(String::as_str)
            .filter(|s| !self.schema.contains(s))
            .collect();
        if !unknown.is_empty() {
            log::debug!("Detected symptoms outside the schema: {}", unknown.join(", "));
        }

        NormalizedSymptoms { detected, features }
    }
}

//! Two-layer inference: safety overrides first, classifier second.

use std::time::Instant;

use crate::config::{DEFAULT_ADVISORY_THRESHOLD, TriageConfig};
use crate::error::{Result, TriageError};
use crate::model::{ArtifactStore, TrainedArtifacts};
use crate::triage::normalizer::{NormalizedSymptoms, SymptomNormalizer};
use crate::triage::reference::ReferenceData;
use crate::triage::result::{ADVISORY_TEXT, Confidence, InferenceResult};

/// Immutable inference context
///
/// Built once per process and shared by reference (usually behind an `Arc`).
/// Nothing in it changes after construction, so concurrent callers need no
/// locking.
#[derive(Debug, Clone)]
pub struct TriageEngine {
    reference: ReferenceData,
    artifacts: Option<TrainedArtifacts>,
    advisory_threshold: f64,
}

impl TriageEngine {
    /// Engine with trained artifacts
    #[must_use]
    pub fn new(reference: ReferenceData, artifacts: TrainedArtifacts) -> Self {
        Self {
            reference,
            artifacts: Some(artifacts),
            advisory_threshold: DEFAULT_ADVISORY_THRESHOLD,
        }
    }

    /// Engine without a classifier. Overrides still apply; anything they do not
    /// catch fails with a configuration error.
    #[must_use]
    pub fn rules_only(reference: ReferenceData) -> Self {
        Self {
            reference,
            artifacts: None,
            advisory_threshold: DEFAULT_ADVISORY_THRESHOLD,
        }
    }

    /// Load reference data and artifacts named by a configuration
    ///
    /// # Errors
    /// `ConfigurationError` when the schema, model or reference file is missing
    /// or malformed.
    pub fn load(config: &TriageConfig) -> Result<Self> {
        let reference = ReferenceData::load(config.reference_data.as_deref())?;
        let artifacts = ArtifactStore::from_config(config).load()?;
        Ok(Self::new(reference, artifacts).with_advisory_threshold(config.advisory_threshold))
    }

    /// Replace the advisory threshold (percent)
    #[must_use]
    pub fn with_advisory_threshold(mut self, threshold: f64) -> Self {
        self.advisory_threshold = threshold;
        self
    }

    /// Reference data in use
    #[must_use]
    pub const fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Trained artifacts, if any
    #[must_use]
    pub const fn artifacts(&self) -> Option<&TrainedArtifacts> {
        self.artifacts.as_ref()
    }

    /// Advisory threshold in percent
    #[must_use]
    pub const fn advisory_threshold(&self) -> f64 {
        self.advisory_threshold
    }

    fn require_artifacts(&self) -> Result<&TrainedArtifacts> {
        self.artifacts.as_ref().ok_or_else(|| {
            TriageError::configuration(
                "No trained schema and model are loaded; run training first",
            )
        })
    }

    /// Result of the first safety rule that fires, if any
    #[must_use]
    pub fn check_overrides(&self, text: &str) -> Option<InferenceResult> {
        self.reference.overrides.evaluate(text).map(|decision| {
            log::info!(
                "Safety override '{}' applied ({} -> {})",
                decision.rule.name,
                decision.rule.category,
                decision.rule.specialist
            );
            InferenceResult {
                category: decision.rule.category.clone(),
                confidence: Confidence::Qualitative(decision.rule.confidence_label.clone()),
                specialist: decision.rule.specialist.clone(),
                advisory: None,
            }
        })
    }

    /// Feature vector for `text` against the persisted schema
    pub fn feature_vector(&self, text: &str) -> Result<NormalizedSymptoms> {
        let artifacts = self.require_artifacts()?;
        Ok(SymptomNormalizer::new(&self.reference.aliases, &artifacts.schema).normalize(text))
    }

    /// Classifier path only, skipping the overrides
    pub fn classify(&self, text: &str) -> Result<InferenceResult> {
        let start = Instant::now();
        let artifacts = self.require_artifacts()?;
        let normalized = self.feature_vector(text)?;
        log::debug!(
            "Detected {} symptom(s), {} in schema",
            normalized.detected.len(),
            normalized.features.active_count()
        );

        let probabilities = artifacts
            .model
            .predict_proba_aligned(&normalized.features, &artifacts.schema);
        let (category, probability) = probabilities
            .best()
            .ok_or_else(|| TriageError::configuration("Model produced no categories"))?;

        let confidence = probability * 100.0;
        let advisory = (confidence < self.advisory_threshold).then(|| ADVISORY_TEXT.to_string());
        let specialist = self.reference.specialists.specialist_for(category);

        log::debug!(
            "Classified as {category} ({confidence:.2}%) in {:?}",
            start.elapsed()
        );
        Ok(InferenceResult {
            category: category.to_string(),
            confidence: Confidence::Numeric(confidence),
            specialist: specialist.to_string(),
            advisory,
        })
    }

    /// Full decision for one description
    ///
    /// # Errors
    /// `ConfigurationError` when no override fires and no artifacts are loaded.
    pub fn orchestrate(&self, text: &str) -> Result<InferenceResult> {
        match self.check_overrides(text) {
            Some(result) => Ok(result),
            None => self.classify(text),
        }
    }
}

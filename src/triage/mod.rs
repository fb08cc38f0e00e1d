//! Inference-time triage
//!
//! [`TriageEngine`] combines the safety override policy, the symptom
//! normalizer and the trained classifier into one call that returns an
//! [`InferenceResult`].

pub mod engine;
pub mod normalizer;
pub mod overrides;
pub mod reference;
pub mod result;

pub use engine::TriageEngine;
pub use normalizer::{NormalizedSymptoms, SymptomAliasTable, SymptomNormalizer, normalize_text};
pub use overrides::{OVERRIDE_CONFIDENCE_LABEL, OverrideDecision, OverridePolicy, OverrideRule};
pub use reference::ReferenceData;
pub use result::{ADVISORY_TEXT, Confidence, InferenceResult};

//! Symptom triage: free-text symptom descriptions to a medical category and a
//! recommended specialist.
//!
//! Safety override rules are checked first; anything they do not catch goes to
//! a random forest trained on class-balanced historical data, with an advisory
//! attached to low-confidence predictions.

pub mod async_io;
pub mod category;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod reader;
pub mod schema;
pub mod training;
pub mod triage;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{ForestConfig, TriageConfig};
pub use error::{Result, TriageError};
pub use schema::{FeatureVector, SymptomSchema};

// Reference tables
pub use category::{CategorySpecialistMap, DiseaseCategoryMap, GENERAL_CATEGORY, GENERAL_PHYSICIAN};

// Training and evaluation
pub use dataset::{BalancedDataset, LabeledDataset, TrainingRecord, build_balanced_dataset};
pub use evaluation::{EvaluationReport, evaluate, evaluate_from_config};
pub use model::{ArtifactStore, ClassProbabilities, Model, TrainedArtifacts};
pub use training::{TrainingSummary, train, train_from_config};

// Inference
pub use triage::{Confidence, InferenceResult, ReferenceData, TriageEngine};

// Async functionality
pub use async_io::{load_engine_async, orchestrate_with_timeout};

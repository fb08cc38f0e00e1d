//! Persistence of the trained schema and model.
//!
//! Training is the only writer. Both files are replaced atomically; readers
//! fail with a configuration error when either is missing or malformed.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::TriageConfig;
use crate::error::util::{require_artifact, safe_open_file};
use crate::error::{Result, TriageError};
use crate::model::Model;
use crate::schema::SymptomSchema;
use crate::utils::logging::{log_operation_complete, log_operation_start};
use crate::utils::write_atomic;

/// Schema and model produced by one training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArtifacts {
    /// Persisted symptom schema
    pub schema: SymptomSchema,
    /// Persisted classifier
    pub model: Model,
}

impl TrainedArtifacts {
    /// Whether the schema file and the model agree on symptom order
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        &self.schema == self.model.schema()
    }
}

/// Locations of the persisted artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    schema_path: PathBuf,
    model_path: PathBuf,
}

impl ArtifactStore {
    /// Store with explicit file locations
    #[must_use]
    pub fn new(schema_path: PathBuf, model_path: PathBuf) -> Self {
        Self {
            schema_path,
            model_path,
        }
    }

    /// Store rooted at the configured artifact directory
    #[must_use]
    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(config.schema_path(), config.model_path())
    }

    /// Schema file location
    #[must_use]
    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Model file location
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Write both artifacts, replacing any previous run
    pub fn save(&self, artifacts: &TrainedArtifacts) -> Result<()> {
        let start = Instant::now();
        log_operation_start("Writing model artifact to", &self.model_path);
        write_atomic(&self.model_path, |writer| {
            serde_json::to_writer(writer, &artifacts.model)?;
            Ok(())
        })?;
        artifacts.schema.save(&self.schema_path)?;
        log_operation_complete(
            "wrote",
            &self.model_path,
            artifacts.model.tree_count(),
            Some(start.elapsed()),
        );
        Ok(())
    }

    /// Load both artifacts
    ///
    /// # Errors
    /// `ConfigurationError` when a file is missing, unreadable or fails validation.
    pub fn load(&self) -> Result<TrainedArtifacts> {
        let start = Instant::now();
        let schema = SymptomSchema::load(&self.schema_path)?;
        let model = self.load_model()?;

        let artifacts = TrainedArtifacts { schema, model };
        if !artifacts.is_aligned() {
            log::warn!(
                "Schema file {} differs from the model's training schema; feature vectors will be reindexed",
                self.schema_path.display()
            );
        }
        log_operation_complete(
            "loaded",
            &self.model_path,
            artifacts.model.tree_count(),
            Some(start.elapsed()),
        );
        Ok(artifacts)
    }

    fn load_model(&self) -> Result<Model> {
        let path = &self.model_path;
        let model = require_artifact(
            safe_open_file(path, "model artifact").and_then(|file| {
                serde_json::from_reader::<_, Model>(BufReader::new(file)).map_err(TriageError::from)
            }),
            "Model artifact",
            path,
        )?;
        model.validate()?;
        Ok(model)
    }
}

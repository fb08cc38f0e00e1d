//! Static reference data loaded once per process

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::CategorySpecialistMap;
use crate::error::util::safe_read_to_string;
use crate::error::{Result, TriageError};
use crate::triage::normalizer::SymptomAliasTable;
use crate::triage::overrides::OverridePolicy;

/// Specialists, aliases and override rules
///
/// Every section defaults to the built-in table, so a JSON file only needs the
/// sections it replaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    /// Category to specialist lookup
    pub specialists: CategorySpecialistMap,
    /// Phrase to canonical symptom lookup
    pub aliases: SymptomAliasTable,
    /// Safety override rules in priority order
    pub overrides: OverridePolicy,
}

impl ReferenceData {
    /// Load from a JSON file
    ///
    /// # Errors
    /// `ConfigurationError` when the file is missing or malformed, including
    /// override rules that fail validation.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "reference data").map_err(|e| {
            TriageError::configuration(format!(
                "Reference data {} is not readable: {e}",
                path.display()
            ))
        })?;
        let data: Self = serde_json::from_str(&content).map_err(|e| {
            TriageError::configuration(format!(
                "Invalid reference data {}: {e}",
                path.display()
            ))
        })?;
        log::info!(
            "Loaded reference data from {} ({} aliases, {} override rules)",
            path.display(),
            data.aliases.len(),
            data.overrides.rules().len()
        );
        Ok(data)
    }

    /// Load from an optional file, falling back to the built-in tables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_json_file)
    }
}

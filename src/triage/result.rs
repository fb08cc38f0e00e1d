//! Result contract shared by the override and classifier paths

use std::fmt;

use serde::{Deserialize, Serialize};

/// Advisory attached to low-confidence classifier predictions
pub const ADVISORY_TEXT: &str =
    "Low confidence prediction. Patient should be reviewed by a General Physician first.";

/// How sure the engine is about a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Confidence {
    /// Classifier probability of the chosen category, in percent
    Numeric(f64),
    /// Fixed label from a safety override rule
    Qualitative(String),
}

impl Confidence {
    /// Percentage for classifier results
    #[must_use]
    pub const fn percent(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Qualitative(_) => None,
        }
    }

    /// Whether this came from a rule rather than the classifier
    #[must_use]
    pub const fn is_qualitative(&self) -> bool {
        matches!(self, Self::Qualitative(_))
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value:.2}%"),
            Self::Qualitative(label) => f.write_str(label),
        }
    }
}

/// Final answer for one description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Medical category
    pub category: String,
    /// Numeric or qualitative confidence
    pub confidence: Confidence,
    /// Recommended specialist
    pub specialist: String,
    /// Escalation note; never changes category or specialist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

impl InferenceResult {
    /// Whether a safety override produced this result
    #[must_use]
    pub const fn is_override(&self) -> bool {
        self.confidence.is_qualitative()
    }
}

impl fmt::Display for InferenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Category Identified : {}", self.category)?;
        writeln!(f, "Confidence          : {}", self.confidence)?;
        write!(f, "Recommended Doctor  : {}", self.specialist)?;
        if let Some(advisory) = &self.advisory {
            write!(f, "\n\nNOTE: {advisory}")?;
        }
        Ok(())
    }
}

//! Rule-based safety overrides
//!
//! Rules run on the raw lower-cased text before any classifier call. They are
//! checked in priority order and the first rule whose trigger count reaches its
//! threshold decides the result.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, TriageError};
use crate::triage::normalizer::normalize_text;

/// Confidence label reported when a rule fires
pub const OVERRIDE_CONFIDENCE_LABEL: &str = "High (Rule-based Safety Override)";

fn default_confidence_label() -> String {
    OVERRIDE_CONFIDENCE_LABEL.to_string()
}

/// One named group of trigger phrases with a fixed outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Rule name used in logs
    pub name: String,
    /// Phrases counted by substring containment
    pub triggers: Vec<String>,
    /// Matches needed to fire
    pub min_matches: usize,
    /// Category returned when the rule fires
    pub category: String,
    /// Specialist returned when the rule fires
    pub specialist: String,
    /// Qualitative confidence returned when the rule fires
    #[serde(default = "default_confidence_label")]
    pub confidence_label: String,
}

impl OverrideRule {
    /// Rule with the standard confidence label
    pub fn new<I, S>(
        name: &str,
        triggers: I,
        min_matches: usize,
        category: &str,
        specialist: &str,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            triggers: triggers.into_iter().map(Into::into).collect(),
            min_matches,
            category: category.to_string(),
            specialist: specialist.to_string(),
            confidence_label: default_confidence_label(),
        }
    }

    /// Triggers contained in already lower-cased text, in trigger order
    fn matches<'a>(&'a self, text: &str) -> SmallVec<[&'a str; 8]> {
        self.triggers
            .iter()
            .map(String::as_str)
            .filter(|trigger| text.contains(trigger))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.min_matches == 0 {
            return Err(TriageError::configuration(format!(
                "Override rule '{}' has a threshold of 0",
                self.name
            )));
        }
        if self.triggers.is_empty() || self.triggers.iter().any(|t| t.trim().is_empty()) {
            return Err(TriageError::configuration(format!(
                "Override rule '{}' needs non-empty trigger phrases",
                self.name
            )));
        }
        if self.category.trim().is_empty() || self.specialist.trim().is_empty() {
            return Err(TriageError::configuration(format!(
                "Override rule '{}' needs a category and a specialist",
                self.name
            )));
        }
        Ok(())
    }
}

/// A fired rule and the triggers that fired it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideDecision<'a> {
    /// The winning rule
    pub rule: &'a OverrideRule,
    /// Triggers found in the text
    pub matched: SmallVec<[&'a str; 8]>,
}

/// Ordered set of override rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<OverrideRule>", into = "Vec<OverrideRule>")]
pub struct OverridePolicy {
    rules: Vec<OverrideRule>,
}

impl TryFrom<Vec<OverrideRule>> for OverridePolicy {
    type Error = TriageError;

    fn try_from(rules: Vec<OverrideRule>) -> Result<Self> {
        Self::new(rules)
    }
}

impl From<OverridePolicy> for Vec<OverrideRule> {
    fn from(policy: OverridePolicy) -> Self {
        policy.rules
    }
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                OverrideRule::new(
                    "heart",
                    [
                        "chest pain",
                        "short breath",
                        "shortness of breath",
                        "difficulty breathing",
                        "sweating",
                        "palpitations",
                        "fast heart rate",
                    ],
                    2,
                    "Heart",
                    "Cardiologist",
                ),
                OverrideRule::new(
                    "respiratory",
                    [
                        "breathing problem",
                        "breathing difficulty",
                        "shortness of breath",
                        "cough",
                        "phlegm",
                        "chest congestion",
                        "wheezing",
                    ],
                    2,
                    "Respiratory",
                    "Pulmonologist",
                ),
            ],
        }
    }
}

impl OverridePolicy {
    /// Validated policy. Trigger phrases are lower-cased.
    ///
    /// # Errors
    /// `ConfigurationError` for a rule with a zero threshold, no triggers or an
    /// empty outcome.
    pub fn new(rules: Vec<OverrideRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.validate()?;
                rule.triggers = rule
                    .triggers
                    .iter()
                    .map(|t| normalize_text(t.trim()))
                    .collect();
                Ok(rule)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Policy that never fires
    #[must_use]
    pub fn disabled() -> Self {
        Self { rules: Vec::new() }
    }

    /// Rules in priority order
    #[must_use]
    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// First rule whose threshold is met, if any. Total over every input.
    #[must_use]
    pub fn evaluate(&self, text: &str) -> Option<OverrideDecision<'_>> {
        let text = normalize_text(text);
        self.rules.iter().find_map(|rule| {
            let matched = rule.matches(&text);
            if matched.len() >= rule.min_matches {
                log::debug!(
                    "Override rule '{}' fired on {} trigger(s): {}",
                    rule.name,
                    matched.len(),
                    matched.join(", ")
                );
                Some(OverrideDecision { rule, matched })
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_rule_fires_on_two_triggers() {
        let policy = OverridePolicy::default();
        let decision = policy.evaluate("Severe CHEST PAIN and sweating").unwrap();
        assert_eq!(decision.rule.name, "heart");
        assert_eq!(decision.rule.category, "Heart");
        assert_eq!(decision.rule.specialist, "Cardiologist");
        assert_eq!(decision.rule.confidence_label, OVERRIDE_CONFIDENCE_LABEL);
        assert_eq!(decision.matched.as_slice(), &["chest pain", "sweating"]);
    }

    #[test]
    fn test_single_trigger_does_not_fire() {
        let policy = OverridePolicy::default();
        assert!(policy.evaluate("some chest pain").is_none());
        assert!(policy.evaluate("").is_none());
    }

    #[test]
    fn test_heart_has_priority_over_respiratory() {
        let policy = OverridePolicy::default();
        // two heart triggers and two respiratory triggers
        let decision = policy
            .evaluate("shortness of breath, palpitations and a cough with phlegm")
            .unwrap();
        assert_eq!(decision.rule.name, "heart");
    }

    #[test]
    fn test_respiratory_rule() {
        let policy = OverridePolicy::default();
        let decision = policy.evaluate("persistent cough and wheezing").unwrap();
        assert_eq!(decision.rule.category, "Respiratory");
        assert_eq!(decision.rule.specialist, "Pulmonologist");
    }

    #[test]
    fn test_repeated_trigger_counts_once() {
        let policy = OverridePolicy::default();
        assert!(policy.evaluate("cough cough cough").is_none());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let rule = OverrideRule::new("x", ["a"], 0, "Heart", "Cardiologist");
        let err = OverridePolicy::new(vec![rule]).unwrap_err();
        assert!(matches!(err, TriageError::ConfigurationError(_)));
    }

    #[test]
    fn test_empty_triggers_rejected_on_deserialize() {
        let json = r#"[{ "name": "x", "triggers": [], "min_matches": 1,
                         "category": "Heart", "specialist": "Cardiologist" }]"#;
        assert!(serde_json::from_str::<OverridePolicy>(json).is_err());
    }

    #[test]
    fn test_deserialized_rules_use_default_label_and_lowercase_triggers() {
        let json = r#"[{ "name": "skin", "triggers": ["Itching", "Rash"], "min_matches": 2,
                         "category": "Skin", "specialist": "Dermatologist" }]"#;
        let policy: OverridePolicy = serde_json::from_str(json).unwrap();
        let decision = policy.evaluate("itching with a red rash").unwrap();
        assert_eq!(decision.rule.confidence_label, OVERRIDE_CONFIDENCE_LABEL);
        assert_eq!(decision.rule.triggers, vec!["itching", "rash"]);
    }

    #[test]
    fn test_disabled_policy_never_fires() {
        assert!(OverridePolicy::disabled()
            .evaluate("chest pain sweating palpitations")
            .is_none());
    }
}

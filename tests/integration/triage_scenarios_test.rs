use crate::utils::fixture;
use symptom_triage::triage::{ADVISORY_TEXT, OVERRIDE_CONFIDENCE_LABEL};
use symptom_triage::{
    Confidence, DiseaseCategoryMap, GENERAL_CATEGORY, GENERAL_PHYSICIAN, ReferenceData,
    TriageEngine, TriageError, train_from_config,
};

fn trained_engine() -> (crate::utils::Fixture, TriageEngine) {
    let fixture = fixture();
    train_from_config(&fixture.config).expect("Training failed");
    let engine = TriageEngine::load(&fixture.config).expect("Failed to load engine");
    (fixture, engine)
}

/// Heart red flags bypass the classifier
#[test]
fn test_chest_pain_and_sweating_go_to_cardiologist() -> symptom_triage::Result<()> {
    let (_fixture, engine) = trained_engine();
    let result = engine.orchestrate("severe chest pain and sweating")?;

    assert_eq!(result.category, "Heart");
    assert_eq!(result.specialist, "Cardiologist");
    assert_eq!(
        result.confidence,
        Confidence::Qualitative(OVERRIDE_CONFIDENCE_LABEL.to_string())
    );
    assert!(result.advisory.is_none());
    Ok(())
}

/// Overrides fire even without any trained artifacts
#[test]
fn test_override_precedes_missing_artifacts() -> symptom_triage::Result<()> {
    let engine = TriageEngine::rules_only(ReferenceData::default());
    let result = engine.orchestrate("Shortness of breath with palpitations and a cough")?;
    assert_eq!(result.category, "Heart");

    let result = engine.orchestrate("wheezing and chest congestion")?;
    assert_eq!(result.category, "Respiratory");
    assert_eq!(result.specialist, "Pulmonologist");
    Ok(())
}

/// A single symptom is encoded against the persisted schema and classified
#[test]
fn test_mild_headache() -> symptom_triage::Result<()> {
    let (_fixture, engine) = trained_engine();

    let normalized = engine.feature_vector("mild headache")?;
    let schema = &engine.artifacts().expect("artifacts loaded").schema;
    assert_eq!(normalized.features.active_symptoms(schema), vec!["headache"]);
    assert_eq!(normalized.features.len(), schema.len());

    let result = engine.orchestrate("mild headache")?;
    assert_eq!(result.category, "Brain");
    assert_eq!(result.specialist, "Neurologist");
    let confidence = result.confidence.percent().expect("numeric confidence");
    assert_eq!(result.advisory.is_some(), confidence < 55.0);
    Ok(())
}

/// The advisory augments a low-confidence answer without changing it
#[test]
fn test_advisory_keeps_category() -> symptom_triage::Result<()> {
    let (_fixture, engine) = trained_engine();
    let plain = engine.orchestrate("mild headache")?;
    let strict = engine
        .clone()
        .with_advisory_threshold(100.1)
        .orchestrate("mild headache")?;

    assert_eq!(strict.category, plain.category);
    assert_eq!(strict.specialist, plain.specialist);
    assert_eq!(strict.confidence, plain.confidence);
    assert_eq!(strict.advisory.as_deref(), Some(ADVISORY_TEXT));
    Ok(())
}

/// An unmapped disease falls back to General and a General Physician
#[test]
fn test_malaria_is_general() -> symptom_triage::Result<()> {
    let fixture = fixture();
    let map = DiseaseCategoryMap::load(&fixture.config.category_map)?;
    let category = map.resolve("Malaria");
    assert_eq!(category, GENERAL_CATEGORY);

    let specialists = ReferenceData::default().specialists;
    assert_eq!(specialists.specialist_for(category), GENERAL_PHYSICIAN);
    assert_eq!(map.resolve("  HYPERTENSION "), "Heart");
    Ok(())
}

/// Text with no known symptom still produces a full-length zero vector
#[test]
fn test_unmatched_text_is_zero_vector() -> symptom_triage::Result<()> {
    let (_fixture, engine) = trained_engine();
    let normalized = engine.feature_vector("I just feel off today")?;
    assert_eq!(normalized.features.active_count(), 0);
    assert!(engine.orchestrate("I just feel off today").is_ok());
    Ok(())
}

/// Identical text always yields the identical result
#[test]
fn test_orchestration_is_deterministic() -> symptom_triage::Result<()> {
    let (_fixture, engine) = trained_engine();
    for text in ["high fever and a cough", "headache", ""] {
        assert_eq!(engine.orchestrate(text)?, engine.orchestrate(text)?);
    }
    Ok(())
}

/// Loading without artifacts is a configuration error
#[test]
fn test_missing_artifacts_are_configuration_error() {
    let fixture = fixture();
    let err = TriageEngine::load(&fixture.config).unwrap_err();
    assert!(matches!(err, TriageError::ConfigurationError(_)), "{err}");
}

use crate::utils::fixture;
use symptom_triage::{TriageConfig, TriageError, evaluate_from_config, train_from_config};

/// Held-out rows with shuffled and missing columns are reindexed and scored
#[test]
fn test_evaluate_after_training() -> symptom_triage::Result<()> {
    let fixture = fixture();
    train_from_config(&fixture.config)?;
    let report = evaluate_from_config(&fixture.config)?;

    assert_eq!(report.rows, 4);
    let correct = report.confusion.correct();
    assert!((report.accuracy - correct as f64 / 4.0).abs() < 1e-12);
    assert_eq!(report.confusion.total(), 4);

    // each held-out row has a symptom signature unique to its category
    assert!((report.accuracy - 1.0).abs() < 1e-12, "{report}");
    assert_eq!(
        report.confusion.labels,
        vec!["Brain", "General", "Heart", "Respiratory"]
    );
    for class in &report.report.classes {
        assert_eq!(class.support, 1);
    }

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["rows"], 4);
    assert!(json["report"]["classes"].is_array());
    Ok(())
}

/// Evaluation before training fails fast
#[test]
fn test_evaluate_without_artifacts() {
    let fixture = fixture();
    let err = evaluate_from_config(&fixture.config).unwrap_err();
    assert!(matches!(err, TriageError::ConfigurationError(_)), "{err}");
}

/// An empty held-out table is a data error
#[test]
fn test_evaluate_empty_table() -> symptom_triage::Result<()> {
    let fixture = fixture();
    train_from_config(&fixture.config)?;

    let empty = fixture.path().join("Empty.csv");
    std::fs::write(&empty, "cough,prognosis\n")?;
    let config = TriageConfig {
        testing_data: empty,
        ..fixture.config.clone()
    };
    let err = evaluate_from_config(&config).unwrap_err();
    assert!(matches!(err, TriageError::DataError(_)), "{err}");
    Ok(())
}

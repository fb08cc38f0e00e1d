use std::sync::Arc;
use std::time::Duration;

use crate::utils::fixture;
use symptom_triage::{
    Confidence, ReferenceData, TriageEngine, load_engine_async, orchestrate_with_timeout,
    train_from_config,
};

/// Concurrent callers share one engine and get the same answers
#[tokio::test]
async fn test_shared_engine_across_tasks() -> symptom_triage::Result<()> {
    let fixture = fixture();
    train_from_config(&fixture.config)?;
    let engine = load_engine_async(fixture.config.clone()).await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            orchestrate_with_timeout(engine, "a dry cough".to_string(), Duration::from_secs(30))
                .await
        }));
    }

    let expected = engine.orchestrate("a dry cough")?;
    for handle in handles {
        let result = handle.await.expect("task panicked")?;
        assert_eq!(result, expected);
        assert!(matches!(result.confidence, Confidence::Numeric(_)));
    }
    Ok(())
}

/// The override path answers even when the classifier budget is zero
#[tokio::test]
async fn test_override_unaffected_by_timeout() -> symptom_triage::Result<()> {
    let engine = Arc::new(TriageEngine::rules_only(ReferenceData::default()));
    let result = orchestrate_with_timeout(
        engine,
        "fast heart rate and sweating".to_string(),
        Duration::ZERO,
    )
    .await?;
    assert_eq!(result.specialist, "Cardiologist");
    Ok(())
}

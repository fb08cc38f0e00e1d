//! Async wrappers around the triage engine
//!
//! The engine itself is synchronous. These helpers move the blocking work onto
//! tokio's blocking pool so an async caller is never stalled by artifact loading
//! or a slow classifier call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::triage::{InferenceResult, TriageEngine};

/// Load the engine on the blocking pool
///
/// # Errors
/// `ConfigurationError` when artifacts or reference data are missing, and
/// `InferenceUnavailable` when the loading task fails.
pub async fn load_engine_async(config: TriageConfig) -> Result<Arc<TriageEngine>> {
    let start = Instant::now();
    let engine = tokio::task::spawn_blocking(move || TriageEngine::load(&config))
        .await
        .map_err(|e| {
            TriageError::InferenceUnavailable(format!("Engine loading task failed: {e}"))
        })??;
    log::info!("Triage engine ready in {:?}", start.elapsed());
    Ok(Arc::new(engine))
}

/// Orchestrate one description with a bound on the classifier call
///
/// Overrides are checked inline first and are not subject to the timeout. The
/// classifier path runs on the blocking pool; if it does not finish within
/// `timeout` the caller gets `InferenceUnavailable` and the worker is left to
/// finish in the background.
///
/// # Errors
/// `InferenceUnavailable` on timeout or worker failure; any error from
/// [`TriageEngine::classify`] otherwise.
pub async fn orchestrate_with_timeout(
    engine: Arc<TriageEngine>,
    text: String,
    timeout: Duration,
) -> Result<InferenceResult> {
    if let Some(result) = engine.check_overrides(&text) {
        return Ok(result);
    }

    run_blocking_with_timeout(timeout, move || engine.classify(&text)).await
}

/// Run `work` on the blocking pool, giving up after `timeout`
async fn run_blocking_with_timeout<T, F>(timeout: Duration, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let worker = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(TriageError::InferenceUnavailable(format!(
            "Classifier task failed: {join_error}"
        ))),
        Err(_) => {
            log::warn!("Classifier call exceeded {timeout:?}");
            Err(TriageError::InferenceUnavailable(format!(
                "Classifier did not respond within {} ms",
                timeout.as_millis()
            )))
        }
    }
}

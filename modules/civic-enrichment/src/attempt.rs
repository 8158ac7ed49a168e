use std::future::Future;
use std::time::Duration;

use civic_common::{AttemptOutcome, ProviderAttempt};
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Run one provider call under `limit`. Expiry becomes `ProviderError::Timeout`
/// and the in-flight request is dropped.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(format!(
            "no answer within {:.1}s",
            limit.as_secs_f64()
        ))),
    }
}

/// Turn a provider result into its diagnostic attempt record, logging failures.
pub(crate) fn record<T>(provider: &str, result: &Result<T, ProviderError>) -> ProviderAttempt {
    match result {
        Ok(_) => {
            debug!(provider, "Provider attempt succeeded");
            ProviderAttempt::new(provider, AttemptOutcome::Success)
        }
        Err(e) => {
            warn!(provider, outcome = %e.outcome(), error = %e, "Provider attempt failed");
            ProviderAttempt::new(provider, e.outcome())
        }
    }
}

use crate::error::{AutodubError, Result};
use std::future::Future;
use std::time::Duration;

/// Run `future` under an optional deadline. Expiry becomes
/// [`AutodubError::Timeout`] naming `operation`.
pub async fn within<T, F>(deadline: Option<Duration>, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        None => future.await,
        Some(limit) => match tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => Err(AutodubError::Timeout {
                operation: operation.to_string(),
                seconds: limit.as_secs(),
            }),
        },
    }
}

//! Timeout configuration for remote calls.

use std::future::Future;
use std::time::Duration;

use crate::client::FetchError;
use crate::dependency::DependencyTag;

/// Timeout configuration for a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: Duration::from_millis(total.as_millis() as u64 / 4),
            total,
        }
    }

    /// Create from a dependency tag's default.
    pub fn from_tag(tag: DependencyTag) -> Self {
        Self::from_total(tag.default_timeout())
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_tag(DependencyTag::Search)
    }
}

/// Run a future under a deadline.
///
/// An elapsed deadline becomes `FetchError::Timeout`; the future is dropped.
pub async fn with_timeout<T, F>(limit: Duration, future: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total() {
        let config = TimeoutConfig::from_total(Duration::from_millis(2000));
        assert_eq!(config.connect, Duration::from_millis(500));
        assert_eq!(config.total, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let result: Result<(), FetchError> = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(FetchError::Timeout(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_through() {
        let ok = with_timeout(Duration::from_secs(1), async { Ok::<_, FetchError>(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: Result<u8, FetchError> = with_timeout(Duration::from_secs(1), async {
            Err(FetchError::Connection("refused".into()))
        })
        .await;
        assert!(matches!(err, Err(FetchError::Connection(_))));
    }
}

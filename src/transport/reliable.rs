use super::traits::ChatTransport;
use crate::BoxFuture;
use crate::error::TransportError;
use crate::session::types::{RoomId, RoomSummary};
use std::future::Future;
use std::time::Duration;

/// Bounded retry with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound for a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Sleep after failed attempt number `attempt` (zero-based):
    /// `base × 2^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Transport wrapper that retries timeouts, connection failures and 5xx
/// responses. Anything else surfaces after the first attempt.
pub struct ReliableTransport {
    inner: Box<dyn ChatTransport>,
    policy: RetryPolicy,
}

impl ReliableTransport {
    pub fn new(inner: Box<dyn ChatTransport>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy: RetryPolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn with_retries<'a, T, F, Fut>(
        &'a self,
        operation: &'static str,
        room_id: Option<RoomId>,
        mut call: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>> + 'a,
    {
        let max_attempts = self.policy.max_attempts;
        let timeout_ms = u64::try_from(self.policy.attempt_timeout.as_millis()).unwrap_or(u64::MAX);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(timeout_ms)),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            transport = self.inner.name(),
                            operation,
                            room_id = room_id.map(|id| id.0),
                            attempt = attempt + 1,
                            "Remote call recovered after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retriable() => {
                    tracing::warn!(
                        transport = self.inner.name(),
                        operation,
                        room_id = room_id.map(|id| id.0),
                        "Non-retriable failure: {err}"
                    );
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        transport = self.inner.name(),
                        operation,
                        room_id = room_id.map(|id| id.0),
                        attempt = attempt + 1,
                        max_attempts,
                        "Remote call failed: {err}"
                    );
                    last_error = Some(err);
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(TransportError::Exhausted {
            attempts: max_attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| TransportError::Connect("no attempt made".into())),
            ),
        })
    }
}

impl ChatTransport for ReliableTransport {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn send<'a>(
        &'a self,
        room_id: RoomId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String, TransportError>> {
        Box::pin(self.with_retries("send", Some(room_id), move || {
            self.inner.send(room_id, text)
        }))
    }

    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<RoomSummary>, TransportError>> {
        Box::pin(self.with_retries("list_rooms", None, || self.inner.list_rooms()))
    }
}

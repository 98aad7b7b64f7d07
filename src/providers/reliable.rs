use super::gemini::error_detail;
use super::gemini_types::GenerateContentRequest;
use super::scrub::sanitize_api_error;
use crate::config::{ReliabilityConfig, ServiceConfig};
use crate::error::{MailcraftError, ServiceError, ServiceErrorKind};
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Status and unparsed body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connect, DNS or connection-reset failures.
    Transient(String),
    Fatal(String),
}

/// One outbound attempt against the generative endpoint.
pub trait GenerateTransport: Send + Sync {
    fn post<'a>(
        &'a self,
        credential: &'a str,
        request: &'a GenerateContentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportFailure>> + Send + 'a>>;
}

impl<T: GenerateTransport + ?Sized> GenerateTransport for Arc<T> {
    fn post<'a>(
        &'a self,
        credential: &'a str,
        request: &'a GenerateContentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportFailure>> + Send + 'a>> {
        (**self).post(credential, request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    /// Jitter is drawn uniformly from `[0, max_jitter)`.
    pub max_jitter: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            max_jitter: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(reliability: &ReliabilityConfig, service: &ServiceConfig) -> Self {
        Self {
            max_attempts: reliability.max_attempts,
            base_backoff: Duration::from_millis(reliability.base_backoff_ms),
            max_jitter: Duration::from_millis(reliability.jitter_ms),
            attempt_timeout: Duration::from_secs(service.attempt_timeout_secs),
        }
    }

    /// Deterministic part of the delay before attempt `attempt + 1`:
    /// `base * 2^(attempt - 1)`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1_u32 << exponent)
    }

    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

/// Ephemeral per-call bookkeeping.
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    last_error: Option<(ServiceErrorKind, String)>,
    next_delay: Duration,
}

/// Remote call client: per-attempt timeout, retry on transient failures,
/// exponential backoff with jitter.
pub struct ReliableClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: GenerateTransport> ReliableClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// [`Self::call`] with the policy's attempt budget.
    pub async fn send(
        &self,
        credential: &str,
        request: &GenerateContentRequest,
    ) -> Result<RawResponse, MailcraftError> {
        self.call(credential, request, self.policy.max_attempts).await
    }

    /// Issue the request, retrying 429/503, per-attempt timeouts and
    /// transient transport failures. Any other non-success status is
    /// terminal and reported as [`MailcraftError::Protocol`].
    pub async fn call(
        &self,
        credential: &str,
        request: &GenerateContentRequest,
        max_attempts: u32,
    ) -> Result<RawResponse, MailcraftError> {
        let max_attempts = max_attempts.max(1);
        let mut state = RetryState::default();

        while state.attempt < max_attempts {
            if state.attempt > 0 {
                tokio::time::sleep(state.next_delay).await;
            }
            state.attempt += 1;

            // Dropping the in-flight future on timeout cancels the attempt.
            let outcome = tokio::time::timeout(
                self.policy.attempt_timeout,
                self.transport.post(credential, request),
            )
            .await;

            let (kind, detail) = match outcome {
                Ok(Ok(response)) if response.is_success() => {
                    if state.attempt > 1 {
                        tracing::info!(attempt = state.attempt, "AI service recovered after retries");
                    }
                    return Ok(response);
                }
                Ok(Ok(response)) => match ServiceErrorKind::from_status(response.status) {
                    Some(kind) => (kind, format!("transient status {}", response.status)),
                    None => {
                        tracing::warn!(
                            status = response.status,
                            attempt = state.attempt,
                            "AI service returned terminal status"
                        );
                        return Err(MailcraftError::Protocol {
                            status: response.status,
                            detail: error_detail(&response.body),
                        });
                    }
                },
                Ok(Err(TransportFailure::Transient(detail))) => {
                    (ServiceErrorKind::NetworkFailure, sanitize_api_error(&detail))
                }
                Ok(Err(TransportFailure::Fatal(detail))) => {
                    tracing::warn!(attempt = state.attempt, "non-retryable transport failure");
                    return Err(ServiceError {
                        kind: ServiceErrorKind::NetworkFailure,
                        attempts: state.attempt,
                        detail: sanitize_api_error(&detail),
                        attempt_timeout: self.policy.attempt_timeout,
                    }
                    .into());
                }
                Err(_elapsed) => (
                    ServiceErrorKind::Timeout,
                    format!(
                        "attempt exceeded {}s",
                        self.policy.attempt_timeout.as_secs()
                    ),
                ),
            };

            if state.attempt < max_attempts {
                state.next_delay = self.policy.backoff_delay(state.attempt);
                tracing::warn!(
                    attempt = state.attempt,
                    max_attempts,
                    kind = kind.as_str(),
                    delay_ms = u64::try_from(state.next_delay.as_millis()).unwrap_or(u64::MAX),
                    "AI service call failed, retrying"
                );
            }
            state.last_error = Some((kind, detail));
        }

        let (kind, detail) = state
            .last_error
            .unwrap_or((ServiceErrorKind::NetworkFailure, String::new()));
        tracing::warn!(
            attempts = state.attempt,
            kind = kind.as_str(),
            "AI service attempts exhausted"
        );
        Err(ServiceError {
            kind,
            attempts: state.attempt,
            detail,
            attempt_timeout: self.policy.attempt_timeout,
        }
        .into())
    }
}

use std::time::Duration;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Mail Craft.
///
/// Every layer of the rewrite pipeline reclassifies its failures into one of
/// these variants. Nothing reaches the UI context as an unstructured failure:
/// the dispatch router and the correlation channel turn each variant into a
/// failure response carrying [`MailcraftError::user_message`].
#[derive(Debug, Error)]
pub enum MailcraftError {
    // ── Input / credential pre-flight ───────────────────────────────────
    #[error("validation: {0}")]
    Validation(String),

    // ── Transient service failures (retried) ────────────────────────────
    #[error("service: {0}")]
    Service(#[from] ServiceError),

    // ── Terminal HTTP / envelope failures ───────────────────────────────
    #[error("protocol error (status {status}): {detail}")]
    Protocol { status: u16, detail: String },

    #[error("empty result from AI service")]
    EmptyResult,

    // ── Cross-context delivery ──────────────────────────────────────────
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    #[error("call timed out after {}s", after.as_secs())]
    TimedOut { after: Duration },

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

impl MailcraftError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Human-readable description rendered by the UI collaborator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Service(err) => err.user_message(),
            Self::Protocol { status, detail } => {
                let detail = if detail.is_empty() {
                    "Unknown error"
                } else {
                    detail.as_str()
                };
                format!("API Error ({status}): {detail}")
            }
            Self::EmptyResult => "Empty response from the AI service.".to_string(),
            Self::Channel(err) => err.user_message(),
            Self::TimedOut { .. } => "AI service timeout. Please try again.".to_string(),
            Self::Config(err) => err.to_string(),
        }
    }

    /// Short machine-readable label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Service(err) => err.kind.as_str(),
            Self::Protocol { .. } => "protocol",
            Self::EmptyResult => "empty_result",
            Self::Channel(_) => "channel",
            Self::TimedOut { .. } => "timed_out",
            Self::Config(_) => "config",
        }
    }
}

// ─── Service errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// HTTP 429.
    RateLimited,
    /// HTTP 503.
    Overloaded,
    /// Per-attempt deadline elapsed; the in-flight attempt was dropped.
    Timeout,
    /// Connect, DNS or connection-reset failure.
    NetworkFailure,
}

impl ServiceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Overloaded => "overloaded",
            Self::Timeout => "timeout",
            Self::NetworkFailure => "network_failure",
        }
    }

    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(Self::RateLimited),
            503 => Some(Self::Overloaded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{} after {attempts} attempt(s): {detail}", kind.as_str())]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub attempts: u32,
    pub detail: String,
    /// Per-attempt deadline in effect, reported in the timeout message.
    pub attempt_timeout: Duration,
}

impl ServiceError {
    pub fn user_message(&self) -> String {
        match self.kind {
            ServiceErrorKind::Overloaded => {
                "AI service is temporarily overloaded. Please try again in a few seconds."
                    .to_string()
            }
            ServiceErrorKind::RateLimited => {
                "Rate limit reached. Please wait a moment and try again.".to_string()
            }
            ServiceErrorKind::Timeout => format!(
                "AI request timed out ({}s).",
                self.attempt_timeout.as_secs()
            ),
            ServiceErrorKind::NetworkFailure => "Failed to reach AI service.".to_string(),
        }
    }
}

// ─── Channel errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("no response from background")]
    NoResponse,

    #[error("port closed before a matching response arrived")]
    PortClosed,
}

impl ChannelError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Delivery(message) => message.clone(),
            Self::NoResponse => "No response from background".to_string(),
            Self::PortClosed => "Connection to the background service was lost.".to_string(),
        }
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MailcraftError>;

//! Wire types exchanged between the UI context and the privileged context.

use crate::error::MailcraftError;
use crate::prompt::Tone;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Opaque single-shot token pairing a request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Ping,
    #[serde(alias = "rewriteEmail")]
    Rewrite,
    #[serde(alias = "validateApiKey")]
    ValidateCredential,
    /// Any action name this build does not know.
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Rewrite => "rewrite",
            Self::ValidateCredential => "validateCredential",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub action: Action,
    #[serde(alias = "requestId")]
    pub correlation_id: CorrelationId,
    #[serde(default)]
    pub payload: Value,
}

impl Request {
    /// New request with a fresh correlation id.
    pub fn new(action: Action, payload: Value) -> Self {
        Self {
            action,
            correlation_id: CorrelationId::generate(),
            payload,
        }
    }

    pub fn ping() -> Self {
        Self::new(Action::Ping, Value::Null)
    }

    pub fn rewrite(payload: &RewritePayload) -> Result<Self, MailcraftError> {
        Ok(Self::new(Action::Rewrite, to_payload(payload)?))
    }

    pub fn validate_credential(credential: &str) -> Result<Self, MailcraftError> {
        let payload = CredentialPayload {
            credential: credential.to_string(),
        };
        Ok(Self::new(Action::ValidateCredential, to_payload(&payload)?))
    }

    /// Same request under a different correlation id.
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Decode the action-specific payload.
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, MailcraftError> {
        T::deserialize(&self.payload).map_err(|e| {
            MailcraftError::validation(format!("Invalid {} payload: {e}", self.action))
        })
    }
}

fn to_payload<T: Serialize>(payload: &T) -> Result<Value, MailcraftError> {
    serde_json::to_value(payload)
        .map_err(|e| MailcraftError::validation(format!("Unserializable payload: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(alias = "requestId")]
    pub correlation_id: CorrelationId,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl Response {
    pub fn success(correlation_id: CorrelationId, result: Value) -> Self {
        Self {
            correlation_id,
            outcome: Outcome::Success,
            result: Some(result),
            error_description: None,
        }
    }

    pub fn failure(correlation_id: CorrelationId, description: impl Into<String>) -> Self {
        Self {
            correlation_id,
            outcome: Outcome::Failure,
            result: None,
            error_description: Some(description.into()),
        }
    }

    pub fn from_error(correlation_id: CorrelationId, err: &MailcraftError) -> Self {
        Self::failure(correlation_id, err.user_message())
    }

    /// Same response under a different correlation id.
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Result as text, for actions that answer with a string.
    pub fn result_text(&self) -> Option<&str> {
        self.result.as_ref().and_then(Value::as_str)
    }
}

// ── Action payloads ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewritePayload {
    #[serde(alias = "text")]
    pub source_text: String,
    /// Unknown tone names fall back to [`Tone::Formal`].
    #[serde(
        default,
        deserialize_with = "lenient_tone",
        skip_serializing_if = "Option::is_none"
    )]
    pub tone: Option<Tone>,
    #[serde(default, alias = "customPrompt", skip_serializing_if = "Option::is_none")]
    pub custom_instruction: Option<String>,
    #[serde(alias = "apiKey")]
    pub credential: String,
}

fn lenient_tone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Tone>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(|name| Tone::from_name(&name)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    #[serde(alias = "apiKey")]
    pub credential: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    /// Host clock in Unix milliseconds.
    pub ts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityResult {
    pub valid: bool,
}

use super::{ActionHandler, HandlerFuture};
use crate::auth::is_valid_credential_format;
use crate::config::Config;
use crate::error::MailcraftError;
use crate::normalize::normalize;
use crate::prompt::{Style, Tone, build_prompt};
use crate::providers::{GeminiClient, GenerateTransport, ReliableClient, build_request, extract_text};
use crate::transport::protocol::{
    CredentialPayload, PingResult, Request, RewritePayload, ValidityResult,
};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const INVALID_FORMAT: &str = "Invalid API key format";

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, MailcraftError> {
    serde_json::to_value(value).map_err(|e| MailcraftError::Protocol {
        status: 0,
        detail: format!("unserializable result: {e}"),
    })
}

// ── ping ──────────────────────────────────────────────────────────

pub struct PingHandler;

impl ActionHandler for PingHandler {
    fn handle<'a>(&'a self, _request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move {
            to_result(&PingResult {
                ts: chrono::Utc::now().timestamp_millis(),
            })
        })
    }
}

// ── validateCredential ────────────────────────────────────────────

/// Read-only liveness check of a credential against the service.
pub trait CredentialProbe: Send + Sync {
    fn probe<'a>(&'a self, credential: &'a str) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

impl CredentialProbe for GeminiClient {
    fn probe<'a>(&'a self, credential: &'a str) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(GeminiClient::probe(self, credential))
    }
}

pub struct ValidateCredentialHandler<P> {
    probe: Arc<P>,
}

impl<P: CredentialProbe> ValidateCredentialHandler<P> {
    pub fn new(probe: Arc<P>) -> Self {
        Self { probe }
    }
}

impl<P: CredentialProbe> ActionHandler for ValidateCredentialHandler<P> {
    fn handle<'a>(&'a self, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move {
            let payload: CredentialPayload = request.parse_payload()?;
            let valid = is_valid_credential_format(&payload.credential)
                && self.probe.probe(&payload.credential).await;
            tracing::info!(correlation_id = %request.correlation_id, valid, "credential validated");
            to_result(&ValidityResult { valid })
        })
    }
}

// ── rewrite ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub default_tone: Tone,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 700,
            default_tone: Tone::Formal,
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.service.temperature,
            max_output_tokens: config.service.max_output_tokens,
            default_tone: config.rewrite.default_tone,
        }
    }
}

pub struct RewriteHandler<T> {
    client: ReliableClient<T>,
    settings: GenerationSettings,
}

impl<T: GenerateTransport> RewriteHandler<T> {
    pub fn new(client: ReliableClient<T>, settings: GenerationSettings) -> Self {
        Self { client, settings }
    }

    async fn rewrite(&self, request: &Request) -> Result<String, MailcraftError> {
        let payload: RewritePayload = request.parse_payload()?;
        if !is_valid_credential_format(&payload.credential) {
            return Err(MailcraftError::validation(INVALID_FORMAT));
        }
        if payload.source_text.trim().is_empty() {
            return Err(MailcraftError::validation("Please write some text first!"));
        }

        let style = Style::resolve(
            payload.tone,
            payload.custom_instruction.as_deref(),
            self.settings.default_tone,
        );
        tracing::info!(
            correlation_id = %request.correlation_id,
            text_len = payload.source_text.len(),
            style = ?style,
            "rewrite start"
        );

        let prompt = build_prompt(&payload.source_text, &style);
        let body = build_request(
            &prompt,
            self.settings.temperature,
            self.settings.max_output_tokens,
        );
        let raw = self.client.send(&payload.credential, &body).await?;
        let generated = extract_text(&raw.body)?;
        let normalized = normalize(&generated).to_wire();

        tracing::info!(
            correlation_id = %request.correlation_id,
            chars = normalized.len(),
            "rewrite success"
        );
        Ok(normalized)
    }
}

impl<T: GenerateTransport + 'static> ActionHandler for RewriteHandler<T> {
    fn handle<'a>(&'a self, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move { self.rewrite(request).await.map(Value::String) })
    }
}

//! Google Gemini `generateContent` transport.
//!
//! The credential travels as the `key` query parameter. Every diagnostic that
//! might echo the URL back is scrubbed before it leaves this module.

use super::gemini_types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part,
};
use super::http_client::build_service_client;
use super::reliable::{GenerateTransport, RawResponse, TransportFailure};
use super::scrub::sanitize_api_error;
use crate::config::ServiceConfig;
use crate::error::{ConfigError, MailcraftError};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use url::Url;

pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    model: String,
}

impl GeminiClient {
    pub fn new(service: &ServiceConfig) -> Result<Self, MailcraftError> {
        Self::with_client(&service.endpoint, &service.model, build_service_client())
    }

    pub fn with_client(endpoint: &str, model: &str, client: Client) -> Result<Self, MailcraftError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ConfigError::Validation(format!("invalid service endpoint {endpoint:?}: {e}"))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ConfigError::Validation(format!(
                "service endpoint {endpoint} cannot carry a path"
            ))
            .into());
        }

        Ok(Self {
            client,
            endpoint,
            model: model.trim_start_matches("models/").to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url_for(&self, segments: &[&str], credential: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut().append_pair("key", credential);
        url
    }

    fn generate_url(&self, credential: &str) -> Url {
        let method = format!("{}:generateContent", self.model);
        self.url_for(&["models", &method], credential)
    }

    fn models_url(&self, credential: &str) -> Url {
        self.url_for(&["models"], credential)
    }

    /// Read-only credential probe: list models. Any failure, including a
    /// transport error, means "not valid".
    pub async fn probe(&self, credential: &str) -> bool {
        match self.client.get(self.models_url(credential)).send().await {
            Ok(response) => {
                let valid = response.status().is_success();
                tracing::debug!(status = response.status().as_u16(), valid, "credential probe");
                valid
            }
            Err(e) => {
                tracing::debug!(
                    "credential probe failed: {}",
                    sanitize_api_error(&e.without_url().to_string())
                );
                false
            }
        }
    }
}

impl GenerateTransport for GeminiClient {
    fn post<'a>(
        &'a self,
        credential: &'a str,
        request: &'a GenerateContentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportFailure>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.generate_url(credential))
                .json(request)
                .send()
                .await
                .map_err(classify_reqwest_error)?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify_reqwest_error)?;
            Ok(RawResponse { status, body })
        })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportFailure {
    let transient = err.is_timeout() || err.is_connect() || err.is_request() || err.is_body();
    let detail = err.without_url().to_string();
    if transient {
        TransportFailure::Transient(detail)
    } else {
        TransportFailure::Fatal(detail)
    }
}

/// Build the `generateContent` body for a single prompt.
pub fn build_request(prompt: &str, temperature: f64, max_output_tokens: u32) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens,
        },
    }
}

/// Extract generated text from a success envelope: the first candidate's
/// text parts joined with newlines.
pub fn extract_text(body: &str) -> Result<String, MailcraftError> {
    let envelope: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| MailcraftError::Protocol {
            status: 200,
            detail: format!("Failed to parse Gemini response: {e}"),
        })?;

    if let Some(err) = envelope.error {
        return Err(MailcraftError::Protocol {
            status: 200,
            detail: sanitize_api_error(&err.message),
        });
    }

    let Some(candidate) = envelope.candidates.first() else {
        tracing::warn!("Gemini envelope had no candidates");
        return Err(MailcraftError::EmptyResult);
    };

    let text = candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .map(|part| part.text.as_deref().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    let text = text.trim();

    if text.is_empty() {
        tracing::warn!(
            finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
            "Gemini candidate carried no text"
        );
        return Err(MailcraftError::EmptyResult);
    }

    Ok(text.to_string())
}

/// Diagnostic detail for a terminal status: the envelope's `error.message`
/// when present, otherwise the raw body.
pub(super) fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    sanitize_api_error(&detail)
}

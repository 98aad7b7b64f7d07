//! Dispatch router: the privileged context's single entry point.
//!
//! Requests arrive from either transport, are routed by [`Action`] to an
//! [`ActionHandler`], and always leave as a [`Response`] carrying the
//! request's correlation id. Handler failures become failure responses.

pub mod handlers;

use crate::config::Config;
use crate::error::MailcraftError;
use crate::providers::{GeminiClient, ReliableClient, RetryPolicy};
use crate::transport::protocol::{Action, Request, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use handlers::{
    CredentialProbe, GenerationSettings, PingHandler, RewriteHandler, ValidateCredentialHandler,
};

pub const UNKNOWN_ACTION: &str = "Unknown action";

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, MailcraftError>> + Send + 'a>>;

pub trait ActionHandler: Send + Sync {
    fn handle<'a>(&'a self, request: &'a Request) -> HandlerFuture<'a>;
}

/// Action → handler mapping handed to [`Dispatcher::register`].
#[derive(Default, Clone)]
pub struct HandlerTable {
    handlers: HashMap<Action, Arc<dyn ActionHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: Action, handler: impl ActionHandler + 'static) -> Self {
        self.insert(action, Arc::new(handler));
        self
    }

    pub fn insert(&mut self, action: Action, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(action, handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Registration point of the host messaging substrate.
pub trait Dispatcher {
    fn register(&mut self, table: HandlerTable);
}

#[derive(Default, Clone)]
pub struct DispatchRouter {
    table: HandlerTable,
}

impl Dispatcher for DispatchRouter {
    /// Later registrations replace earlier handlers for the same action.
    fn register(&mut self, table: HandlerTable) {
        self.table.handlers.extend(table.handlers);
    }
}

impl DispatchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router wired to the configured Gemini endpoint.
    pub fn from_config(config: &Config) -> Result<Self, MailcraftError> {
        let gemini = Arc::new(GeminiClient::new(&config.service)?);
        let client = ReliableClient::new(
            Arc::clone(&gemini),
            RetryPolicy::from_config(&config.reliability, &config.service),
        );

        let mut router = Self::new();
        router.register(
            HandlerTable::new()
                .with(Action::Ping, PingHandler)
                .with(
                    Action::ValidateCredential,
                    ValidateCredentialHandler::new(gemini),
                )
                .with(
                    Action::Rewrite,
                    RewriteHandler::new(
                        client,
                        GenerationSettings::from_config(config),
                    ),
                ),
        );
        Ok(router)
    }

    pub fn handles(&self, action: Action) -> bool {
        self.table.handlers.contains_key(&action)
    }

    /// Route one request. Never fails: errors become failure responses.
    pub async fn handle(&self, request: Request) -> Response {
        let correlation_id = request.correlation_id.clone();
        let Some(handler) = self.table.handlers.get(&request.action) else {
            tracing::warn!(
                correlation_id = %correlation_id,
                action = %request.action,
                "unknown action"
            );
            return Response::failure(correlation_id, UNKNOWN_ACTION);
        };

        tracing::debug!(correlation_id = %correlation_id, action = %request.action, "dispatching");
        match handler.handle(&request).await {
            Ok(result) => Response::success(correlation_id, result),
            Err(err) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    action = %request.action,
                    kind = err.kind(),
                    "handler failed: {err}"
                );
                Response::from_error(correlation_id, &err)
            }
        }
    }
}

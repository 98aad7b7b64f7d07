//! UI-side request correlation channel.
//!
//! Each call gets a fresh correlation id and resolves exactly once: with the
//! first response carrying that id, or with [`MailcraftError::TimedOut`] at
//! the overall deadline. Transport resources are released on every exit path;
//! on timeout that happens by dropping the exchange future.

use super::TransportStrategy;
use super::protocol::{CorrelationId, Request, Response};
use super::substrate::{DeliveryError, MessageSubstrate, Port};
use crate::config::ChannelConfig;
use crate::error::{ChannelError, MailcraftError};
use std::time::Duration;

/// Name the UI side uses when opening a port.
pub const PORT_NAME: &str = "mailcraft-port";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSettings {
    pub call_timeout: Duration,
    pub resend_delay: Duration,
    pub resend_attempts: u32,
    pub strategy: TransportStrategy,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::from_config(&ChannelConfig::default())
    }
}

impl ChannelSettings {
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self {
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            resend_delay: Duration::from_millis(config.resend_delay_ms),
            resend_attempts: config.resend_attempts,
            strategy: config.transport,
        }
    }
}

pub struct CorrelationChannel<S> {
    substrate: S,
    settings: ChannelSettings,
}

impl<S: MessageSubstrate> CorrelationChannel<S> {
    pub fn new(substrate: S, settings: ChannelSettings) -> Self {
        Self {
            substrate,
            settings,
        }
    }

    pub fn with_strategy(mut self, strategy: TransportStrategy) -> Self {
        self.settings.strategy = strategy;
        self
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    /// Send `request` under a fresh correlation id and wait for its response.
    ///
    /// The fresh id only lives on the wire. The returned response carries the
    /// caller's id so it pairs with `request` whatever the outcome.
    pub async fn send(&self, request: Request) -> Result<Response, MailcraftError> {
        let caller_id = request.correlation_id.clone();
        let request = request.with_correlation_id(CorrelationId::generate());
        let correlation_id = request.correlation_id.clone();
        let strategy = self.settings.strategy;
        tracing::debug!(
            correlation_id = %correlation_id,
            action = %request.action,
            transport = %strategy,
            "call start"
        );

        let exchange = async {
            match strategy {
                TransportStrategy::OneShot => self.send_one_shot(request, &correlation_id).await,
                TransportStrategy::Port => self.send_over_port(request, &correlation_id).await,
            }
        };

        match tokio::time::timeout(self.settings.call_timeout, exchange).await {
            Ok(outcome) => outcome.map(|response| response.with_correlation_id(caller_id)),
            Err(_) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    after_secs = self.settings.call_timeout.as_secs(),
                    "call timed out"
                );
                Err(MailcraftError::TimedOut {
                    after: self.settings.call_timeout,
                })
            }
        }
    }

    /// Like [`Self::send`], with every failure folded into a failure response.
    pub async fn call(&self, request: Request) -> Response {
        let caller_id = request.correlation_id.clone();
        match self.send(request).await {
            Ok(response) => response,
            Err(err) => Response::from_error(caller_id, &err),
        }
    }

    async fn send_one_shot(
        &self,
        request: Request,
        correlation_id: &CorrelationId,
    ) -> Result<Response, MailcraftError> {
        let mut resends = 0;
        loop {
            match self.substrate.send_message(request.clone()).await {
                Ok(Some(response)) if response.correlation_id == *correlation_id => {
                    return Ok(response);
                }
                Ok(Some(response)) => {
                    tracing::warn!(
                        correlation_id = %correlation_id,
                        received = %response.correlation_id,
                        "reply carried a foreign correlation id"
                    );
                    return Err(ChannelError::NoResponse.into());
                }
                Ok(None) => return Err(ChannelError::NoResponse.into()),
                Err(err) if err.is_transient() && resends < self.settings.resend_attempts => {
                    resends += 1;
                    tracing::warn!(
                        correlation_id = %correlation_id,
                        resend = resends,
                        delay_ms = u64::try_from(self.settings.resend_delay.as_millis())
                            .unwrap_or(u64::MAX),
                        "transient delivery error, re-sending: {err}"
                    );
                    tokio::time::sleep(self.settings.resend_delay).await;
                }
                Err(err) => return Err(delivery_failure(&err)),
            }
        }
    }

    async fn send_over_port(
        &self,
        request: Request,
        correlation_id: &CorrelationId,
    ) -> Result<Response, MailcraftError> {
        let mut port = self
            .substrate
            .connect(PORT_NAME)
            .await
            .map_err(|err| delivery_failure(&err))?;
        let outcome = exchange(port.as_mut(), request, correlation_id).await;
        port.disconnect();
        outcome
    }
}

async fn exchange(
    port: &mut dyn Port,
    request: Request,
    correlation_id: &CorrelationId,
) -> Result<Response, MailcraftError> {
    port.post(request).map_err(|err| delivery_failure(&err))?;
    while let Some(response) = port.recv().await {
        if response.correlation_id == *correlation_id {
            return Ok(response);
        }
        tracing::debug!(
            correlation_id = %correlation_id,
            received = %response.correlation_id,
            "ignoring response for another call"
        );
    }
    Err(ChannelError::PortClosed.into())
}

fn delivery_failure(err: &DeliveryError) -> MailcraftError {
    ChannelError::Delivery(err.to_string()).into()
}

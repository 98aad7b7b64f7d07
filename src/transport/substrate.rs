//! Host messaging substrate seen from the UI context.
//!
//! Two delivery shapes exist: a one-shot request/reply and a duplex port that
//! stays open for the length of one call.

use super::protocol::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The privileged context was recycled between send and reply.
    #[error("Extension context invalidated.")]
    ContextInvalidated,
    #[error("Could not establish connection. Receiving end does not exist.")]
    ReceivingEndAbsent,
    #[error("The message port closed before a response was received.")]
    PortClosed,
    /// Permanent capability absence; never retried.
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Other(String),
}

impl DeliveryError {
    /// Failures expected to clear once the privileged context wakes up.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ContextInvalidated | Self::ReceivingEndAbsent | Self::PortClosed
        )
    }
}

pub type DeliveryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DeliveryError>> + Send + 'a>>;

pub trait MessageSubstrate: Send + Sync {
    /// Deliver one request. `Ok(None)` means the receiver finished without replying.
    fn send_message<'a>(&'a self, request: Request) -> DeliveryFuture<'a, Option<Response>>;

    /// Open a duplex port to the privileged context.
    fn connect<'a>(&'a self, name: &'a str) -> DeliveryFuture<'a, Box<dyn Port>>;
}

impl<T: MessageSubstrate + ?Sized> MessageSubstrate for Arc<T> {
    fn send_message<'a>(&'a self, request: Request) -> DeliveryFuture<'a, Option<Response>> {
        (**self).send_message(request)
    }

    fn connect<'a>(&'a self, name: &'a str) -> DeliveryFuture<'a, Box<dyn Port>> {
        (**self).connect(name)
    }
}

/// Duplex channel to the privileged context. Dropping a port disconnects it.
pub trait Port: Send {
    fn post(&mut self, request: Request) -> Result<(), DeliveryError>;

    /// Next message from the other end; `None` once the port is closed.
    fn recv<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = Option<Response>> + Send + 'a>>;

    /// Idempotent.
    fn disconnect(&mut self);
}

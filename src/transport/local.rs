//! In-process privileged context.
//!
//! [`LocalHost`] owns a [`DispatchRouter`] and serves both delivery shapes of
//! the substrate. Every request runs on its own task. The host can be
//! suspended, resumed or recycled to reproduce the wake-up races a real
//! background worker goes through.

use super::protocol::{Request, Response};
use super::substrate::{DeliveryError, DeliveryFuture, MessageSubstrate, Port};
use crate::config::Config;
use crate::dispatch::DispatchRouter;
use crate::error::MailcraftError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    /// Deliveries fail with [`DeliveryError::ReceivingEndAbsent`]; open ports close.
    Suspended,
    /// The next delivery fails with [`DeliveryError::ContextInvalidated`].
    Recycling,
}

/// Counts a live resource for as long as the guard exists.
struct Tracked(Arc<AtomicUsize>);

impl Tracked {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct LocalHost {
    router: Arc<DispatchRouter>,
    lifecycle: Arc<watch::Sender<Lifecycle>>,
    open_ports: Arc<AtomicUsize>,
    pending_deliveries: Arc<AtomicUsize>,
}

impl LocalHost {
    pub fn new(router: DispatchRouter) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::Running);
        Self {
            router: Arc::new(router),
            lifecycle: Arc::new(lifecycle),
            open_ports: Arc::new(AtomicUsize::new(0)),
            pending_deliveries: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, MailcraftError> {
        Ok(Self::new(DispatchRouter::from_config(config)?))
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    pub fn suspend(&self) {
        tracing::info!("host suspended");
        self.lifecycle.send_replace(Lifecycle::Suspended);
    }

    pub fn resume(&self) {
        tracing::info!("host resumed");
        self.lifecycle.send_replace(Lifecycle::Running);
    }

    pub fn recycle(&self) {
        tracing::info!("host recycling");
        self.lifecycle.send_replace(Lifecycle::Recycling);
    }

    /// Ports the UI side has not yet released.
    pub fn open_ports(&self) -> usize {
        self.open_ports.load(Ordering::SeqCst)
    }

    /// One-shot deliveries whose caller is still waiting for the reply.
    pub fn pending_deliveries(&self) -> usize {
        self.pending_deliveries.load(Ordering::SeqCst)
    }

    fn admit(&self) -> Result<(), DeliveryError> {
        let mut refused = None;
        self.lifecycle.send_if_modified(|state| match *state {
            Lifecycle::Running => false,
            Lifecycle::Suspended => {
                refused = Some(DeliveryError::ReceivingEndAbsent);
                false
            }
            Lifecycle::Recycling => {
                refused = Some(DeliveryError::ContextInvalidated);
                *state = Lifecycle::Running;
                true
            }
        });
        match refused {
            Some(err) => {
                tracing::debug!("delivery refused: {err}");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

impl MessageSubstrate for LocalHost {
    fn send_message<'a>(&'a self, request: Request) -> DeliveryFuture<'a, Option<Response>> {
        Box::pin(async move {
            self.admit()?;
            let _pending = Tracked::new(&self.pending_deliveries);
            let router = Arc::clone(&self.router);
            let correlation_id = request.correlation_id.clone();
            // Dropping the caller's future leaves the handler running to completion.
            match tokio::spawn(async move { router.handle(request).await }).await {
                Ok(response) => Ok(Some(response)),
                Err(err) => {
                    tracing::warn!(correlation_id = %correlation_id, "handler task ended without reply: {err}");
                    Ok(None)
                }
            }
        })
    }

    fn connect<'a>(&'a self, name: &'a str) -> DeliveryFuture<'a, Box<dyn Port>> {
        Box::pin(async move {
            self.admit()?;
            let (request_tx, request_rx) = mpsc::unbounded_channel();
            let (response_tx, response_rx) = mpsc::unbounded_channel();
            tokio::spawn(serve_port(
                Arc::clone(&self.router),
                self.lifecycle.subscribe(),
                request_rx,
                response_tx,
            ));
            tracing::debug!(port = name, "port connected");
            let port: Box<dyn Port> = Box::new(LocalPort {
                requests: Some(request_tx),
                responses: response_rx,
                open: Some(Tracked::new(&self.open_ports)),
            });
            Ok(port)
        })
    }
}

/// Host side of one port. Exits when the UI side disconnects or the host is
/// suspended; in-flight handlers for the port are aborted with it.
async fn serve_port(
    router: Arc<DispatchRouter>,
    mut lifecycle: watch::Receiver<Lifecycle>,
    mut requests: mpsc::UnboundedReceiver<Request>,
    responses: mpsc::UnboundedSender<Response>,
) {
    let mut handlers = JoinSet::new();
    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(request) = request else { break };
                let router = Arc::clone(&router);
                let responses = responses.clone();
                handlers.spawn(async move {
                    let response = router.handle(request).await;
                    let _ = responses.send(response);
                });
            }
            changed = lifecycle.changed() => {
                if changed.is_err() || *lifecycle.borrow() == Lifecycle::Suspended {
                    tracing::debug!("port closed by host");
                    break;
                }
            }
            Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
        }
    }
}

struct LocalPort {
    requests: Option<mpsc::UnboundedSender<Request>>,
    responses: mpsc::UnboundedReceiver<Response>,
    open: Option<Tracked>,
}

impl Port for LocalPort {
    fn post(&mut self, request: Request) -> Result<(), DeliveryError> {
        let requests = self.requests.as_ref().ok_or(DeliveryError::PortClosed)?;
        requests.send(request).map_err(|_| DeliveryError::PortClosed)
    }

    fn recv<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = Option<Response>> + Send + 'a>> {
        Box::pin(self.responses.recv())
    }

    fn disconnect(&mut self) {
        self.requests = None;
        self.responses.close();
        self.open = None;
    }
}

impl Drop for LocalPort {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerTable, PingHandler};
    use crate::dispatch::Dispatcher;
    use crate::transport::protocol::Action;

    fn ping_host() -> LocalHost {
        let mut router = DispatchRouter::new();
        router.register(HandlerTable::new().with(Action::Ping, PingHandler));
        LocalHost::new(router)
    }

    #[tokio::test]
    async fn one_shot_delivery_replies_with_same_id() {
        let host = ping_host();
        let request = Request::ping();
        let id = request.correlation_id.clone();

        let response = host.send_message(request).await.unwrap().unwrap();
        assert!(response.is_success());
        assert_eq!(response.correlation_id, id);
        assert_eq!(host.pending_deliveries(), 0);
    }

    #[tokio::test]
    async fn recycle_fails_exactly_one_delivery() {
        let host = ping_host();
        host.recycle();

        let first = host.send_message(Request::ping()).await;
        assert_eq!(first.unwrap_err(), DeliveryError::ContextInvalidated);
        assert_eq!(host.lifecycle(), Lifecycle::Running);
        assert!(host.send_message(Request::ping()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn suspended_host_refuses_until_resumed() {
        let host = ping_host();
        host.suspend();
        assert_eq!(
            host.send_message(Request::ping()).await.unwrap_err(),
            DeliveryError::ReceivingEndAbsent
        );
        assert!(host.connect("test").await.is_err());

        host.resume();
        assert!(host.send_message(Request::ping()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn port_round_trip_and_release() {
        let host = ping_host();
        let mut port = host.connect("test").await.unwrap();
        assert_eq!(host.open_ports(), 1);

        let request = Request::ping();
        let id = request.correlation_id.clone();
        port.post(request).unwrap();
        let response = port.recv().await.unwrap();
        assert_eq!(response.correlation_id, id);

        port.disconnect();
        assert_eq!(host.open_ports(), 0);
        assert_eq!(port.post(Request::ping()), Err(DeliveryError::PortClosed));
        assert!(port.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_a_port_releases_it() {
        let host = ping_host();
        let port = host.connect("test").await.unwrap();
        assert_eq!(host.open_ports(), 1);
        drop(port);
        assert_eq!(host.open_ports(), 0);
    }

    #[tokio::test]
    async fn suspend_closes_open_ports() {
        let host = ping_host();
        let mut port = host.connect("test").await.unwrap();
        host.suspend();
        assert!(port.recv().await.is_none());
    }
}

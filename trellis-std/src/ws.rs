//! WebSocket upgrade negotiation.
//!
//! The wire protocol itself is out of scope; this module only defines the
//! handoff point. A [`WebSocketUpgrade`] handler resolves its lifecycle hook
//! set (possibly per event, possibly asynchronously) and answers with a
//! fixed `426 Upgrade Required` response carrying the resolved set as
//! response-extension metadata. An upgrade-capable transport looks for
//! [`ResolvedWebSocket`] in the response extensions and performs the actual
//! protocol switch; everything else just sends the 426 to the client.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::StatusCode;
use trellis_core::{BoxError, Event, Handler, Outcome, Response};

/// A message delivered to the socket lifecycle hooks.
#[derive(Debug, Clone)]
pub enum WsMessage {
    /// A text frame.
    Text(String),
    /// A binary frame.
    Binary(Bytes),
}

/// An established socket peer, as presented by the upgrade-capable
/// transport.
#[derive(Debug, Clone)]
pub struct WsPeer {
    id: u64,
}

impl WsPeer {
    /// Construct a peer handle. Called by the transport, not by handlers.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// Transport-assigned peer id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Upgrade-lifecycle callbacks. All methods default to no-ops, so an
/// implementation overrides only the moments it cares about.
#[async_trait]
pub trait WebSocketHooks: Send + Sync + 'static {
    /// A peer finished the upgrade.
    async fn on_open(&self, _peer: &WsPeer) {}

    /// A peer sent a message.
    async fn on_message(&self, _peer: &WsPeer, _message: WsMessage) {}

    /// A peer disconnected.
    async fn on_close(&self, _peer: &WsPeer, _reason: Option<String>) {}

    /// The transport reported a socket-level failure.
    async fn on_error(&self, _peer: &WsPeer, _error: BoxError) {}
}

/// Response-extension metadata: the resolved hook set, for an
/// upgrade-capable transport to consume.
#[derive(Clone)]
pub struct ResolvedWebSocket(
    /// The resolved lifecycle hook set.
    pub Arc<dyn WebSocketHooks>,
);

impl std::fmt::Debug for ResolvedWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResolvedWebSocket")
    }
}

type WsFactory =
    Box<dyn Fn(Event) -> BoxFuture<'static, Result<Arc<dyn WebSocketHooks>, BoxError>> + Send + Sync>;

/// How a handler obtains its hook set: a ready set, or a factory producing
/// one from the event (synchronously or asynchronously).
pub enum WsInit {
    /// A hook set shared by every request.
    Ready(Arc<dyn WebSocketHooks>),
    /// A per-event factory.
    Factory(WsFactory),
}

impl WsInit {
    /// Use one hook set for every request.
    pub fn hooks(hooks: impl WebSocketHooks) -> Self {
        Self::Ready(Arc::new(hooks))
    }

    /// Produce the hook set per event, asynchronously.
    pub fn factory<F, Fut>(factory: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn WebSocketHooks>, BoxError>> + Send + 'static,
    {
        Self::Factory(Box::new(move |event| Box::pin(factory(event))))
    }

    /// Produce the hook set per event, synchronously.
    pub fn factory_sync<F>(factory: F) -> Self
    where
        F: Fn(Event) -> Result<Arc<dyn WebSocketHooks>, BoxError> + Send + Sync + 'static,
    {
        Self::Factory(Box::new(move |event| {
            Box::pin(std::future::ready(factory(event)))
        }))
    }

    async fn resolve(&self, event: &Event) -> Result<Arc<dyn WebSocketHooks>, BoxError> {
        match self {
            Self::Ready(hooks) => Ok(hooks.clone()),
            Self::Factory(factory) => factory(event.clone()).await,
        }
    }
}

/// The upgrade-negotiation handler produced by [`websocket_handler`].
pub struct WebSocketUpgrade {
    init: WsInit,
}

/// Build a normal route handler from a hook set (or hook-set factory).
pub fn websocket_handler(init: WsInit) -> WebSocketUpgrade {
    WebSocketUpgrade { init }
}

impl Handler for WebSocketUpgrade {
    type Output = Result<Outcome, BoxError>;

    async fn call(&self, event: Event) -> Self::Output {
        let hooks = self.init.resolve(&event).await?;
        let mut response =
            Response::text("WebSocket upgrade is required.").with_status(StatusCode::UPGRADE_REQUIRED);
        response.extensions.insert(ResolvedWebSocket(hooks));
        Ok(Outcome::Respond(response))
    }
}

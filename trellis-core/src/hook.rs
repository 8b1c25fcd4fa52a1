//! Lifecycle hooks.
//!
//! A dispatch engine owns one [`Hooks`] set: `on_request` fires before the
//! registration walk, `on_before_response` fires after the response is
//! finalized (on both success and error paths), `on_error` fires when a
//! failure is caught at that engine's level.
//!
//! Containment versus propagation across nested engines is an explicit
//! result, [`ErrorFlow`], rather than a rethrow idiom: `Contained` means "the
//! error stops here, synthesize the response"; `Propagate` hands the error to
//! the parent engine's own catch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BoxError, HttpError};
use crate::event::Event;
use crate::response::Response;

/// Decision returned by [`ErrorHook::on_error`].
#[derive(Debug)]
pub enum ErrorFlow {
    /// The error is handled at this level; dispatch synthesizes the error
    /// response and returns it.
    Contained,
    /// Do not contain at this level: hand the error (the same one or a
    /// replacement) to the enclosing engine.
    Propagate(HttpError),
}

/// Fires before the registration walk.
///
/// An error returned here is treated exactly like a handler failure: it is
/// normalized and routed to this engine's [`ErrorHook`].
#[async_trait]
pub trait RequestHook: Send + Sync + 'static {
    /// Observe (and possibly reject) the inbound event.
    async fn on_request(&self, event: &Event) -> Result<(), BoxError>;
}

/// Fires once per request after the response is finalized, on both success
/// and error paths. Receives the same status/body ultimately sent.
#[async_trait]
pub trait ResponseHook: Send + Sync + 'static {
    /// Observe the outbound response.
    async fn on_before_response(&self, event: &Event, response: &Response)
    -> Result<(), BoxError>;
}

/// Fires when a failure is caught at this engine's level.
#[async_trait]
pub trait ErrorHook: Send + Sync + 'static {
    /// Observe the normalized error and decide containment.
    async fn on_error(&self, error: &HttpError, event: &Event) -> ErrorFlow;
}

// Blanket impls so plain synchronous closures work as hooks.

#[async_trait]
impl<F> RequestHook for F
where
    F: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn on_request(&self, event: &Event) -> Result<(), BoxError> {
        (self)(event)
    }
}

#[async_trait]
impl<F> ResponseHook for F
where
    F: Fn(&Event, &Response) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn on_before_response(
        &self,
        event: &Event,
        response: &Response,
    ) -> Result<(), BoxError> {
        (self)(event, response)
    }
}

#[async_trait]
impl<F> ErrorHook for F
where
    F: Fn(&HttpError, &Event) -> ErrorFlow + Send + Sync + 'static,
{
    async fn on_error(&self, error: &HttpError, event: &Event) -> ErrorFlow {
        (self)(error, event)
    }
}

/// The hook set owned by one dispatch engine instance.
///
/// Nested engines carry their own independent sets; a request passing
/// through a mount fires the hooks of every engine it traverses.
#[derive(Clone, Default)]
pub struct Hooks {
    on_request: Option<Arc<dyn RequestHook>>,
    on_before_response: Option<Arc<dyn ResponseHook>>,
    on_error: Option<Arc<dyn ErrorHook>>,
}

impl Hooks {
    /// An empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the request hook.
    pub fn on_request(mut self, hook: impl RequestHook) -> Self {
        self.on_request = Some(Arc::new(hook));
        self
    }

    /// Attach the before-response hook.
    pub fn on_before_response(mut self, hook: impl ResponseHook) -> Self {
        self.on_before_response = Some(Arc::new(hook));
        self
    }

    /// Attach the error hook.
    pub fn on_error(mut self, hook: impl ErrorHook) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Fire `on_request` if attached.
    pub async fn fire_request(&self, event: &Event) -> Result<(), BoxError> {
        match &self.on_request {
            Some(hook) => hook.on_request(event).await,
            None => Ok(()),
        }
    }

    /// Fire `on_before_response` if attached.
    pub async fn fire_before_response(
        &self,
        event: &Event,
        response: &Response,
    ) -> Result<(), BoxError> {
        match &self.on_before_response {
            Some(hook) => hook.on_before_response(event, response).await,
            None => Ok(()),
        }
    }

    /// Fire `on_error` if attached. An absent hook contains by default.
    pub async fn fire_error(&self, error: &HttpError, event: &Event) -> ErrorFlow {
        match &self.on_error {
            Some(hook) => hook.on_error(error, event).await,
            None => ErrorFlow::Contained,
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_request", &self.on_request.is_some())
            .field("on_before_response", &self.on_before_response.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

//! The uniform handler contract.
//!
//! Everything a registration can point at — an async closure, a wrapped
//! synchronous function, a lazily resolved handler, a whole nested engine —
//! implements [`Handler`]. From the dispatch engine's perspective they are
//! indistinguishable: one invocation signature, one output conversion.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Handler`] uses native `async fn` for zero-cost static dispatch. The
//! registration list needs runtime polymorphism, so [`DynHandler`] is the
//! object-safe boxed variant; a blanket impl converts automatically.

use std::future::Future;

use futures::future::BoxFuture;

use crate::error::BoxError;
use crate::event::Event;
use crate::response::{IntoOutcome, Outcome};

/// A request handler.
///
/// Receives the request's [`Event`] handle and produces any value that
/// converts through [`IntoOutcome`]: a body-like value to respond with,
/// `()`/`None` to decline and let the walk continue, or an error to fail the
/// dispatch.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a request handler",
    label = "missing `Handler` implementation",
    note = "Handlers are async closures `|event| async { .. }`, `SyncHandler` wrappers, or types implementing `Handler` directly."
)]
pub trait Handler: Send + Sync + 'static {
    /// The handler's return type, converted via [`IntoOutcome`].
    type Output: IntoOutcome + Send + 'static;

    /// Process one request.
    fn call(&self, event: Event) -> impl Future<Output = Self::Output> + Send;
}

// Blanket impl for async closures
impl<F, Fut, Out> Handler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
    Out: IntoOutcome + Send + 'static,
{
    type Output = Out;

    fn call(&self, event: Event) -> impl Future<Output = Self::Output> + Send {
        (self)(event)
    }
}

/// Object-safe version of [`Handler`].
///
/// The registration list stores `Arc<dyn DynHandler>`; the blanket impl
/// below lets any [`Handler`] be stored without an explicit bridge. The
/// output is already folded through [`IntoOutcome`].
pub trait DynHandler: Send + Sync + 'static {
    /// Process one request (dynamic dispatch version).
    fn call_dyn<'a>(&'a self, event: Event) -> BoxFuture<'a, Result<Outcome, BoxError>>;
}

impl<H: Handler> DynHandler for H {
    fn call_dyn<'a>(&'a self, event: Event) -> BoxFuture<'a, Result<Outcome, BoxError>> {
        Box::pin(async move { self.call(event).await.into_outcome() })
    }
}

/// Wrapper turning a plain synchronous function into a [`Handler`].
///
/// The wrapped function runs inline on the dispatch task; use it for quick,
/// non-blocking work.
///
/// # Example
///
/// ```rust,ignore
/// app.get("/ping", SyncHandler::new(|_event| "pong"))?;
/// ```
pub struct SyncHandler<F> {
    func: F,
}

impl<F> SyncHandler<F> {
    /// Wrap a synchronous function.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Out> Handler for SyncHandler<F>
where
    F: Fn(Event) -> Out + Send + Sync + 'static,
    Out: IntoOutcome + Send + 'static,
{
    type Output = Out;

    fn call(&self, event: Event) -> impl Future<Output = Self::Output> + Send {
        std::future::ready((self.func)(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[tokio::test]
    async fn async_closure_is_a_handler() {
        let handler = |_event: Event| async { "hello" };
        let outcome = handler
            .call_dyn(Event::new(Method::GET, "/"))
            .await
            .expect("outcome");
        assert!(matches!(outcome, Outcome::Respond(_)));
    }

    #[tokio::test]
    async fn sync_handler_matches_async_behavior() {
        let handler = SyncHandler::new(|_event| "hello");
        let outcome = handler
            .call_dyn(Event::new(Method::GET, "/"))
            .await
            .expect("outcome");
        assert!(matches!(outcome, Outcome::Respond(_)));
    }

    #[tokio::test]
    async fn unit_return_continues() {
        let handler = |_event: Event| async {};
        let outcome = handler
            .call_dyn(Event::new(Method::GET, "/"))
            .await
            .expect("outcome");
        assert!(matches!(outcome, Outcome::Continue));
    }
}

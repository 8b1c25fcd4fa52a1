//! Deferred handler resolution.
//!
//! A [`LazyHandler`] defers loading the real handler until the first request
//! that needs it. The resolver may complete synchronously or asynchronously
//! and may yield either a bare handler or a module-shaped container whose
//! `default` slot holds the handler — the [`LazyTarget`] union covers both
//! shapes, so call sites never special-case them.
//!
//! The first successful resolution is cached for the lifetime of the
//! wrapper. A failed resolution is NOT cached: the next invocation retries.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::OnceCell;

use crate::error::BoxError;
use crate::event::Event;
use crate::handler::{DynHandler, Handler};
use crate::response::Outcome;

/// Module-shaped resolver result: a container exposing the handler under the
/// well-known `default` slot.
pub struct HandlerModule {
    /// The handler the module exports.
    pub default: Arc<dyn DynHandler>,
}

/// What a resolver may yield. Unwrapped once at resolution time.
pub enum LazyTarget {
    /// A bare handler.
    Handler(Arc<dyn DynHandler>),
    /// A module-shaped container; its `default` slot is unwrapped.
    Module(HandlerModule),
}

impl LazyTarget {
    /// Wrap a bare handler.
    pub fn handler(handler: impl Handler) -> Self {
        Self::Handler(Arc::new(handler))
    }

    /// Wrap a handler behind a module's `default` slot.
    pub fn module(handler: impl Handler) -> Self {
        Self::Module(HandlerModule {
            default: Arc::new(handler),
        })
    }

    fn into_handler(self) -> Arc<dyn DynHandler> {
        match self {
            Self::Handler(handler) => handler,
            Self::Module(module) => module.default,
        }
    }
}

impl std::fmt::Debug for LazyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("LazyTarget::Handler"),
            Self::Module(_) => f.write_str("LazyTarget::Module"),
        }
    }
}

/// A handler resolver. Implemented for any closure returning a future of
/// [`LazyTarget`]; synchronous resolvers wrap their result in a ready future
/// (see [`lazy_sync`]).
pub trait ResolveHandler: Send + Sync + 'static {
    /// Produce the handler target.
    fn resolve(&self) -> BoxFuture<'_, Result<LazyTarget, BoxError>>;
}

impl<F, Fut> ResolveHandler for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LazyTarget, BoxError>> + Send + 'static,
{
    fn resolve(&self) -> BoxFuture<'_, Result<LazyTarget, BoxError>> {
        Box::pin((self)())
    }
}

/// A handler whose implementation is resolved on first use and cached.
///
/// Indistinguishable from a plain handler at the call site: same invocation
/// signature, same ability to answer on the first request.
pub struct LazyHandler<R> {
    resolver: R,
    resolved: OnceCell<Arc<dyn DynHandler>>,
}

impl<R: ResolveHandler> LazyHandler<R> {
    /// Wrap a resolver.
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            resolved: OnceCell::new(),
        }
    }
}

/// Wrap a synchronous resolver.
pub fn lazy_sync<F>(resolver: F) -> LazyHandler<impl ResolveHandler>
where
    F: Fn() -> Result<LazyTarget, BoxError> + Send + Sync + 'static,
{
    LazyHandler::new(move || std::future::ready(resolver()))
}

impl<R: ResolveHandler> Handler for LazyHandler<R> {
    type Output = Result<Outcome, BoxError>;

    async fn call(&self, event: Event) -> Self::Output {
        let handler = self
            .resolved
            .get_or_try_init(|| async {
                Ok::<_, BoxError>(self.resolver.resolve().await?.into_handler())
            })
            .await?;
        handler.call_dyn(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn invoke<R: ResolveHandler>(lazy: &LazyHandler<R>) -> Result<Outcome, BoxError> {
        lazy.call(Event::new(Method::GET, "/big")).await
    }

    #[tokio::test]
    async fn resolver_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let lazy = LazyHandler::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(LazyTarget::handler(|_event: Event| async { "lazy" })))
        });

        assert!(matches!(invoke(&lazy).await, Ok(Outcome::Respond(_))));
        assert!(matches!(invoke(&lazy).await, Ok(Outcome::Respond(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_resolution_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let lazy = LazyHandler::new(move || {
            let attempt = seen.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if attempt == 0 {
                Err(BoxError::from("module not ready"))
            } else {
                Ok(LazyTarget::module(|_event: Event| async { "lazy" }))
            })
        });

        assert!(invoke(&lazy).await.is_err());
        assert!(matches!(invoke(&lazy).await, Ok(Outcome::Respond(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sync_resolver_behaves_identically() {
        let lazy = lazy_sync(|| Ok(LazyTarget::handler(|_event: Event| async { "lazy" })));
        assert!(matches!(invoke(&lazy).await, Ok(Outcome::Respond(_))));
    }
}

//! The dispatch engine.
//!
//! An [`App`] owns an ordered list of route registrations and one hook set.
//! Handling a request walks the registrations in registration order, invokes
//! the first match, and keeps walking while handlers decline. Nested engines
//! are mounted as just another handler behind a [`WithBase`] rewrite, so
//! dispatch is recursive by composition: a mounted sub-engine runs its own
//! hooks, its own walk, and its own error containment.
//!
//! # Dispatch order
//!
//! 1. `on_request`
//! 2. the registration walk (first defined result wins)
//! 3. a 404 structured error if nothing answered
//! 4. on failure: normalize, `on_error`, contain or propagate
//! 5. `on_before_response` with the finalized response
//!
//! # Error containment
//!
//! A failure is contained at the nearest enclosing engine whose `on_error`
//! does not ask for propagation. Propagation re-raises the error into the
//! parent engine's own catch, where that engine's `on_error` observes the
//! same normalized error. A failure propagated out of the outermost engine
//! is surfaced to the adapter, which answers with a bare 500.

use std::sync::Arc;

use http::{Method, StatusCode};
use trellis_core::{
    BoxError, DynHandler, ErrorFlow, Event, Handler, Hooks, HttpError, Outcome, Response,
};

use crate::base::WithBase;
use crate::route::{RouteMatcher, RouterBuildError};

/// One entry of the registration list.
struct Registration {
    /// `None` matches every method.
    method: Option<Method>,
    /// `None` matches every path (bare middleware).
    matcher: Option<RouteMatcher>,
    handler: Arc<dyn DynHandler>,
}

impl Registration {
    fn accepts_method(&self, method: &Method) -> bool {
        match &self.method {
            Some(expected) => expected == method,
            None => true,
        }
    }
}

/// The dispatch engine: ordered registrations plus one hook set.
///
/// Registrations are added during application setup and are immutable once
/// traffic is served. The engine itself implements [`Handler`], which is what
/// makes mounting recursive: a sub-engine is simply another handler.
pub struct App {
    registrations: Vec<Registration>,
    hooks: Hooks,
    debug: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// An engine with no registrations and no hooks.
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            hooks: Hooks::new(),
            debug: false,
        }
    }

    /// An engine with the given hook set.
    pub fn with_hooks(hooks: Hooks) -> Self {
        Self {
            hooks,
            ..Self::new()
        }
    }

    /// Replace the hook set.
    pub fn hooks(&mut self, hooks: Hooks) -> &mut Self {
        self.hooks = hooks;
        self
    }

    /// Toggle diagnostic detail (message, cause chain) in error responses.
    pub fn debug(&mut self, enabled: bool) -> &mut Self {
        self.debug = enabled;
        self
    }

    /// Register a handler for one method and pattern.
    pub fn on(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<&mut Self, RouterBuildError> {
        self.push(Some(method), Some(RouteMatcher::new(pattern)?), handler);
        Ok(self)
    }

    /// Register a handler for every method on a pattern.
    pub fn all(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.push(None, Some(RouteMatcher::new(pattern)?), handler);
        Ok(self)
    }

    /// Register a handler that sees every request.
    pub fn middleware(&mut self, handler: impl Handler) -> &mut Self {
        self.push(None, None, handler);
        self
    }

    /// Mount a sub-engine (or any handler) under a path prefix.
    ///
    /// The mounted handler observes paths with `base` stripped; its result —
    /// success or its own contained error response — terminates this
    /// engine's walk.
    pub fn mount(&mut self, base: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        let matcher = RouteMatcher::for_prefix(base)?;
        self.push(None, Some(matcher), WithBase::new(base, handler));
        Ok(self)
    }

    /// Register a `GET` handler.
    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::GET, pattern, handler)
    }

    /// Register a `POST` handler.
    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::POST, pattern, handler)
    }

    /// Register a `PUT` handler.
    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::PUT, pattern, handler)
    }

    /// Register a `DELETE` handler.
    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::DELETE, pattern, handler)
    }

    /// Register a `PATCH` handler.
    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::PATCH, pattern, handler)
    }

    /// Register a `HEAD` handler.
    pub fn head(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::HEAD, pattern, handler)
    }

    /// Register an `OPTIONS` handler.
    pub fn options(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouterBuildError> {
        self.on(Method::OPTIONS, pattern, handler)
    }

    fn push(&mut self, method: Option<Method>, matcher: Option<RouteMatcher>, handler: impl Handler) {
        self.registrations.push(Registration {
            method,
            matcher,
            handler: Arc::new(handler),
        });
    }

    /// Dispatch one event.
    ///
    /// `Ok` carries the finalized response, including contained error
    /// responses. `Err` means this engine's `on_error` asked for propagation;
    /// the caller (a parent engine, or the adapter at the root) treats it as
    /// a thrown value.
    pub async fn handle(&self, event: Event) -> Result<Response, HttpError> {
        tracing::debug!(method = %event.method(), path = %event.path(), "dispatching");

        let walked: Result<Response, HttpError> = async {
            self.hooks
                .fire_request(&event)
                .await
                .map_err(HttpError::normalize)?;
            self.walk(&event).await
        }
        .await;

        let response = match walked {
            Ok(response) => response,
            Err(error) => {
                self.log_error(&error);
                match self.hooks.fire_error(&error, &event).await {
                    ErrorFlow::Contained => finalize(&event, error.to_response(self.debug)),
                    ErrorFlow::Propagate(error) => {
                        tracing::debug!(status = error.status().as_u16(), "propagating to parent");
                        return Err(error);
                    }
                }
            }
        };

        if let Err(error) = self.hooks.fire_before_response(&event, &response).await {
            return Err(HttpError::normalize(error));
        }
        Ok(response)
    }

    /// Walk the registrations in order; first defined result wins.
    async fn walk(&self, event: &Event) -> Result<Response, HttpError> {
        for registration in &self.registrations {
            if !registration.accepts_method(event.method()) {
                continue;
            }
            if let Some(matcher) = &registration.matcher {
                let path = event.path();
                match matcher.matches(&path) {
                    Some(params) => event.merge_params(params),
                    None => continue,
                }
            }
            match registration.handler.call_dyn(event.clone()).await {
                Ok(Outcome::Continue) => continue,
                Ok(Outcome::Respond(response)) => return Ok(finalize(event, response)),
                Err(error) => return Err(HttpError::normalize(error)),
            }
        }
        Ok(finalize(event, self.miss(event)))
    }

    /// The routing-miss response: a 404 structured error. Not a thrown
    /// failure, so `on_error` is not involved.
    fn miss(&self, event: &Event) -> Response {
        HttpError::not_found()
            .with_message(format!(
                "no route matched [{}] {}",
                event.method(),
                event.path()
            ))
            .to_response(self.debug)
    }

    fn log_error(&self, error: &HttpError) {
        if error.is_unhandled() {
            tracing::error!(status = error.status().as_u16(), error = %error, "unhandled failure");
        } else {
            tracing::warn!(status = error.status().as_u16(), error = %error, "request failed");
        }
    }
}

impl Handler for App {
    type Output = Result<Outcome, BoxError>;

    async fn call(&self, event: Event) -> Self::Output {
        match self.handle(event).await {
            Ok(response) => Ok(Outcome::Respond(response)),
            // Propagated out of this engine: re-raise into the caller's catch.
            Err(error) => Err(Box::new(error) as BoxError),
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("registrations", &self.registrations.len())
            .field("hooks", &self.hooks)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Apply the event's response-side fields to a handler-produced response.
///
/// An explicitly set event status wins only over the default `200`; a
/// response that already carries a non-default status keeps it. Event-set
/// headers are merged where the response does not already carry the name.
pub(crate) fn finalize(event: &Event, mut response: Response) -> Response {
    let head = event.response_head();
    if response.status == StatusCode::OK {
        if let Some(status) = head.status {
            response.status = status;
        }
    }
    for name in head.headers.keys() {
        if !response.headers.contains_key(name) {
            for value in head.headers.get_all(name) {
                response.headers.append(name.clone(), value.clone());
            }
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, HeaderValue};

    #[tokio::test]
    async fn first_defined_result_wins() {
        let mut app = App::new();
        app.middleware(|_event: Event| async {});
        app.get("/a", |_event: Event| async { "first" }).expect("route");
        app.get("/a", |_event: Event| async { "second" }).expect("route");

        let response = app
            .handle(Event::new(Method::GET, "/a"))
            .await
            .expect("response");
        let body = response.body.collect().await.expect("body");
        assert_eq!(&body[..], b"first");
    }

    #[tokio::test]
    async fn miss_is_a_404() {
        let app = App::new();
        let response = app
            .handle(Event::new(Method::GET, "/missing"))
            .await
            .expect("response");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn method_mismatch_skips() {
        let mut app = App::new();
        app.post("/only-post", |_event: Event| async { "posted" })
            .expect("route");
        let response = app
            .handle(Event::new(Method::GET, "/only-post"))
            .await
            .expect("response");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn finalize_applies_event_head() {
        let event = Event::new(Method::GET, "/");
        event.set_response_status(StatusCode::CREATED);
        event.append_response_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc"),
        );

        let finalized = finalize(&event, Response::text("made"));
        assert_eq!(finalized.status, StatusCode::CREATED);
        assert_eq!(
            finalized
                .headers
                .get("x-request-id")
                .map(HeaderValue::as_bytes),
            Some(b"abc".as_slice())
        );

        // A non-default status on the response itself is kept.
        let explicit = finalize(&event, Response::new(StatusCode::ACCEPTED));
        assert_eq!(explicit.status, StatusCode::ACCEPTED);
    }
}

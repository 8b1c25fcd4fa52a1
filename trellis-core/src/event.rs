//! The per-request event.
//!
//! An [`Event`] is constructed exactly once per inbound request by a runtime
//! adapter (or by a test) and carries everything the dispatch chain needs:
//! the request line and headers, the body slot, matcher-captured params, the
//! mutable context map, the response-side fields handlers set before
//! returning a body, and the cancellation signal.
//!
//! The handle is cheap to clone — clones share the same underlying request
//! state. Dispatch for one event is a single logical thread of cooperative
//! execution, so the interior locks are uncontended; they exist only to keep
//! the shared handle `Send + Sync`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::header::HeaderMap;
use http::{Method, StatusCode};

use crate::body::Body;
use crate::cancel::CancelSignal;
use crate::context::Context;

/// Mutable response-side fields handlers may set before returning a body.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    /// Status override. `None` means "whatever the returned value implies".
    pub status: Option<StatusCode>,
    /// Headers to merge into the finalized response.
    pub headers: HeaderMap,
}

struct EventInner {
    method: Method,
    path: Mutex<String>,
    query: Option<String>,
    headers: HeaderMap,
    params: Mutex<HashMap<String, String>>,
    context: Mutex<Context>,
    body: Mutex<Option<Body>>,
    response: Mutex<ResponseHead>,
    cancel: CancelSignal,
}

/// The uniform request/response carrier. One per request, never shared
/// across concurrent requests.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Event {
    /// A minimal event with the given request line and no headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self::builder(method, path).build()
    }

    /// Start building an event. Used by adapters and tests.
    pub fn builder(method: Method, path: impl Into<String>) -> EventBuilder {
        EventBuilder {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Body::Empty,
            context: Context::new(),
            cancel: CancelSignal::new(),
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// The request path as currently visible.
    ///
    /// Inside a mounted sub-engine the enclosing mount's base prefix has
    /// already been stripped.
    pub fn path(&self) -> String {
        lock(&self.inner.path).clone()
    }

    /// Replace the visible path. Mount plumbing; handlers normally only read.
    pub fn set_path(&self, path: impl Into<String>) {
        *lock(&self.inner.path) = path.into();
    }

    /// The raw query string, if the request had one.
    pub fn query(&self) -> Option<&str> {
        self.inner.query.as_deref()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// A path parameter captured by the route matcher.
    pub fn param(&self, name: &str) -> Option<String> {
        lock(&self.inner.params).get(name).cloned()
    }

    /// Merge matcher-captured parameters into the param lookup.
    pub fn merge_params<I>(&self, params: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        lock(&self.inner.params).extend(params);
    }

    /// Store a context value under `key`.
    pub fn context_insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        lock(&self.inner.context).insert(key, value);
    }

    /// Clone the context value under `key`, if present and of type `T`.
    pub fn context_get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        lock(&self.inner.context).get::<T>(key).cloned()
    }

    /// Whether a context value is stored under `key`.
    pub fn context_contains(&self, key: &str) -> bool {
        lock(&self.inner.context).contains(key)
    }

    /// Run `f` with mutable access to the whole context map.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        f(&mut lock(&self.inner.context))
    }

    /// Take the request body, leaving the slot empty.
    ///
    /// The body is meaningfully readable at most once; taking it again after
    /// consumption yields [`Body::Empty`].
    pub fn take_body(&self) -> Body {
        lock(&self.inner.body).take().unwrap_or_default()
    }

    /// Set the response status handlers want the finalized response to carry.
    pub fn set_response_status(&self, status: StatusCode) {
        lock(&self.inner.response).status = Some(status);
    }

    /// The response status set so far, if any.
    pub fn response_status(&self) -> Option<StatusCode> {
        lock(&self.inner.response).status
    }

    /// Append a header to the response side.
    pub fn append_response_header(
        &self,
        name: http::header::HeaderName,
        value: http::header::HeaderValue,
    ) {
        lock(&self.inner.response).headers.append(name, value);
    }

    /// Snapshot of the response-side fields.
    pub fn response_head(&self) -> ResponseHead {
        lock(&self.inner.response).clone()
    }

    /// The request's cancellation signal.
    pub fn cancellation(&self) -> CancelSignal {
        self.inner.cancel.clone()
    }

    /// Whether the transport has abandoned this request.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_triggered()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("method", &self.inner.method)
            .field("path", &self.path())
            .field("query", &self.inner.query)
            .finish()
    }
}

/// Builder for [`Event`]. Adapters fill in what their transport provides.
pub struct EventBuilder {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Body,
    context: Context,
    cancel: CancelSignal,
}

impl EventBuilder {
    /// Set the raw query string.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Replace the request headers wholesale.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Append a single request header.
    pub fn header(
        mut self,
        name: http::header::HeaderName,
        value: http::header::HeaderValue,
    ) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Seed the context map.
    pub fn context(mut self, context: Context) -> Self {
        self.context.absorb(context);
        self
    }

    /// Use the transport's cancellation signal instead of a fresh one.
    pub fn cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Finish construction.
    pub fn build(self) -> Event {
        Event {
            inner: Arc::new(EventInner {
                method: self.method,
                path: Mutex::new(self.path),
                query: self.query,
                headers: self.headers,
                params: Mutex::new(HashMap::new()),
                context: Mutex::new(self.context),
                body: Mutex::new(Some(self.body)),
                response: Mutex::new(ResponseHead::default()),
                cancel: self.cancel,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let event = Event::new(Method::GET, "/a");
        let clone = event.clone();
        event.context_insert("seen", true);
        assert_eq!(clone.context_get::<bool>("seen"), Some(true));
    }

    #[test]
    fn body_reads_once() {
        let event = Event::builder(Method::POST, "/upload")
            .body("payload".into())
            .build();
        assert!(matches!(event.take_body(), Body::Full(_)));
        assert!(matches!(event.take_body(), Body::Empty));
    }

    #[test]
    fn response_head_snapshot() {
        let event = Event::new(Method::GET, "/a");
        event.set_response_status(StatusCode::CREATED);
        let head = event.response_head();
        assert_eq!(head.status, Some(StatusCode::CREATED));
    }

    #[test]
    fn path_rewrites_are_shared() {
        let event = Event::new(Method::GET, "/nested/foo");
        let clone = event.clone();
        event.set_path("/foo");
        assert_eq!(clone.path(), "/foo");
    }
}

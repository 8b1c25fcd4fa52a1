//! Testing utilities.
//!
//! This module makes the dispatch engine's lifecycle observable from tests:
//! [`RecordingHooks`] is a complete hook set that counts and stores every
//! invocation, with an optional predicate deciding when `on_error` should
//! propagate instead of contain.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use http::StatusCode;
use trellis_core::{
    BoxError, ErrorFlow, ErrorHook, Event, Hooks, HttpError, RequestHook, Response, ResponseHook,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A hook set that records everything it observes.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHooks::new();
/// let mut app = App::with_hooks(recorder.hooks());
/// // ... dispatch ...
/// assert_eq!(recorder.request_paths(), vec!["/foo"]);
/// assert_eq!(recorder.error_count(), 0);
/// ```
pub struct RecordingHooks {
    requests: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<Vec<(String, StatusCode)>>>,
    errors: Arc<Mutex<Vec<HttpError>>>,
    propagate_when: Option<Arc<dyn Fn(&HttpError, &Event) -> bool + Send + Sync>>,
}

impl RecordingHooks {
    /// A recorder whose `on_error` always contains.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(Vec::new())),
            propagate_when: None,
        }
    }

    /// Propagate (instead of contain) whenever `predicate` answers true.
    pub fn propagate_when(
        mut self,
        predicate: impl Fn(&HttpError, &Event) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.propagate_when = Some(Arc::new(predicate));
        self
    }

    /// Wire this recorder up as a full hook set.
    pub fn hooks(&self) -> Hooks {
        Hooks::new()
            .on_request(self.clone())
            .on_before_response(self.clone())
            .on_error(self.clone())
    }

    /// Paths observed by `on_request`, in order.
    pub fn request_paths(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// Number of `on_request` invocations.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// `(path, status)` pairs observed by `on_before_response`, in order.
    pub fn responses(&self) -> Vec<(String, StatusCode)> {
        lock(&self.responses).clone()
    }

    /// Number of `on_before_response` invocations.
    pub fn response_count(&self) -> usize {
        lock(&self.responses).len()
    }

    /// Errors observed by `on_error`, in order.
    pub fn errors(&self) -> Vec<HttpError> {
        lock(&self.errors).clone()
    }

    /// Number of `on_error` invocations.
    pub fn error_count(&self) -> usize {
        lock(&self.errors).len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.requests).clear();
        lock(&self.responses).clear();
        lock(&self.errors).clear();
    }
}

impl Default for RecordingHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RecordingHooks {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            responses: self.responses.clone(),
            errors: self.errors.clone(),
            propagate_when: self.propagate_when.clone(),
        }
    }
}

#[async_trait]
impl RequestHook for RecordingHooks {
    async fn on_request(&self, event: &Event) -> Result<(), BoxError> {
        lock(&self.requests).push(event.path());
        Ok(())
    }
}

#[async_trait]
impl ResponseHook for RecordingHooks {
    async fn on_before_response(
        &self,
        event: &Event,
        response: &Response,
    ) -> Result<(), BoxError> {
        lock(&self.responses).push((event.path(), response.status));
        Ok(())
    }
}

#[async_trait]
impl ErrorHook for RecordingHooks {
    async fn on_error(&self, error: &HttpError, event: &Event) -> ErrorFlow {
        lock(&self.errors).push(error.clone());
        match &self.propagate_when {
            Some(predicate) if predicate(error, event) => ErrorFlow::Propagate(error.clone()),
            _ => ErrorFlow::Contained,
        }
    }
}

/// Collect a response body into text. Panics on a broken stream; test-only.
pub async fn response_text(response: Response) -> String {
    let bytes = response.body.collect().await.expect("response body");
    String::from_utf8_lossy(&bytes).into_owned()
}

//! Structured errors and normalization.
//!
//! Every failure that reaches the dispatch engine is normalized into an
//! [`HttpError`]: intentional application errors pass through unchanged,
//! anything else is wrapped with status 500 and flagged `unhandled`. The
//! normalized error is what error hooks observe and what the error response
//! is synthesized from.

use std::sync::Arc;

use http::StatusCode;
use http::header;
use serde_json::json;

use crate::response::Response;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The normalized failure representation.
///
/// Carries an HTTP status in `[400, 599]` (anything else is coerced to 500),
/// a message, optional structured `data`, an optional underlying `cause`, and
/// the `unhandled` flag. `unhandled` marks errors synthesized from unexpected
/// failures rather than ones application code raised on purpose; it drives
/// log severity and response masking, never propagation.
///
/// The type is cheap to clone so the same error object can be observed at
/// every nesting level that sees it.
#[derive(Debug, Clone)]
pub struct HttpError {
    status: StatusCode,
    message: String,
    data: Option<serde_json::Value>,
    cause: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
    unhandled: bool,
}

impl HttpError {
    /// Create an intentional error with the given status.
    ///
    /// A status outside `[400, 599]` is coerced to 500. The message defaults
    /// to the status line's canonical reason.
    pub fn new(status: StatusCode) -> Self {
        let status = if status.is_client_error() || status.is_server_error() {
            status
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: status
                .canonical_reason()
                .unwrap_or("error")
                .to_ascii_lowercase(),
            data: None,
            cause: None,
            unhandled: false,
        }
    }

    /// Shorthand for a 500 error.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Shorthand for a 404 error.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// Replace the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach structured data included in the error response body.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(Arc::from(cause.into()));
        self
    }

    /// Convert any boxed failure into a structured error.
    ///
    /// Values that already are [`HttpError`] pass through untouched; anything
    /// else is wrapped with status 500, `unhandled = true`, and the original
    /// value as the cause.
    pub fn normalize(error: BoxError) -> Self {
        match error.downcast::<HttpError>() {
            Ok(already) => *already,
            Err(other) => {
                let message = other.to_string();
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message,
                    data: None,
                    cause: Some(Arc::from(other)),
                    unhandled: true,
                }
            }
        }
    }

    /// The HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The attached structured data, if any.
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// The underlying cause, if any.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Whether this error was synthesized from an unexpected failure.
    pub fn is_unhandled(&self) -> bool {
        self.unhandled
    }

    /// Synthesize the client-facing error response.
    ///
    /// The body is JSON. Without `debug`, unhandled errors are masked down to
    /// the bare status line so internals never leak; with `debug`, the real
    /// message and the cause chain are included.
    pub fn to_response(&self, debug: bool) -> Response {
        let masked = self.unhandled && !debug;
        let mut body = json!({
            "status": self.status.as_u16(),
            "message": if masked {
                self.status.canonical_reason().unwrap_or("error")
            } else {
                self.message.as_str()
            },
        });
        if let (false, Some(data)) = (masked, &self.data) {
            body["data"] = data.clone();
        }
        if debug {
            if let Some(cause) = &self.cause {
                body["cause"] = json!(cause.to_string());
            }
        }
        let mut response = Response::new(self.status);
        response.headers.insert(
            header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response.body = body.to_string().into();
        response
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

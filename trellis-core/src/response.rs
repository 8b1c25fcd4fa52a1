//! Response model and handler-output conversion.
//!
//! A handler may return a string, a byte buffer, a stream, a serializable
//! value, a pre-built [`Response`], or nothing at all ("not handled, keep
//! walking"). [`IntoOutcome`] folds all of those shapes into the single
//! [`Outcome`] the dispatch engine consumes, so call sites never special-case
//! the return type.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Extensions, StatusCode};
use serde::Serialize;

use crate::body::Body;
use crate::error::BoxError;

/// A finalized response: status, headers, body, and side-channel extensions.
#[derive(Debug, Default)]
pub struct Response {
    /// The HTTP status.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The payload.
    pub body: Body,
    /// Typed side-channel metadata for the transport (for example the
    /// resolved WebSocket hook set).
    pub extensions: Extensions,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// A `200 OK` response with no body.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A plain-text response.
    pub fn text(text: impl Into<String>) -> Self {
        let mut response = Self::ok();
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response.body = text.into().into();
        response
    }

    /// A binary response.
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        let mut response = Self::ok();
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        response.body = bytes.into().into();
        response
    }

    /// A streaming response. The chunks are forwarded without buffering.
    pub fn streaming(body: Body) -> Self {
        let mut response = Self::ok();
        response.body = body;
        response
    }

    /// A JSON response from an already-serialized value.
    pub fn json_value(value: serde_json::Value) -> Self {
        let mut response = Self::ok();
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response.body = value.to_string().into();
        response
    }

    /// Override the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Append a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// What a handler invocation produced.
#[derive(Debug)]
pub enum Outcome {
    /// The handler declined the request; the walk continues with the next
    /// matching registration.
    Continue,
    /// The handler produced a response; the walk terminates.
    Respond(Response),
}

/// Conversion from a handler's return value into an [`Outcome`].
///
/// # Default Implementations
///
/// - `()` and `Option::None` → continue to the next registration
/// - strings, byte buffers, [`Body`], JSON values → a `200` response
/// - [`Response`] → used as-is
/// - `Result<T, E>` → delegates to `T` or surfaces the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a handler return value",
    label = "missing `IntoOutcome` implementation",
    note = "Handlers return (), a body-like value, a `Response`, an `Outcome`, or a `Result`/`Option` of one."
)]
pub trait IntoOutcome {
    /// Convert the value into dispatch behavior or a failure.
    fn into_outcome(self) -> Result<Outcome, BoxError>;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Continue)
    }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(self))
    }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(Response::text(self)))
    }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(Response::text(self)))
    }
}

impl IntoOutcome for Vec<u8> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(Response::bytes(self)))
    }
}

impl IntoOutcome for Bytes {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(Response::bytes(self)))
    }
}

impl IntoOutcome for Body {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(Response::streaming(self)))
    }
}

impl IntoOutcome for serde_json::Value {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Respond(Response::json_value(self)))
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        match self {
            Some(value) => value.into_outcome(),
            None => Ok(Outcome::Continue),
        }
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        match self {
            Ok(value) => value.into_outcome(),
            Err(error) => Err(error.into()),
        }
    }
}

/// Typed JSON return value. `Json(value)` serializes `value` and responds
/// with `application/json`.
#[derive(Debug, Clone)]
pub struct Json<T>(
    /// The value to serialize.
    pub T,
);

impl<T: Serialize> IntoOutcome for Json<T> {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        let value = serde_json::to_value(&self.0)?;
        Ok(Outcome::Respond(Response::json_value(value)))
    }
}

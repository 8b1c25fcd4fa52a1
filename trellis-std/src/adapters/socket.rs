//! Socket adapter: a hyper http1 connection pair.
//!
//! Translates `hyper::Request<Incoming>` (readable byte stream in) and
//! `hyper::Response` (writable stream out) to and from the uniform event
//! model, and runs the accept loop.
//!
//! Cancellation: the event's signal is triggered when the connection goes
//! away — either the connection task finishes (teardown, IO error) or a
//! streaming response body is dropped before completion (the client stopped
//! reading mid-stream). Handler code producing streaming output observes the
//! signal through the event and stops emitting; nothing is forcibly killed.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use http::StatusCode;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, BodyStream, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use trellis_core::{Body, BoxError, CancelSignal, Event, Handler, IntoOutcome, Outcome, Response};

use crate::app::finalize;

/// The response body shape handed to hyper. Streamed bodies are boxed
/// streams, which are `Send` but not `Sync`.
pub type SocketBody = UnsyncBoxBody<Bytes, BoxError>;

/// Bind `addr` and dispatch every connection through `handler`.
///
/// Accept failures are logged and the loop keeps going; only binding errors
/// are fatal.
pub async fn serve<H: Handler>(handler: H, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    let handler = Arc::new(handler);

    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(error = %error, "accept failed");
                continue;
            }
        };
        tracing::debug!(%remote, "connection accepted");
        let handler = handler.clone();

        tokio::spawn(async move {
            let cancel = CancelSignal::new();
            let conn_cancel = cancel.clone();
            let service = service_fn(move |request: hyper::Request<Incoming>| {
                let handler = handler.clone();
                let cancel = cancel.clone();
                async move { Ok::<_, Infallible>(respond(handler.as_ref(), request, cancel).await) }
            });

            let io = TokioIo::new(stream);
            if let Err(error) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                tracing::debug!(%remote, error = %error, "connection closed with error");
            }
            // The connection is gone; flag any in-flight handler code.
            conn_cancel.trigger();
        });
    }
}

/// Dispatch one native request through `handler`.
///
/// `cancel` is the connection's cancellation signal; it becomes the event's
/// signal and guards the streaming response body.
pub async fn respond<H: Handler>(
    handler: &H,
    request: hyper::Request<Incoming>,
    cancel: CancelSignal,
) -> hyper::Response<SocketBody> {
    let (parts, incoming) = request.into_parts();
    let event = match build_event(parts, request_body(incoming), cancel.clone()) {
        Ok(event) => event,
        Err(rejection) => return into_hyper(rejection, cancel),
    };

    let response = match handler.call(event.clone()).await.into_outcome() {
        Ok(Outcome::Respond(response)) => finalize(&event, response),
        Ok(Outcome::Continue) => Response::new(StatusCode::NOT_FOUND),
        Err(error) => {
            tracing::error!(error = %error, "failure escaped the outermost engine");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    into_hyper(response, event.cancellation())
}

/// Build the event, or a 400-class rejection for request shapes the event
/// model cannot represent.
fn build_event(
    parts: http::request::Parts,
    body: Body,
    cancel: CancelSignal,
) -> Result<Event, Response> {
    let path = parts.uri.path();
    if !path.starts_with('/') {
        return Err(Response::text("request target must be origin-form")
            .with_status(StatusCode::BAD_REQUEST));
    }
    let mut builder = Event::builder(parts.method, path)
        .headers(parts.headers)
        .body(body)
        .cancel(cancel);
    if let Some(query) = parts.uri.query() {
        builder = builder.query(query);
    }
    Ok(builder.build())
}

/// Expose the incoming frame stream as an event body.
fn request_body(incoming: Incoming) -> Body {
    let stream = BodyStream::new(incoming).filter_map(|frame| async move {
        match frame {
            Ok(frame) => frame.into_data().ok().map(Ok),
            Err(error) => Some(Err(Box::new(error) as BoxError)),
        }
    });
    Body::stream(stream)
}

fn into_hyper(response: Response, cancel: CancelSignal) -> hyper::Response<SocketBody> {
    let body = response_body(response.body, cancel);
    let mut out = hyper::Response::new(body);
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    *out.extensions_mut() = response.extensions;
    out
}

/// Convert the uniform body into hyper's shape. Buffered bodies are sent
/// whole; streaming bodies are forwarded chunk by chunk behind an abort
/// guard.
fn response_body(body: Body, cancel: CancelSignal) -> SocketBody {
    match body {
        Body::Empty => Full::new(Bytes::new()).map_err(absurd).boxed_unsync(),
        Body::Full(bytes) => Full::new(bytes).map_err(absurd).boxed_unsync(),
        Body::Stream(stream) => {
            let guarded = AbortGuard::new(stream.into_inner(), cancel);
            StreamBody::new(guarded.map(|chunk| chunk.map(Frame::data))).boxed_unsync()
        }
    }
}

fn absurd(never: Infallible) -> BoxError {
    match never {}
}

/// Triggers the cancellation signal if the stream is dropped before it
/// finished — the transport stopped reading mid-stream.
struct AbortGuard<S> {
    inner: S,
    cancel: CancelSignal,
    finished: bool,
}

impl<S> AbortGuard<S> {
    fn new(inner: S, cancel: CancelSignal) -> Self {
        Self {
            inner,
            cancel,
            finished: false,
        }
    }
}

impl<S> Stream for AbortGuard<S>
where
    S: Stream<Item = Result<Bytes, BoxError>> + Unpin,
{
    type Item = Result<Bytes, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<S> Drop for AbortGuard<S> {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel.trigger();
        }
    }
}

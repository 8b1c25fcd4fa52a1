//! Fetch-style adapter: `http::Request` in, `http::Response` out.
//!
//! The caller hands over a standard request value whose body is already a
//! [`Body`]; the adapter builds the event, runs the handler, and returns a
//! standard response. A [`CancelSignal`] placed in the request extensions is
//! adopted as the event's cancellation signal, mirroring a fetch request's
//! own abort signal.

use http::StatusCode;
use trellis_core::{Body, CancelSignal, Context, Event, Handler, IntoOutcome, Outcome, Response};

use crate::app::finalize;

/// Dispatch a request through `handler` and produce the response.
pub async fn respond<H: Handler>(handler: &H, request: http::Request<Body>) -> http::Response<Body> {
    respond_with(handler, request, Context::new()).await
}

/// Like [`respond`], with a context seed merged into the event's context map
/// at construction time.
pub async fn respond_with<H: Handler>(
    handler: &H,
    request: http::Request<Body>,
    context: Context,
) -> http::Response<Body> {
    let (parts, body) = request.into_parts();
    let cancel = parts
        .extensions
        .get::<CancelSignal>()
        .cloned()
        .unwrap_or_default();

    let mut builder = Event::builder(parts.method, parts.uri.path())
        .headers(parts.headers)
        .body(body)
        .context(context)
        .cancel(cancel);
    if let Some(query) = parts.uri.query() {
        builder = builder.query(query);
    }
    let event = builder.build();

    let response = match handler.call(event.clone()).await.into_outcome() {
        Ok(Outcome::Respond(response)) => finalize(&event, response),
        // An unhandled request maps to the default not-found response.
        Ok(Outcome::Continue) => Response::new(StatusCode::NOT_FOUND),
        // A failure escaping the outermost engine: bare 500, no further
        // hooks — nothing remains to catch it.
        Err(error) => {
            tracing::error!(error = %error, "failure escaped the outermost engine");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    into_http(response)
}

fn into_http(response: Response) -> http::Response<Body> {
    let mut out = http::Response::new(response.body);
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    *out.extensions_mut() = response.extensions;
    out
}

//! # trellis — Request Dispatch Engine
//!
//! `trellis` normalizes an inbound HTTP request into a uniform [`Event`],
//! walks an ordered list of registrations (middleware, terminal handlers,
//! nested mounted engines), fires lifecycle hooks around the request,
//! converts failures into structured error responses, and hands the result
//! back to the transport it came from.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::{App, Event};
//!
//! let mut app = App::new();
//! app.get("/hello/{name}", |event: Event| async move {
//!     format!("hello, {}", event.param("name").unwrap_or_default())
//! })?;
//!
//! // Serve over a socket...
//! trellis::adapters::socket::serve(app, addr).await?;
//! // ...or dispatch a standard request value directly.
//! let response = trellis::adapters::fetch::respond(&app, request).await;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use trellis_core::{
    // Body
    Body,
    // Errors
    BoxError,
    ByteStream,
    // Cancellation
    CancelSignal,
    // Context
    Context,
    ContextValue,
    // Handler contract
    DynHandler,
    // Hooks
    ErrorFlow,
    ErrorHook,
    // Event
    Event,
    EventBuilder,
    Handler,
    HandlerModule,
    Hooks,
    HttpError,
    // Response model
    IntoOutcome,
    Json,
    // Lazy resolution
    LazyHandler,
    LazyTarget,
    Outcome,
    RequestHook,
    ResolveHandler,
    Response,
    ResponseHead,
    ResponseHook,
    SyncHandler,
    lazy_sync,
};

pub use trellis_std::{App, RouteMatcher, RouterBuildError, WithBase};

/// Runtime adapters (socket and fetch-style).
pub mod adapters {
    pub use trellis_std::adapters::{fetch, socket};
}

/// WebSocket upgrade negotiation.
pub mod ws {
    pub use trellis_std::ws::{
        ResolvedWebSocket, WebSocketHooks, WebSocketUpgrade, WsInit, WsMessage, WsPeer,
        websocket_handler,
    };
}

/// Testing utilities.
pub mod testing {
    pub use trellis_std::testing::{RecordingHooks, response_text};
}

/// Prelude module - common imports for Trellis.
///
/// # Usage
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        App, Body, BoxError, CancelSignal, Context, ErrorFlow, Event, Handler, Hooks, HttpError,
        IntoOutcome, Json, Outcome, Response, SyncHandler,
    };
}

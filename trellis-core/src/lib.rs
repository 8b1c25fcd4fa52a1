//! # trellis-core
//!
//! Core types and traits for the Trellis request dispatch engine.
//!
//! This crate holds the transport-independent model; the dispatch engine,
//! route matching, and the runtime adapters live in `trellis-std`.
//!
//! # The Request Pipeline
//!
//! Every inbound request moves through the same four stations, each owned by
//! one abstraction in this crate:
//!
//! ## Station 1: Normalization ([`Event`])
//!
//! A runtime adapter converts its transport's native request into one
//! [`Event`]: method, path, headers, a read-once body slot, the per-request
//! context map, mutable response-side fields, and the cooperative
//! [`CancelSignal`].
//!
//! ## Station 2: Handling ([`Handler`])
//!
//! Everything dispatchable — async closures, [`SyncHandler`] wrappers,
//! [`LazyHandler`] deferred loads, whole nested engines — implements the one
//! [`Handler`] contract. [`DynHandler`] is the object-safe form the
//! registration list stores.
//!
//! ## Station 3: Outcome folding ([`IntoOutcome`])
//!
//! Handler return values (strings, buffers, streams, JSON, pre-built
//! responses, or "not handled") all fold into [`Outcome`], so the dispatch
//! walk never special-cases return types.
//!
//! ## Station 4: Lifecycle hooks ([`Hooks`])
//!
//! `on_request` fires before dispatch, `on_before_response` after the
//! response is finalized, `on_error` when a failure is caught at that
//! engine's level — with containment made explicit by [`ErrorFlow`].
//!
//! # Error Types
//!
//! - [`HttpError`] — the normalized structured failure
//! - [`BoxError`] — type-erased propagation alias

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod body;
mod cancel;
mod context;
mod error;
mod event;
mod handler;
mod hook;
mod lazy;
mod response;

// Re-exports
pub use body::{Body, ByteStream};
pub use cancel::CancelSignal;
pub use context::{Context, ContextValue};
pub use error::{BoxError, HttpError};
pub use event::{Event, EventBuilder, ResponseHead};
pub use handler::{DynHandler, Handler, SyncHandler};
pub use hook::{ErrorFlow, ErrorHook, Hooks, RequestHook, ResponseHook};
pub use lazy::{HandlerModule, LazyHandler, LazyTarget, ResolveHandler, lazy_sync};
pub use response::{IntoOutcome, Json, Outcome, Response};

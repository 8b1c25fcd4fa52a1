//! # trellis-std
//!
//! Standard implementations for the Trellis request dispatch engine: the
//! [`App`] dispatch engine, the `matchit`-backed route matcher, base-path
//! rewriting for nested mounts, the two runtime adapters, the WebSocket
//! upgrade stub, and testing utilities.
//!
//! The transport-independent model (events, handlers, hooks, errors) lives
//! in `trellis-core`.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod adapters;
mod app;
mod base;
mod route;
pub mod testing;
pub mod ws;

pub use app::App;
pub use base::WithBase;
pub use route::{RouteMatcher, RouterBuildError};

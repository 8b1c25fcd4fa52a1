//! Runtime adapters.
//!
//! An adapter is a pure translation boundary: it converts a transport's
//! native request into an [`Event`](trellis_core::Event), hands it to a
//! handler, and converts the result back. Two transports are supported:
//!
//! - [`socket`] — a hyper http1 connection: byte streams both ways,
//!   cancellation driven by connection teardown.
//! - [`fetch`] — plain `http::Request`/`http::Response` values: for
//!   embedding, testing, and fetch-shaped hosts.

pub mod fetch;
pub mod socket;

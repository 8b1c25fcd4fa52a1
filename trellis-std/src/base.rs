//! Base-path rewriting for nested mounts.
//!
//! A sub-engine mounted under `/nested` must see `/foo` for a request to
//! `/nested/foo`. [`WithBase`] wraps any [`Handler`] with that rewrite: strip
//! the prefix before the inner call, restore the original path afterwards so
//! the enclosing engine keeps observing the path it matched on.

use trellis_core::{BoxError, Event, Handler, IntoOutcome, Outcome};

use crate::route::normalize_prefix;

/// Wraps a handler so it observes paths relative to `base`.
pub struct WithBase<H> {
    base: String,
    inner: H,
}

impl<H> WithBase<H> {
    /// Wrap `inner` under the given base prefix.
    pub fn new(base: &str, inner: H) -> Self {
        Self {
            base: normalize_prefix(base),
            inner,
        }
    }

    /// The normalized base prefix.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn strip(&self, path: &str) -> Option<String> {
        if self.base.is_empty() {
            return None;
        }
        let rest = path.strip_prefix(self.base.as_str())?;
        if rest.is_empty() {
            Some(String::from("/"))
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            // `/nestedfoo` is not under `/nested`.
            None
        }
    }
}

impl<H: Handler> Handler for WithBase<H> {
    type Output = Result<Outcome, BoxError>;

    async fn call(&self, event: Event) -> Self::Output {
        let original = event.path();
        let Some(stripped) = self.strip(&original) else {
            return self.inner.call(event).await.into_outcome();
        };
        event.set_path(stripped);
        let result = self.inner.call(event.clone()).await.into_outcome();
        event.set_path(original);
        result
    }
}

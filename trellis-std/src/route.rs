//! Route pattern matching backend.
//!
//! Pattern matching itself is delegated to `matchit` (parameter and wildcard
//! syntax, e.g. `/users/{id}` or `/assets/{*rest}`). This module only wraps
//! one compiled pattern per registration: given a path it answers
//! matched/not-matched plus the captured parameters.

use matchit::Router as PatternRouter;
use thiserror::Error;

/// Parameter name used internally for the tail of a mount prefix pattern.
/// Never surfaced through the event's param lookup.
pub(crate) const MOUNT_TAIL: &str = "__trellis_mount_tail";

/// Errors from compiling a route pattern.
#[derive(Debug, Error)]
pub enum RouterBuildError {
    /// The pattern was rejected by the matching backend.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The backend's rejection.
        #[source]
        source: matchit::InsertError,
    },
}

/// One registration's compiled path pattern.
pub struct RouteMatcher {
    pattern: String,
    inner: PatternRouter<()>,
}

impl RouteMatcher {
    /// Compile a single pattern.
    pub fn new(pattern: &str) -> Result<Self, RouterBuildError> {
        let mut inner = PatternRouter::new();
        insert(&mut inner, pattern)?;
        Ok(Self {
            pattern: pattern.to_string(),
            inner,
        })
    }

    /// Compile a mount prefix: matches the prefix itself and everything
    /// below it.
    pub fn for_prefix(base: &str) -> Result<Self, RouterBuildError> {
        let base = normalize_prefix(base);
        let mut inner = PatternRouter::new();
        if base.is_empty() {
            insert(&mut inner, "/")?;
            insert(&mut inner, &format!("/{{*{MOUNT_TAIL}}}"))?;
        } else {
            insert(&mut inner, &base)?;
            insert(&mut inner, &format!("{base}/{{*{MOUNT_TAIL}}}"))?;
        }
        Ok(Self {
            pattern: base,
            inner,
        })
    }

    /// Match a path, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let matched = self.inner.at(path).ok()?;
        Some(
            matched
                .params
                .iter()
                .filter(|(name, _)| *name != MOUNT_TAIL)
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    /// The pattern (or mount prefix) this matcher was built from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl std::fmt::Debug for RouteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatcher")
            .field("pattern", &self.pattern)
            .finish()
    }
}

fn insert(router: &mut PatternRouter<()>, pattern: &str) -> Result<(), RouterBuildError> {
    router
        .insert(pattern, ())
        .map_err(|source| RouterBuildError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Normalize a mount prefix: leading slash, no trailing slash. `/` and the
/// empty string both mean "mount at the root".
pub(crate) fn normalize_prefix(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

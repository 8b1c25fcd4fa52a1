//! Per-request key-value context.
//!
//! A [`Context`] is the mutable scratch space handlers use to pass data along
//! the chain: an auth middleware stores the resolved user, a later handler
//! reads it. The map is owned exclusively by one event and lives exactly as
//! long as that request; values never leak across requests.

use std::any::Any;
use std::collections::HashMap;

/// A boxed context value. Any `Send + Sync` type can be stored.
pub type ContextValue = Box<dyn Any + Send + Sync>;

/// String-keyed map from key to arbitrary value, scoped to a single request.
#[derive(Default)]
pub struct Context {
    entries: HashMap<String, ContextValue>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value.
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Borrow the value under `key`, if present and of type `T`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|value| value.downcast_ref())
    }

    /// Remove and return the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.entries.remove(key)
    }

    /// Whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Move every entry of `other` into this context.
    ///
    /// Used by adapters to merge a caller-provided seed at event
    /// construction time.
    pub fn absorb(&mut self, other: Context) {
        self.entries.extend(other.entries);
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

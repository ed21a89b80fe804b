//! # Request-Scoped Result Cache
//!
//! Maps `(command key, cache key)` to a previously produced outcome. One
//! cache is owned by each [`RequestScope`](crate::scope::RequestScope) and is
//! discarded in full when the scope shuts down.
//!
//! ## Write policy
//!
//! Last write wins. `put` overwrites, and nothing serializes two commands
//! racing on the same key: both execute and the later `put` is what later
//! lookups see. The cache is advisory, not a mutual-exclusion barrier.
//!
//! Reads and writes are short `DashMap` shard operations; no lock is held
//! while user work runs.

use crate::command::CommandKey;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Identity of a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub command_key: CommandKey,
    pub cache_key: String,
}

impl CacheKey {
    pub fn new(command_key: CommandKey, cache_key: impl Into<String>) -> Self {
        Self {
            command_key,
            cache_key: cache_key.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.command_key, self.cache_key)
    }
}

/// A stored successful outcome, type-erased so one cache serves every command type
#[derive(Clone)]
pub struct CachedOutcome {
    value: Arc<dyn Any + Send + Sync>,
    from_fallback: bool,
    stored_at: DateTime<Utc>,
}

impl CachedOutcome {
    pub fn new<T>(value: T, from_fallback: bool) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            value: Arc::new(value),
            from_fallback,
            stored_at: Utc::now(),
        }
    }

    /// The stored value, or `None` if it was stored with a different type
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    /// Whether the stored value came from a fallback
    pub fn is_fallback(&self) -> bool {
        self.from_fallback
    }

    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }
}

impl fmt::Debug for CachedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedOutcome")
            .field("from_fallback", &self.from_fallback)
            .field("stored_at", &self.stored_at)
            .finish_non_exhaustive()
    }
}

/// Concurrent map of cached outcomes for one request scope
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<CacheKey, CachedOutcome>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedOutcome> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store an outcome, returning the one it replaced
    pub fn put(&self, key: CacheKey, outcome: CachedOutcome) -> Option<CachedOutcome> {
        self.entries.insert(key, outcome)
    }

    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&self, key: &CacheKey) -> Option<CachedOutcome> {
        self.entries.remove(key).map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

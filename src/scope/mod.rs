//! # Request Scopes
//!
//! A [`RequestScope`] brackets one logical request and owns its
//! [`ResultCache`]. Scopes are passed explicitly to every engine entry point
//! and cloned into any work spawned under them; there is no thread-local or
//! task-local ambient state.
//!
//! A [`RequestContext`] stands for the logical request itself. It holds at
//! most one live scope at a time, so initializing twice without a shutdown in
//! between is reported as [`CommandError::ScopeAlreadyInitialized`].
//!
//! ```rust
//! use command_core::scope::RequestContext;
//!
//! # fn main() -> Result<(), command_core::error::CommandError> {
//! let context = RequestContext::new();
//! let scope = context.initialize()?;
//! // ... execute commands with Some(&scope) ...
//! scope.shutdown()?;
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheKey, CachedOutcome, ResultCache};
use crate::command::CommandKey;
use crate::error::{CommandError, CommandResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use uuid::Uuid;

type ScopeSlot = Mutex<Option<RequestScope>>;

/// The logical request that scopes are created for
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    slot: Arc<ScopeSlot>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new scope and make it the current scope of this request
    pub fn initialize(&self) -> CommandResult<RequestScope> {
        let mut slot = self.slot.lock();

        if let Some(existing) = slot.as_ref().filter(|scope| scope.is_live()) {
            return Err(CommandError::ScopeAlreadyInitialized {
                scope_id: existing.id(),
            });
        }

        let scope = RequestScope::new(Arc::downgrade(&self.slot));
        *slot = Some(scope.clone());

        info!(
            scope_id = %scope.id(),
            "Request scope initialized"
        );

        Ok(scope)
    }

    /// The live scope of this request, if any
    pub fn current(&self) -> Option<RequestScope> {
        self.slot.lock().as_ref().filter(|scope| scope.is_live()).cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.current().is_some()
    }
}

#[derive(Debug)]
struct ScopeInner {
    id: Uuid,
    live: AtomicBool,
    cache: ResultCache,
    created_at: DateTime<Utc>,
    context: Weak<ScopeSlot>,
}

/// Handle to one request's scope. Clones share the same scope.
#[derive(Debug, Clone)]
pub struct RequestScope {
    inner: Arc<ScopeInner>,
}

impl RequestScope {
    fn new(context: Weak<ScopeSlot>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                live: AtomicBool::new(true),
                cache: ResultCache::new(),
                created_at: Utc::now(),
                context,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    /// Release the cache and detach from the owning request context.
    ///
    /// A second call fails with [`CommandError::ScopeNotActive`].
    pub fn shutdown(&self) -> CommandResult<()> {
        self.inner
            .live
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CommandError::ScopeNotActive {
                scope_id: self.inner.id,
            })?;

        let released = self.inner.cache.len();
        self.inner.cache.clear();

        if let Some(slot) = self.inner.context.upgrade() {
            let mut slot = slot.lock();
            if slot.as_ref().is_some_and(|current| current.id() == self.inner.id) {
                *slot = None;
            }
        }

        info!(
            scope_id = %self.inner.id,
            released_entries = released,
            "Request scope shut down"
        );

        Ok(())
    }

    /// Drop one cached entry from a live scope. Returns whether it existed.
    pub fn invalidate(&self, command_key: &CommandKey, cache_key: &str) -> CommandResult<bool> {
        if !self.is_live() {
            return Err(CommandError::ScopeNotActive {
                scope_id: self.inner.id,
            });
        }

        let key = CacheKey::new(command_key.clone(), cache_key);
        let removed = self.inner.cache.remove(&key).is_some();
        debug!(scope_id = %self.inner.id, cache_key = %key, removed, "Cache entry invalidated");
        Ok(removed)
    }

    /// Cache read; a scope that has shut down always misses
    pub(crate) fn lookup(&self, key: &CacheKey) -> Option<CachedOutcome> {
        if !self.is_live() {
            return None;
        }
        self.inner.cache.get(key)
    }

    /// Cache write; ignored once the scope has shut down
    pub(crate) fn store(&self, key: CacheKey, outcome: CachedOutcome) {
        if !self.is_live() {
            return;
        }
        self.inner.cache.put(key.clone(), outcome);

        // Shutdown may have cleared the cache between the check and the put
        if !self.is_live() {
            self.inner.cache.remove(&key);
        }
    }
}

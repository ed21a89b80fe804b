//! Single-use command wrapper with per-execution introspection.

use super::{Command, CommandKey};
use crate::error::{CommandError, CommandResult};
use crate::events::ExecutionEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happened during the one execution of a [`CommandInstance`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStatus {
    /// Events in the order they occurred
    pub events: Vec<ExecutionEvent>,
    pub from_cache: bool,
    pub from_fallback: bool,
    pub successful: bool,
    pub finished: bool,
}

struct InstanceInner<C> {
    command: C,
    command_key: CommandKey,
    started: AtomicBool,
    status: Mutex<ExecutionStatus>,
}

/// A command prepared for exactly one execution.
///
/// Cloning shares the same underlying instance, so a caller can keep a clone
/// for introspection after handing one to [`CommandEngine::queue`](crate::engine::CommandEngine::queue).
pub struct CommandInstance<C: Command> {
    inner: Arc<InstanceInner<C>>,
}

impl<C: Command> Clone for CommandInstance<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Command> std::fmt::Debug for CommandInstance<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInstance")
            .field("command_key", &self.inner.command_key)
            .field("started", &self.is_executed())
            .field("status", &*self.inner.status.lock())
            .finish()
    }
}

impl<C: Command> CommandInstance<C> {
    pub fn new(command: C) -> Self {
        let command_key = command.command_key();
        Self {
            inner: Arc::new(InstanceInner {
                command,
                command_key,
                started: AtomicBool::new(false),
                status: Mutex::new(ExecutionStatus::default()),
            }),
        }
    }

    pub fn command(&self) -> &C {
        &self.inner.command
    }

    pub fn command_key(&self) -> &CommandKey {
        &self.inner.command_key
    }

    /// Claim the single execution slot of this instance
    pub(crate) fn mark_started(&self) -> CommandResult<()> {
        self.inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| CommandError::AlreadyExecuted {
                command_key: self.inner.command_key.clone(),
            })
    }

    pub(crate) fn record_event(&self, event: ExecutionEvent) {
        self.inner.status.lock().events.push(event);
    }

    pub(crate) fn complete(&self, from_cache: bool, from_fallback: bool, successful: bool) {
        let mut status = self.inner.status.lock();
        status.from_cache = from_cache;
        status.from_fallback = from_fallback;
        status.successful = successful;
        status.finished = true;
    }

    /// Whether the instance has been submitted to an engine
    pub fn is_executed(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    pub fn is_response_from_cache(&self) -> bool {
        self.inner.status.lock().from_cache
    }

    pub fn is_response_from_fallback(&self) -> bool {
        self.inner.status.lock().from_fallback
    }

    /// True when the primary operation (or a cached primary result) produced the value
    pub fn is_successful_execution(&self) -> bool {
        let status = self.inner.status.lock();
        status.finished && status.successful && !status.from_fallback
    }

    pub fn is_failed_execution(&self) -> bool {
        let status = self.inner.status.lock();
        status.finished && !status.successful
    }

    pub fn execution_events(&self) -> Vec<ExecutionEvent> {
        self.inner.status.lock().events.clone()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.inner.status.lock().clone()
    }
}

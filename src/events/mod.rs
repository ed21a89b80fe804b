//! # Execution Events
//!
//! Every command invocation emits a short, ordered sequence of
//! [`ExecutionEvent`]s to the listeners registered on the engine. Metrics,
//! health tracking and log shipping hook in here.

pub mod publisher;

pub use publisher::{EventPublisher, PublishedEvent};

use crate::command::CommandKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable step of one command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Outcome served from the request-scoped cache; nothing was executed
    CacheHit,
    /// `run()` produced a value
    PrimarySuccess,
    /// `run()` failed or panicked
    PrimaryFailure,
    /// The execution gate rejected the call; `run()` was not attempted
    ShortCircuited,
    /// `fallback()` produced a value
    FallbackSuccess,
    /// `fallback()` failed, is not implemented, or is disabled
    FallbackFailure,
}

impl ExecutionEvent {
    pub const ALL: [ExecutionEvent; 6] = [
        ExecutionEvent::CacheHit,
        ExecutionEvent::PrimarySuccess,
        ExecutionEvent::PrimaryFailure,
        ExecutionEvent::ShortCircuited,
        ExecutionEvent::FallbackSuccess,
        ExecutionEvent::FallbackFailure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionEvent::CacheHit => "cache_hit",
            ExecutionEvent::PrimarySuccess => "primary_success",
            ExecutionEvent::PrimaryFailure => "primary_failure",
            ExecutionEvent::ShortCircuited => "short_circuited",
            ExecutionEvent::FallbackSuccess => "fallback_success",
            ExecutionEvent::FallbackFailure => "fallback_failure",
        }
    }

    /// Events that mean the caller did not get the primary result
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ExecutionEvent::PrimaryFailure
                | ExecutionEvent::ShortCircuited
                | ExecutionEvent::FallbackFailure
        )
    }
}

impl fmt::Display for ExecutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives execution events as they occur.
///
/// Called synchronously on the executing task, so implementations must be
/// cheap and must not block.
pub trait ExecutionEventListener: Send + Sync + fmt::Debug {
    fn on_event(&self, command_key: &CommandKey, event: ExecutionEvent);
}

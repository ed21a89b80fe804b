//! Error types for command execution.
//!
//! User work reports failures as [`anyhow::Error`]. The engine never lets a
//! primary failure escape on its own: it is always folded, together with the
//! fallback's cause, into [`CommandError::FallbackFailure`].

use crate::command::CommandKey;
use thiserror::Error;
use uuid::Uuid;

/// Why the primary path did not produce a value
#[derive(Debug, Error)]
pub enum PrimaryFailure {
    /// `run()` returned an error
    #[error("primary operation failed: {0}")]
    Failed(anyhow::Error),

    /// `run()` panicked
    #[error("primary operation panicked: {0}")]
    Panicked(String),

    /// The execution gate rejected the call before `run()` was attempted
    #[error("execution short-circuited by gate")]
    ShortCircuited,
}

/// Why the fallback path did not produce a value
#[derive(Debug, Error)]
pub enum FallbackError {
    /// The command did not override `fallback()`
    #[error("fallback not implemented")]
    NotImplemented,

    /// Fallbacks are switched off for this command by configuration
    #[error("fallback disabled by configuration")]
    Disabled,

    /// `fallback()` itself failed
    #[error("fallback failed: {0}")]
    Failed(#[from] anyhow::Error),
}

impl FallbackError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, FallbackError::NotImplemented)
    }
}

/// Errors surfaced to callers of the engine
#[derive(Debug, Error)]
pub enum CommandError {
    /// Terminal failure: the primary path failed and so did the fallback
    #[error("{command_key} failed ({primary}) and fallback failed ({fallback})")]
    FallbackFailure {
        command_key: CommandKey,
        primary: PrimaryFailure,
        fallback: FallbackError,
    },

    /// The command instance was already submitted once
    #[error("{command_key} was already executed; command instances are single-use")]
    AlreadyExecuted { command_key: CommandKey },

    /// Scope lifecycle misuse, e.g. shutting a scope down twice
    #[error("request scope {scope_id} is not active")]
    ScopeNotActive { scope_id: Uuid },

    /// A live scope already exists for this request context
    #[error("request scope {scope_id} is already initialized for this request")]
    ScopeAlreadyInitialized { scope_id: Uuid },

    /// No async runtime to spawn onto (`queue`) or drive the command with (`execute_blocking`)
    #[error("{command_key} cannot run: no async runtime available")]
    RuntimeUnavailable { command_key: CommandKey },

    /// A queued command's task ended before producing an outcome
    #[error("{command_key} was interrupted: {reason}")]
    Interrupted {
        command_key: CommandKey,
        reason: String,
    },
}

impl CommandError {
    /// The primary cause of a terminal failure, if this is one
    pub fn primary_cause(&self) -> Option<&PrimaryFailure> {
        match self {
            CommandError::FallbackFailure { primary, .. } => Some(primary),
            _ => None,
        }
    }

    /// The fallback cause of a terminal failure, if this is one
    pub fn fallback_cause(&self) -> Option<&FallbackError> {
        match self {
            CommandError::FallbackFailure { fallback, .. } => Some(fallback),
            _ => None,
        }
    }

    /// Caller usage errors are never retried and never routed to a fallback
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CommandError::AlreadyExecuted { .. }
                | CommandError::ScopeNotActive { .. }
                | CommandError::ScopeAlreadyInitialized { .. }
                | CommandError::RuntimeUnavailable { .. }
        )
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

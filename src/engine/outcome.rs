//! Outcomes of command execution as plain data.

use crate::error::{CommandError, CommandResult};
use crate::events::ExecutionEvent;

/// Tagged result of one command execution
#[derive(Debug)]
pub enum Outcome<T> {
    /// The primary operation produced the value
    Success(T),
    /// The primary path failed and the fallback produced the value
    FallbackSuccess(T),
    /// Both paths failed; the error carries both causes
    Failure(CommandError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::FallbackSuccess(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) | Outcome::FallbackSuccess(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CommandError> {
        match self {
            Outcome::Failure(error) => Some(error),
            _ => None,
        }
    }

    pub fn into_result(self) -> CommandResult<T> {
        match self {
            Outcome::Success(value) | Outcome::FallbackSuccess(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

/// An [`Outcome`] plus how it was obtained
#[derive(Debug)]
pub struct ExecutionResult<T> {
    pub outcome: Outcome<T>,
    pub from_cache: bool,
    /// Events emitted by this execution, in order
    pub events: Vec<ExecutionEvent>,
}

impl<T> ExecutionResult<T> {
    pub fn was_from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn was_fallback(&self) -> bool {
        self.outcome.is_fallback()
    }

    pub fn into_result(self) -> CommandResult<T> {
        self.outcome.into_result()
    }
}

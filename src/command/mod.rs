//! # Commands
//!
//! A [`Command`] is a unit of work with a primary operation, an optional
//! fallback, and an optional cache key. Commands are wrapped in a
//! [`CommandInstance`] before submission; an instance is single-use and keeps
//! the introspection flags of its one execution.
//!
//! ```rust,no_run
//! use command_core::command::Command;
//! use command_core::error::FallbackError;
//!
//! struct HelloFailure {
//!     name: String,
//! }
//!
//! #[async_trait::async_trait]
//! impl Command for HelloFailure {
//!     type Output = String;
//!
//!     async fn run(&self) -> anyhow::Result<String> {
//!         anyhow::bail!("this command always fails")
//!     }
//!
//!     async fn fallback(&self) -> Result<String, FallbackError> {
//!         Ok(format!("Hello Failure {}!", self.name))
//!     }
//! }
//! ```

pub mod instance;

pub use instance::{CommandInstance, ExecutionStatus};

use crate::error::FallbackError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a command type, used in cache keys, metrics and logs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandKey(String);

impl CommandKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive a key from a Rust type, dropping the module path.
    ///
    /// `my_app::commands::GetUser<my_app::Id>` becomes `GetUser<my_app::Id>`.
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let generics_at = full.find('<').unwrap_or(full.len());
        let (path, generics) = full.split_at(generics_at);
        let name = path.rsplit("::").next().unwrap_or(path);
        Self(format!("{name}{generics}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CommandKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A unit of work executed by the [`CommandEngine`](crate::engine::CommandEngine).
///
/// `run` and `fallback` may perform I/O but must not assume exclusive access
/// to shared mutable state beyond what the caller guarantees.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// Value produced by the primary operation or the fallback
    type Output: Clone + Send + Sync + 'static;

    /// Command-type identifier. Defaults to the implementing type's name.
    fn command_key(&self) -> CommandKey {
        CommandKey::of::<Self>()
    }

    /// Logical group the command belongs to, used for log grouping
    fn group_key(&self) -> &str {
        "default"
    }

    /// The primary operation
    async fn run(&self) -> anyhow::Result<Self::Output>;

    /// Degraded substitute used when `run` fails or is short-circuited.
    ///
    /// The default reports [`FallbackError::NotImplemented`], meaning the
    /// command did not opt into degradation.
    async fn fallback(&self) -> Result<Self::Output, FallbackError> {
        Err(FallbackError::NotImplemented)
    }

    /// Key under which the outcome is cached within a request scope.
    /// `None` disables caching for this command.
    fn cache_key(&self) -> Option<String> {
        None
    }
}

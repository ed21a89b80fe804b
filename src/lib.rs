#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Command Core
//!
//! Resilient command execution: wrap a unit of work in a [`Command`], and the
//! [`CommandEngine`] runs it with automatic fallback substitution on failure and
//! opportunistic deduplication of repeated invocations within a request scope.
//!
//! ## Module Organization
//!
//! - [`command`] - The `Command` trait, command keys, single-use instances
//! - [`engine`] - Execution engine, outcomes and queued handles
//! - [`scope`] - Request contexts and scopes
//! - [`cache`] - The request-scoped result cache
//! - [`resilience`] - Execution gates (circuit-breaker hook point)
//! - [`events`] - Execution events and listeners
//! - [`metrics`] - Per-command event counters
//! - [`config`] - Engine configuration and loading
//! - [`logging`] - Structured logging setup
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust
//! use command_core::{Command, CommandEngine, CommandInstance, RequestContext};
//!
//! struct IsEven(i64);
//!
//! #[async_trait::async_trait]
//! impl Command for IsEven {
//!     type Output = bool;
//!
//!     async fn run(&self) -> anyhow::Result<bool> {
//!         Ok(self.0 % 2 == 0)
//!     }
//!
//!     fn cache_key(&self) -> Option<String> {
//!         Some(self.0.to_string())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), command_core::CommandError> {
//! let engine = CommandEngine::default();
//! let context = RequestContext::new();
//! let scope = context.initialize()?;
//!
//! let first = CommandInstance::new(IsEven(2));
//! assert!(engine.execute(&first, Some(&scope)).await?);
//! assert!(!first.is_response_from_cache());
//!
//! let second = CommandInstance::new(IsEven(2));
//! assert!(engine.execute(&second, Some(&scope)).await?);
//! assert!(second.is_response_from_cache());
//!
//! scope.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod resilience;
pub mod scope;

pub use cache::{CacheKey, CachedOutcome, ResultCache};
pub use command::{Command, CommandInstance, CommandKey, ExecutionStatus};
pub use config::{CommandSettings, ConfigLoader, EngineConfig};
pub use engine::{CommandEngine, CommandEngineBuilder, ExecutionResult, Outcome, QueuedCommand};
pub use error::{CommandError, CommandResult, FallbackError, PrimaryFailure};
pub use events::{EventPublisher, ExecutionEvent, ExecutionEventListener};
pub use metrics::{CommandMetrics, CommandMetricsSnapshot};
pub use resilience::{AlwaysAllow, CircuitState, ExecutionGate, ManualGate};
pub use scope::{RequestContext, RequestScope};

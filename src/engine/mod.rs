//! # Command Engine
//!
//! Runs [`CommandInstance`]s: consults the request-scoped cache, runs the
//! primary operation, substitutes the fallback on failure, stores the outcome,
//! and reports events along the way.
//!
//! ## Execution flow
//!
//! ```text
//! cache key + live scope? ──hit──▶ cached value (from_cache = true)
//!        │ miss
//!        ▼
//! gate allows? ──no──▶ ShortCircuited ─┐
//!        │ yes                         │
//!        ▼                             ▼
//!      run() ──err/panic──▶ PrimaryFailure ──▶ fallback() ──err──▶ Failure
//!        │ ok                                     │ ok
//!        ▼                                        ▼
//!     Success                              FallbackSuccess
//!        └──────────────┬─────────────────────────┘
//!                       ▼
//!          store in scope cache (if keyed)
//! ```
//!
//! Entry points:
//!
//! - [`CommandEngine::execute`] awaits the command on the caller's task.
//! - [`CommandEngine::execute_blocking`] blocks the calling OS thread.
//! - [`CommandEngine::queue`] spawns the command and returns a [`QueuedCommand`].
//! - [`CommandEngine::execute_outcome`] returns the [`ExecutionResult`] data form.

pub mod handle;
pub mod outcome;

pub use handle::QueuedCommand;
pub use outcome::{ExecutionResult, Outcome};

use crate::cache::{CacheKey, CachedOutcome};
use crate::command::{Command, CommandInstance, CommandKey};
use crate::config::{EngineConfig, ResolvedSettings};
use crate::error::{CommandError, CommandResult, FallbackError, PrimaryFailure};
use crate::events::{ExecutionEvent, ExecutionEventListener};
use crate::logging::{log_command_event, log_command_failure};
use crate::resilience::{AlwaysAllow, ExecutionGate};
use crate::scope::RequestScope;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{self, Handle, RuntimeFlavor};
use tokio::task;
use tracing::{debug, warn};

/// Executes commands. Cheap to clone; clones share configuration, gate and listeners.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    config: EngineConfig,
    gate: Arc<dyn ExecutionGate>,
    listeners: Vec<Arc<dyn ExecutionEventListener>>,
    runtime: Option<Handle>,
}

/// Builder for [`CommandEngine`]
#[derive(Debug, Default)]
pub struct CommandEngineBuilder {
    config: Option<EngineConfig>,
    gate: Option<Arc<dyn ExecutionGate>>,
    listeners: Vec<Arc<dyn ExecutionEventListener>>,
    runtime: Option<Handle>,
}

impl CommandEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Pre-flight check consulted before every primary operation
    pub fn gate(mut self, gate: Arc<dyn ExecutionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn ExecutionEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Runtime used by `queue`. Defaults to the runtime current at the call site.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> CommandEngine {
        CommandEngine {
            inner: Arc::new(EngineInner {
                config: self.config.unwrap_or_default(),
                gate: self.gate.unwrap_or_else(|| Arc::new(AlwaysAllow)),
                listeners: self.listeners,
                runtime: self.runtime,
            }),
        }
    }
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CommandEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> CommandEngineBuilder {
        CommandEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Run the command on the caller's task and return its value.
    ///
    /// A terminal failure is returned as [`CommandError::FallbackFailure`].
    pub async fn execute<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        scope: Option<&RequestScope>,
    ) -> CommandResult<C::Output> {
        self.execute_outcome(instance, scope).await?.into_result()
    }

    /// Run the command and return the full [`ExecutionResult`].
    ///
    /// Only usage errors are returned as `Err`; a terminal failure is
    /// reported as [`Outcome::Failure`].
    pub async fn execute_outcome<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        scope: Option<&RequestScope>,
    ) -> CommandResult<ExecutionResult<C::Output>> {
        instance.mark_started()?;
        Ok(self.inner.run_instance(instance, scope).await)
    }

    /// Run the command to completion on the calling thread.
    ///
    /// The command always runs with a Tokio reactor available:
    ///
    /// - inside a multi-thread runtime the worker is handed off with
    ///   `block_in_place` and the current runtime drives the command;
    /// - inside a current-thread runtime the command runs on a scoped helper
    ///   thread with its own runtime, since that runtime cannot be re-entered;
    /// - outside any runtime the configured runtime (if multi-thread) or a
    ///   short-lived current-thread runtime is used.
    pub fn execute_blocking<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        scope: Option<&RequestScope>,
    ) -> CommandResult<C::Output> {
        let command_key = instance.command_key();
        let future = self.execute(instance, scope);

        let result = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(task::block_in_place(|| handle.block_on(future)))
            }
            Ok(_) => std::thread::scope(|threads| {
                threads
                    .spawn(|| block_on_dedicated(future))
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            }),
            Err(_) => match &self.inner.runtime {
                Some(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                    Ok(handle.block_on(future))
                }
                _ => block_on_dedicated(future),
            },
        };

        result.unwrap_or_else(|error| {
            warn!(
                command_key = %command_key,
                error = %error,
                "Failed to start a runtime for blocking execution"
            );
            Err(CommandError::RuntimeUnavailable {
                command_key: command_key.clone(),
            })
        })
    }

    /// Dispatch the command onto the async runtime without waiting for it.
    ///
    /// The scope, if any, is carried into the spawned task. Usage errors are
    /// reported immediately rather than through the handle.
    pub fn queue<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        scope: Option<&RequestScope>,
    ) -> CommandResult<QueuedCommand<C::Output>> {
        let command_key = instance.command_key().clone();
        let runtime = self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or_else(|| CommandError::RuntimeUnavailable {
                command_key: command_key.clone(),
            })?;

        instance.mark_started()?;

        let inner = Arc::clone(&self.inner);
        let instance = instance.clone();
        let scope = scope.cloned();
        let join = runtime.spawn(async move {
            inner
                .run_instance(&instance, scope.as_ref())
                .await
                .into_result()
        });

        Ok(QueuedCommand::new(command_key, join))
    }
}

impl EngineInner {
    async fn run_instance<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        scope: Option<&RequestScope>,
    ) -> ExecutionResult<C::Output> {
        let command = instance.command();
        let command_key = instance.command_key();
        let settings = self.config.settings_for(command_key.as_str());

        let cache_slot = match scope {
            Some(scope) if settings.request_cache_enabled => command
                .cache_key()
                .map(|key| (scope, CacheKey::new(command_key.clone(), key))),
            _ => None,
        };

        debug!(
            command_key = %command_key,
            group_key = %command.group_key(),
            scope_id = ?scope.map(RequestScope::id),
            cache_key = ?cache_slot.as_ref().map(|(_, key)| key.cache_key.as_str()),
            "Executing command"
        );

        if let Some((scope, cache_key)) = &cache_slot {
            if let Some(cached) = scope.lookup(cache_key) {
                match cached.value::<C::Output>() {
                    Some(value) => {
                        self.emit(
                            instance,
                            ExecutionEvent::CacheHit,
                            Some(*scope),
                            Some(cache_key),
                        );
                        let from_fallback = cached.is_fallback();
                        instance.complete(true, from_fallback, true);

                        let outcome = if from_fallback {
                            Outcome::FallbackSuccess(value)
                        } else {
                            Outcome::Success(value)
                        };
                        return ExecutionResult {
                            outcome,
                            from_cache: true,
                            events: instance.execution_events(),
                        };
                    }
                    None => warn!(
                        command_key = %command_key,
                        cache_key = %cache_key,
                        "Cached value has a different type; treating as a miss"
                    ),
                }
            }
        }

        let cache_ctx = cache_slot.as_ref().map(|(scope, key)| (*scope, key));
        let outcome = self.run_with_fallback(instance, settings, cache_ctx).await;

        if let Some((scope, cache_key)) = cache_slot {
            match &outcome {
                Outcome::Success(value) => {
                    scope.store(cache_key, CachedOutcome::new(value.clone(), false))
                }
                Outcome::FallbackSuccess(value) => {
                    scope.store(cache_key, CachedOutcome::new(value.clone(), true))
                }
                Outcome::Failure(_) => {}
            }
        }

        instance.complete(false, outcome.is_fallback(), !outcome.is_failure());

        ExecutionResult {
            outcome,
            from_cache: false,
            events: instance.execution_events(),
        }
    }

    async fn run_with_fallback<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        settings: ResolvedSettings,
        cache_ctx: Option<(&RequestScope, &CacheKey)>,
    ) -> Outcome<C::Output> {
        let command = instance.command();
        let command_key = instance.command_key();
        let (scope, cache_key) = cache_ctx.unzip();

        let primary = if !self.gate.allows_execution(command_key) {
            warn!(command_key = %command_key, "Execution short-circuited; using fallback");
            self.emit(instance, ExecutionEvent::ShortCircuited, scope, cache_key);
            PrimaryFailure::ShortCircuited
        } else {
            let started = Instant::now();
            match AssertUnwindSafe(command.run()).catch_unwind().await {
                Ok(Ok(value)) => {
                    debug!(
                        command_key = %command_key,
                        duration_ms = started.elapsed().as_millis(),
                        "Primary operation succeeded"
                    );
                    self.emit(instance, ExecutionEvent::PrimarySuccess, scope, cache_key);
                    return Outcome::Success(value);
                }
                Ok(Err(error)) => {
                    warn!(
                        command_key = %command_key,
                        duration_ms = started.elapsed().as_millis(),
                        error = %error,
                        "Primary operation failed; using fallback"
                    );
                    self.emit(instance, ExecutionEvent::PrimaryFailure, scope, cache_key);
                    PrimaryFailure::Failed(error)
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(
                        command_key = %command_key,
                        panic = %message,
                        "Primary operation panicked; using fallback"
                    );
                    self.emit(instance, ExecutionEvent::PrimaryFailure, scope, cache_key);
                    PrimaryFailure::Panicked(message)
                }
            }
        };

        let fallback = if settings.fallback_enabled {
            match AssertUnwindSafe(command.fallback()).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(FallbackError::Failed(anyhow::anyhow!(
                    "fallback panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            }
        } else {
            Err(FallbackError::Disabled)
        };

        match fallback {
            Ok(value) => {
                debug!(command_key = %command_key, "Fallback succeeded");
                self.emit(instance, ExecutionEvent::FallbackSuccess, scope, cache_key);
                Outcome::FallbackSuccess(value)
            }
            Err(fallback) => {
                self.emit(instance, ExecutionEvent::FallbackFailure, scope, cache_key);
                log_command_failure(command_key, &primary.to_string(), &fallback.to_string());
                Outcome::Failure(CommandError::FallbackFailure {
                    command_key: command_key.clone(),
                    primary,
                    fallback,
                })
            }
        }
    }

    fn emit<C: Command>(
        &self,
        instance: &CommandInstance<C>,
        event: ExecutionEvent,
        scope: Option<&RequestScope>,
        cache_key: Option<&CacheKey>,
    ) {
        let command_key: &CommandKey = instance.command_key();
        instance.record_event(event);

        for listener in &self.listeners {
            listener.on_event(command_key, event);
        }

        if self.config.log_events {
            log_command_event(
                command_key,
                instance.command().group_key(),
                event,
                scope.map(RequestScope::id),
                cache_key.map(|key| key.cache_key.as_str()),
            );
        }
    }
}

/// Drive a future on a fresh current-thread runtime with IO and timers enabled
fn block_on_dedicated<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

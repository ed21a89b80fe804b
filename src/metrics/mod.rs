//! # Command Metrics
//!
//! [`CommandMetrics`] is an [`ExecutionEventListener`] that keeps lock-free
//! per-command counters for every execution event. Snapshots are serde
//! serializable for export to whatever metrics backend sits outside this crate.

use crate::command::CommandKey;
use crate::events::{ExecutionEvent, ExecutionEventListener};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free atomic counters for one command key
#[derive(Debug, Default)]
struct AtomicCommandCounters {
    cache_hits: AtomicU64,
    primary_successes: AtomicU64,
    primary_failures: AtomicU64,
    short_circuits: AtomicU64,
    fallback_successes: AtomicU64,
    fallback_failures: AtomicU64,
}

impl AtomicCommandCounters {
    #[inline]
    fn record(&self, event: ExecutionEvent) {
        let counter = match event {
            ExecutionEvent::CacheHit => &self.cache_hits,
            ExecutionEvent::PrimarySuccess => &self.primary_successes,
            ExecutionEvent::PrimaryFailure => &self.primary_failures,
            ExecutionEvent::ShortCircuited => &self.short_circuits,
            ExecutionEvent::FallbackSuccess => &self.fallback_successes,
            ExecutionEvent::FallbackFailure => &self.fallback_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, command_key: &CommandKey) -> CommandMetricsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let primary_successes = self.primary_successes.load(Ordering::Relaxed);
        let primary_failures = self.primary_failures.load(Ordering::Relaxed);
        let short_circuits = self.short_circuits.load(Ordering::Relaxed);
        let fallback_successes = self.fallback_successes.load(Ordering::Relaxed);
        let fallback_failures = self.fallback_failures.load(Ordering::Relaxed);

        // Each invocation starts with exactly one of these four events
        let total_executions = cache_hits + primary_successes + primary_failures + short_circuits;

        let (cache_hit_rate, fallback_rate, error_rate) = if total_executions > 0 {
            let total = total_executions as f64;
            (
                cache_hits as f64 / total,
                fallback_successes as f64 / total,
                fallback_failures as f64 / total,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        CommandMetricsSnapshot {
            command_key: command_key.clone(),
            total_executions,
            cache_hits,
            primary_successes,
            primary_failures,
            short_circuits,
            fallback_successes,
            fallback_failures,
            cache_hit_rate,
            fallback_rate,
            error_rate,
        }
    }
}

/// Point-in-time metrics for one command key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetricsSnapshot {
    pub command_key: CommandKey,

    /// Number of invocations observed
    pub total_executions: u64,

    pub cache_hits: u64,
    pub primary_successes: u64,
    pub primary_failures: u64,
    pub short_circuits: u64,
    pub fallback_successes: u64,
    pub fallback_failures: u64,

    /// Share of invocations served from cache (0.0 to 1.0)
    pub cache_hit_rate: f64,

    /// Share of invocations answered by a fallback (0.0 to 1.0)
    pub fallback_rate: f64,

    /// Share of invocations that ended in a terminal failure (0.0 to 1.0)
    pub error_rate: f64,
}

impl CommandMetricsSnapshot {
    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "{} | Executions: {} | Cache hits: {:.1}% | Fallbacks: {:.1}% | Errors: {:.1}% | Short-circuited: {}",
            self.command_key,
            self.total_executions,
            self.cache_hit_rate * 100.0,
            self.fallback_rate * 100.0,
            self.error_rate * 100.0,
            self.short_circuits
        )
    }
}

/// Metrics for every command key seen so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCommandMetrics {
    pub commands: HashMap<CommandKey, CommandMetricsSnapshot>,
    pub collected_at: DateTime<Utc>,
}

impl SystemCommandMetrics {
    pub fn total_executions(&self) -> u64 {
        self.commands.values().map(|m| m.total_executions).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.commands.values().map(|m| m.fallback_failures).sum()
    }

    /// System-wide terminal failure rate
    pub fn error_rate(&self) -> f64 {
        let total = self.total_executions();
        if total == 0 {
            return 0.0;
        }
        self.total_failures() as f64 / total as f64
    }
}

/// Event listener that counts execution events per command key
#[derive(Debug, Default)]
pub struct CommandMetrics {
    counters: DashMap<CommandKey, Arc<AtomicCommandCounters>>,
}

impl CommandMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, command_key: &CommandKey) -> Option<CommandMetricsSnapshot> {
        self.counters
            .get(command_key)
            .map(|counters| counters.snapshot(command_key))
    }

    pub fn system_snapshot(&self) -> SystemCommandMetrics {
        let commands = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot(entry.key())))
            .collect();

        SystemCommandMetrics {
            commands,
            collected_at: Utc::now(),
        }
    }

    pub fn reset(&self) {
        self.counters.clear();
    }

    fn counters_for(&self, command_key: &CommandKey) -> Arc<AtomicCommandCounters> {
        if let Some(existing) = self.counters.get(command_key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.counters
                .entry(command_key.clone())
                .or_default()
                .value(),
        )
    }
}

impl ExecutionEventListener for CommandMetrics {
    fn on_event(&self, command_key: &CommandKey, event: ExecutionEvent) {
        self.counters_for(command_key).record(event);
    }
}

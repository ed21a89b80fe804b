//! # Execution Gates
//!
//! The "is execution permitted?" check consulted by the engine ahead of every
//! primary operation.

use crate::command::CommandKey;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::warn;

/// Gate states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - calls are allowed through
    Closed = 0,
    /// Calls are rejected and go straight to the fallback
    Open = 1,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            _ => CircuitState::Open,
        }
    }
}

/// Pre-flight check invoked before a command's primary operation
pub trait ExecutionGate: Send + Sync + Debug {
    fn allows_execution(&self, command_key: &CommandKey) -> bool;
}

/// Gate that never rejects
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

impl ExecutionGate for AlwaysAllow {
    fn allows_execution(&self, _command_key: &CommandKey) -> bool {
        true
    }
}

/// Operator-controlled gate: force all commands, or individual command keys,
/// open (rejecting) or closed.
#[derive(Debug)]
pub struct ManualGate {
    name: String,
    global: AtomicU8,
    overrides: DashMap<CommandKey, CircuitState>,
}

impl ManualGate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            global: AtomicU8::new(CircuitState::Closed as u8),
            overrides: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective state for a command key; a per-key override beats the global state
    pub fn state(&self, command_key: &CommandKey) -> CircuitState {
        self.overrides
            .get(command_key)
            .map(|state| *state)
            .unwrap_or_else(|| self.global_state())
    }

    pub fn global_state(&self) -> CircuitState {
        CircuitState::from(self.global.load(Ordering::Acquire))
    }

    /// Reject one command key
    pub fn force_open(&self, command_key: &CommandKey) {
        warn!(gate = %self.name, command_key = %command_key, "🚨 Command forced open");
        self.overrides.insert(command_key.clone(), CircuitState::Open);
    }

    /// Allow one command key, even while the gate is globally open
    pub fn force_closed(&self, command_key: &CommandKey) {
        warn!(gate = %self.name, command_key = %command_key, "🚨 Command forced closed");
        self.overrides.insert(command_key.clone(), CircuitState::Closed);
    }

    /// Drop the per-key override so the global state applies again
    pub fn clear_override(&self, command_key: &CommandKey) {
        self.overrides.remove(command_key);
    }

    /// Reject every command without an override
    pub fn force_open_all(&self) {
        warn!(gate = %self.name, "🚨 Gate forced open");
        self.global.store(CircuitState::Open as u8, Ordering::Release);
    }

    pub fn force_closed_all(&self) {
        warn!(gate = %self.name, "🚨 Gate forced closed");
        self.global.store(CircuitState::Closed as u8, Ordering::Release);
    }
}

impl ExecutionGate for ManualGate {
    fn allows_execution(&self, command_key: &CommandKey) -> bool {
        self.state(command_key) == CircuitState::Closed
    }
}

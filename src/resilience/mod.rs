//! # Resilience Module
//!
//! Hook point between the engine and an external isolation or circuit-breaker
//! component. Before the primary operation runs, the engine asks its
//! [`ExecutionGate`] whether execution is permitted; a rejection is handled
//! exactly like a primary failure and routes the command to its fallback.
//!
//! Threshold tracking and health windows live outside this crate. The gates
//! provided here are [`AlwaysAllow`] (the default) and [`ManualGate`], an
//! operator kill switch.
//!
//! ## Usage
//!
//! ```rust
//! use command_core::resilience::{ExecutionGate, ManualGate};
//! use command_core::command::CommandKey;
//!
//! let gate = ManualGate::new("payments");
//! let key = CommandKey::new("ChargeCard");
//! assert!(gate.allows_execution(&key));
//!
//! gate.force_open(&key);
//! assert!(!gate.allows_execution(&key));
//! ```

pub mod gate;

pub use gate::{AlwaysAllow, CircuitState, ExecutionGate, ManualGate};

//! Shared command fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use command_core::{Command, CommandKey, FallbackError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Always fails; falls back to a greeting
pub struct HelloFailure {
    name: String,
}

impl HelloFailure {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Command for HelloFailure {
    type Output = String;

    fn group_key(&self) -> &str {
        "ExampleGroup"
    }

    async fn run(&self) -> anyhow::Result<String> {
        anyhow::bail!("this command always fails")
    }

    async fn fallback(&self) -> Result<String, FallbackError> {
        Ok(format!("Hello Failure {}!", self.name))
    }
}

/// Always fails and keeps the default (unimplemented) fallback
pub struct FailureWithoutFallback;

#[async_trait]
impl Command for FailureWithoutFallback {
    type Output = String;

    async fn run(&self) -> anyhow::Result<String> {
        anyhow::bail!("this command always fails")
    }
}

/// Parity check cached by the stringified input
pub struct UsingRequestCache {
    value: i64,
    runs: Option<Arc<AtomicUsize>>,
}

impl UsingRequestCache {
    pub fn new(value: i64) -> Self {
        Self { value, runs: None }
    }

    pub fn counted(value: i64, runs: &Arc<AtomicUsize>) -> Self {
        Self {
            value,
            runs: Some(Arc::clone(runs)),
        }
    }
}

#[async_trait]
impl Command for UsingRequestCache {
    type Output = bool;

    fn group_key(&self) -> &str {
        "ExampleGroup"
    }

    async fn run(&self) -> anyhow::Result<bool> {
        if let Some(runs) = &self.runs {
            runs.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.value == 0 || self.value % 2 == 0)
    }

    fn cache_key(&self) -> Option<String> {
        Some(self.value.to_string())
    }
}

/// Same parity check without a cache key
pub struct UncachedParity {
    pub value: i64,
    pub runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Command for UncachedParity {
    type Output = bool;

    async fn run(&self) -> anyhow::Result<bool> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.value % 2 == 0)
    }
}

/// Sleeps before answering; used to observe concurrency
pub struct SlowEcho {
    pub key: String,
    pub delay: Duration,
    pub runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Command for SlowEcho {
    type Output = String;

    fn command_key(&self) -> CommandKey {
        CommandKey::new("SlowEcho")
    }

    async fn run(&self) -> anyhow::Result<String> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.key.clone())
    }

    fn cache_key(&self) -> Option<String> {
        Some(self.key.clone())
    }
}

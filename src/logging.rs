//! # Structured Logging Module
//!
//! Environment-aware structured logging for command execution. The library
//! itself only emits `tracing` events; binaries and tests call
//! [`init_structured_logging`] to install a subscriber.

use crate::command::CommandKey;
use crate::config::detect_environment;
use crate::events::ExecutionEvent;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` wins over the environment-derived level. Setting
/// `COMMAND_LOG_FORMAT=json` switches to JSON lines.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = use_json_format();

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Another subscriber may already be installed (e.g. by a host application)
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

fn use_json_format() -> bool {
    std::env::var("COMMAND_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log one execution event with its command context
pub fn log_command_event(
    command_key: &CommandKey,
    group_key: &str,
    event: ExecutionEvent,
    scope_id: Option<Uuid>,
    cache_key: Option<&str>,
) {
    tracing::debug!(
        command_key = %command_key,
        group_key = %group_key,
        event = %event,
        scope_id = scope_id.map(|id| id.to_string()),
        cache_key = cache_key,
        timestamp = %Utc::now().to_rfc3339(),
        "⚙️ COMMAND_EVENT"
    );
}

/// Log a terminal command failure with both causes
pub fn log_command_failure(command_key: &CommandKey, primary: &str, fallback: &str) {
    tracing::error!(
        command_key = %command_key,
        primary = %primary,
        fallback = %fallback,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ COMMAND_FAILED"
    );
}

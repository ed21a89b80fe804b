//! Concurrent commands sharing one request scope

mod common;

use command_core::{CommandEngine, CommandInstance, RequestContext};
use common::SlowEcho;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn slow(key: &str, delay_ms: u64, runs: &Arc<AtomicUsize>) -> CommandInstance<SlowEcho> {
    CommandInstance::new(SlowEcho {
        key: key.to_string(),
        delay: Duration::from_millis(delay_ms),
        runs: Arc::clone(runs),
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queued_commands_run_concurrently() {
    let engine = CommandEngine::default();
    let context = RequestContext::new();
    let scope = context.initialize().unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let started = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            engine
                .queue(&slow(&format!("key-{i}"), 200, &runs), Some(&scope))
                .unwrap()
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), format!("key-{i}"));
    }

    // eight 200ms commands in well under their serial total
    assert!(started.elapsed() < Duration::from_millis(1200));
    assert_eq!(runs.load(Ordering::SeqCst), 8);
    assert_eq!(scope.cache().len(), 8);

    scope.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_duplicates_each_execute() {
    let engine = CommandEngine::default();
    let context = RequestContext::new();
    let scope = context.initialize().unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let a = slow("dup", 100, &runs);
    let b = slow("dup", 100, &runs);
    let fa = engine.queue(&a, Some(&scope)).unwrap();
    let fb = engine.queue(&b, Some(&scope)).unwrap();

    assert_eq!(fa.await.unwrap(), "dup");
    assert_eq!(fb.await.unwrap(), "dup");

    // no single-flight: both raced past the empty cache
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert!(!a.is_response_from_cache());
    assert!(!b.is_response_from_cache());
    assert_eq!(scope.cache().len(), 1);

    let c = slow("dup", 100, &runs);
    engine.execute(&c, Some(&scope)).await.unwrap();
    assert!(c.is_response_from_cache());
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    scope.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_while_commands_in_flight() {
    let engine = CommandEngine::default();
    let context = RequestContext::new();
    let scope = context.initialize().unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let in_flight = engine
        .queue(&slow("late", 100, &runs), Some(&scope))
        .unwrap();
    scope.shutdown().unwrap();

    // the command still completes; its late write is discarded
    assert_eq!(in_flight.await.unwrap(), "late");
    assert!(scope.cache().is_empty());
    assert!(context.current().is_none());
}

#[tokio::test]
async fn test_queued_handle_reports_completion() {
    let engine = CommandEngine::default();
    let runs = Arc::new(AtomicUsize::new(0));

    let queued = engine.queue(&slow("bg", 50, &runs), None).unwrap();
    assert!(!queued.is_finished());
    assert_eq!(queued.await.unwrap(), "bg");
}

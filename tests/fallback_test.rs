//! Fallback substitution through the synchronous, blocking and queued entry points

mod common;

use command_core::{
    CommandEngine, CommandError, CommandInstance, CommandMetrics, EventPublisher, ExecutionEvent,
    FallbackError, ManualGate, PrimaryFailure,
};
use common::{FailureWithoutFallback, HelloFailure};
use std::sync::Arc;

#[tokio::test]
async fn test_synchronous() {
    let engine = CommandEngine::default();

    let world = CommandInstance::new(HelloFailure::new("World"));
    let bob = CommandInstance::new(HelloFailure::new("Bob"));

    assert_eq!(engine.execute(&world, None).await.unwrap(), "Hello Failure World!");
    assert_eq!(engine.execute(&bob, None).await.unwrap(), "Hello Failure Bob!");
    assert!(world.is_response_from_fallback());
    assert!(bob.is_response_from_fallback());
}

#[test]
fn test_blocking() {
    let engine = CommandEngine::default();
    let world = CommandInstance::new(HelloFailure::new("World"));

    assert_eq!(
        engine.execute_blocking(&world, None).unwrap(),
        "Hello Failure World!"
    );
    assert!(world.is_response_from_fallback());
}

#[tokio::test]
async fn test_asynchronous_queue_then_get() {
    let engine = CommandEngine::default();

    let world = engine
        .queue(&CommandInstance::new(HelloFailure::new("World")), None)
        .unwrap()
        .await
        .unwrap();
    let bob = engine
        .queue(&CommandInstance::new(HelloFailure::new("Bob")), None)
        .unwrap()
        .await
        .unwrap();

    assert_eq!(world, "Hello Failure World!");
    assert_eq!(bob, "Hello Failure Bob!");
}

#[tokio::test]
async fn test_asynchronous_queue_both_then_await() {
    let engine = CommandEngine::default();

    let f_world = engine
        .queue(&CommandInstance::new(HelloFailure::new("World")), None)
        .unwrap();
    let f_bob = engine
        .queue(&CommandInstance::new(HelloFailure::new("Bob")), None)
        .unwrap();

    assert_eq!(f_world.await.unwrap(), "Hello Failure World!");
    assert_eq!(f_bob.await.unwrap(), "Hello Failure Bob!");
}

#[tokio::test]
async fn test_default_fallback_is_terminal_failure() {
    let engine = CommandEngine::default();
    let instance = CommandInstance::new(FailureWithoutFallback);

    let err = engine.execute(&instance, None).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::FallbackFailure {
            primary: PrimaryFailure::Failed(_),
            fallback: FallbackError::NotImplemented,
            ..
        }
    ));
    assert!(instance.is_failed_execution());
    assert_eq!(
        instance.execution_events(),
        vec![ExecutionEvent::PrimaryFailure, ExecutionEvent::FallbackFailure]
    );
}

#[tokio::test]
async fn test_queued_failure_resolves_to_error() {
    let engine = CommandEngine::default();
    let handle = engine
        .queue(&CommandInstance::new(FailureWithoutFallback), None)
        .unwrap();

    let err = handle.await.unwrap_err();
    assert!(err.fallback_cause().is_some_and(FallbackError::is_not_implemented));
}

#[tokio::test]
async fn test_reuse_rejected_across_entry_points() {
    let engine = CommandEngine::default();
    let instance = CommandInstance::new(HelloFailure::new("World"));

    engine.execute(&instance, None).await.unwrap();

    let again = engine.execute(&instance, None).await;
    assert!(matches!(again, Err(CommandError::AlreadyExecuted { .. })));

    let queued = engine.queue(&instance, None);
    assert!(matches!(queued, Err(CommandError::AlreadyExecuted { .. })));
}

#[tokio::test]
async fn test_forced_open_gate_uses_fallback() {
    let gate = Arc::new(ManualGate::new("examples"));
    gate.force_open_all();
    let metrics = Arc::new(CommandMetrics::new());
    let engine = CommandEngine::builder()
        .gate(gate.clone())
        .listener(metrics.clone())
        .build();

    let instance = CommandInstance::new(HelloFailure::new("Gated"));
    assert_eq!(
        engine.execute(&instance, None).await.unwrap(),
        "Hello Failure Gated!"
    );
    assert_eq!(
        instance.execution_events(),
        vec![ExecutionEvent::ShortCircuited, ExecutionEvent::FallbackSuccess]
    );

    let snapshot = metrics.snapshot(instance.command_key()).unwrap();
    assert_eq!(snapshot.short_circuits, 1);
    assert_eq!(snapshot.primary_failures, 0);

    gate.force_closed_all();
    let instance = CommandInstance::new(FailureWithoutFallback);
    let err = engine.execute(&instance, None).await.unwrap_err();
    assert!(matches!(
        err.primary_cause(),
        Some(PrimaryFailure::Failed(_))
    ));
}

#[tokio::test]
async fn test_publisher_subscribers_see_execution_events() {
    let publisher = Arc::new(EventPublisher::default());
    let mut receiver = publisher.subscribe();
    let engine = CommandEngine::builder().listener(publisher.clone()).build();

    let instance = CommandInstance::new(HelloFailure::new("Events"));
    engine.execute(&instance, None).await.unwrap();

    let first = receiver.recv().await.unwrap();
    let second = receiver.recv().await.unwrap();
    assert_eq!(first.command_key, *instance.command_key());
    assert_eq!(first.event, ExecutionEvent::PrimaryFailure);
    assert_eq!(second.event, ExecutionEvent::FallbackSuccess);
    assert!(first.published_at <= second.published_at);
    assert!(receiver.try_recv().is_err());
}

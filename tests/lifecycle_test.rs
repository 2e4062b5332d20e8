//! Integration tests for model loading, reload and slot publication.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{label_of, labelled_identity, runtime_with, unavailable, FakeMode, FakeRegistry};
use model_serve::models::{LoadOutcome, ModelIdentity, ModelSlot, RegistryError};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts WARN events seen while installed.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn test_startup_failure_is_swallowed() {
    let registry = FakeRegistry::new(FakeMode::Fail(unavailable()));
    let runtime = runtime_with(registry.clone());

    let outcome = runtime.start().await;

    assert!(matches!(
        outcome,
        LoadOutcome::NotReady(RegistryError::RegistryUnavailable(_))
    ));
    assert!(!runtime.slot.is_loaded());
    assert_eq!(registry.calls(), 1);
}

#[tokio::test]
async fn test_failed_startup_warns_once() {
    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let registry = FakeRegistry::new(FakeMode::Fail(unavailable()));
    let runtime = runtime_with(registry);
    runtime.start().await;

    assert_eq!(warnings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_startup_success_fills_slot() {
    let registry = FakeRegistry::new(FakeMode::Fixed(2));
    let runtime = runtime_with(registry);

    let outcome = runtime.start().await;

    let expected = labelled_identity("IrisClassifier", "Production", 2);
    assert_eq!(outcome, LoadOutcome::Loaded(expected.clone()));
    assert_eq!(runtime.slot.identity(), Some(expected));
}

#[tokio::test]
async fn test_reload_after_failed_startup_recovers() {
    let registry = FakeRegistry::new(FakeMode::Fail(unavailable()));
    let runtime = runtime_with(registry.clone());
    runtime.start().await;

    registry.set_mode(FakeMode::Fixed(1));
    let identity = runtime.lifecycle.load_or_reload().await.unwrap();

    assert_eq!(runtime.slot.identity(), Some(identity));
}

#[tokio::test]
async fn test_reload_failure_is_propagated_and_keeps_previous_model() {
    let registry = FakeRegistry::new(FakeMode::Fixed(1));
    let runtime = runtime_with(registry.clone());
    let before = runtime.lifecycle.load_or_reload().await.unwrap();
    let before_generation = runtime.slot.snapshot().unwrap().generation;

    let not_found = RegistryError::ModelNotFound {
        name: "IrisClassifier".into(),
        stage: "Production".into(),
    };
    registry.set_mode(FakeMode::Fail(not_found.clone()));
    let err = runtime.lifecycle.load_or_reload().await.unwrap_err();

    assert_eq!(err, not_found);
    let active = runtime.slot.snapshot().unwrap();
    assert_eq!(active.identity(), &before);
    assert_eq!(active.generation, before_generation);
}

#[tokio::test]
async fn test_reload_always_queries_registry() {
    let registry = FakeRegistry::new(FakeMode::Fixed(1));
    let runtime = runtime_with(registry.clone());

    let first = runtime.lifecycle.load_or_reload().await.unwrap();
    let second = runtime.lifecycle.load_or_reload().await.unwrap();

    // Same registry answer, same identity, but a fresh publication each time.
    assert_eq!(first, second);
    assert_eq!(registry.calls(), 2);
    assert_eq!(runtime.slot.snapshot().unwrap().generation, 2);
}

#[tokio::test]
async fn test_reload_picks_up_new_registry_answer() {
    let registry = FakeRegistry::new(FakeMode::Fixed(1));
    let runtime = runtime_with(registry.clone());
    runtime.lifecycle.load_or_reload().await.unwrap();

    registry.set_mode(FakeMode::Fixed(5));
    let identity = runtime.lifecycle.load_or_reload().await.unwrap();

    assert_eq!(label_of(&identity), 5);
    assert_eq!(runtime.inference.predict(&[0.0; 4]).unwrap().label, 5);
}

#[tokio::test]
async fn test_concurrent_reloads_leave_one_complete_model() {
    let registry = FakeRegistry::new(FakeMode::Sequential);
    registry.set_delay(Duration::from_millis(5));
    let runtime = Arc::new(runtime_with(registry.clone()));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let lifecycle = runtime.lifecycle.clone();
        tasks.push(tokio::spawn(async move { lifecycle.load_or_reload().await }));
    }
    let mut loaded = Vec::new();
    for task in tasks {
        loaded.push(task.await.unwrap().unwrap());
    }

    assert_eq!(registry.calls(), 8);
    let active = runtime.slot.snapshot().unwrap();
    // Whichever reload published last, handle and identity came from it.
    assert!(loaded.contains(active.identity()));
    assert_eq!(
        active.classifier().predict(&[0.0; 4]).unwrap(),
        label_of(active.identity())
    );
    assert_eq!(active.generation, 8);
}

#[tokio::test]
async fn test_load_metrics_track_outcomes() {
    let registry = FakeRegistry::new(FakeMode::Fail(unavailable()));
    let runtime = runtime_with(registry.clone());
    runtime.start().await;
    assert!(!runtime.metrics.snapshot().model_loaded);

    registry.set_mode(FakeMode::Fixed(0));
    runtime.lifecycle.load_or_reload().await.unwrap();

    let snapshot = runtime.metrics.snapshot();
    assert_eq!(snapshot.model_loads_failure, 1);
    assert_eq!(snapshot.model_loads_success, 1);
    assert!(snapshot.model_loaded);
}

#[test]
fn test_empty_slot_has_no_identity() {
    let slot = ModelSlot::new();
    assert!(slot.snapshot().is_none());
    assert_eq!(slot.identity(), None::<ModelIdentity>);
}

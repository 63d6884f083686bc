//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use shield_bridge::ShieldSession;
use shield_core::ReadinessOptions;
use shield_events::{EventBus, ShieldCallbacks};
use shield_test::MockEngine;

/// Readiness options without the grace sleep.
pub fn no_grace() -> ReadinessOptions {
    ReadinessOptions::default().with_grace(Duration::ZERO)
}

/// A fresh bus, a mock publishing on it and a session over both.
pub fn setup(configure: impl FnOnce(MockEngine) -> MockEngine) -> (EventBus, MockEngine, ShieldSession) {
    shield_test::init_test_logging();
    let bus = EventBus::new();
    let engine = configure(MockEngine::new(bus.clone()));
    let session = ShieldSession::with_options(engine.handle(), bus.clone(), no_grace());
    (bus, engine, session)
}

/// Payloads seen by a callback pair.
#[derive(Default)]
pub struct Seen {
    pub successes: Mutex<Vec<Value>>,
    pub failures: Mutex<Vec<Value>>,
}

impl Seen {
    pub fn successes(&self) -> Vec<Value> {
        self.successes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<Value> {
        self.failures.lock().unwrap().clone()
    }
}

/// Callbacks recording into a shared [`Seen`].
pub fn recording_callbacks() -> (Arc<Seen>, ShieldCallbacks) {
    let seen = Arc::new(Seen::default());
    let on_success = Arc::clone(&seen);
    let on_failure = Arc::clone(&seen);
    let callbacks = ShieldCallbacks::new()
        .on_success(move |payload: Value| on_success.successes.lock().unwrap().push(payload))
        .on_failure(move |payload: Value| on_failure.failures.lock().unwrap().push(payload));
    (seen, callbacks)
}

/// A counter plus a readiness callback that records its argument.
pub fn readiness_recorder() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<bool>>>, impl FnOnce(bool) + Send) {
    let count = Arc::new(AtomicUsize::new(0));
    let values = Arc::new(Mutex::new(Vec::new()));
    let (c, v) = (Arc::clone(&count), Arc::clone(&values));
    let callback = move |ready: bool| {
        c.fetch_add(1, Ordering::SeqCst);
        v.lock().unwrap().push(ready);
    };
    (count, values, callback)
}

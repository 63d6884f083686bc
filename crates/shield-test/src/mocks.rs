//! Mock implementations for testing.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shield_core::{
    Attributes, CrossPlatformDescriptor, Engine, InitArgs, NativeCallback, ShieldError,
    ShieldResult,
};
use shield_events::{EventBus, ShieldEvent};

/// Payload the engine reports when it has no device result.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// How [`MockEngine`] answers `latest_device_result`.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceResultMode {
    /// Call the success callback with this payload.
    Success(Value),
    /// Call the error callback with this payload.
    Error(Value),
    /// Call success, then error.
    Both {
        /// Payload passed to the success callback.
        success: Value,
        /// Payload passed to the error callback.
        error: Value,
    },
    /// Drop both callbacks without calling either.
    Drop,
}

impl Default for DeviceResultMode {
    fn default() -> Self {
        Self::Error(json!(UNKNOWN_ERROR))
    }
}

/// Mock implementation of the [`Engine`] trait.
///
/// Records every call, answers from scripted queues and publishes events on
/// the shared bus the way a native adapter would. Clones share state, so a
/// test can hand one clone to the session and inspect another.
#[derive(Debug, Clone)]
pub struct MockEngine {
    bus: EventBus,
    /// Captured initializer arguments.
    init_calls: Arc<Mutex<Vec<InitArgs>>>,
    /// Captured descriptors.
    descriptors: Arc<Mutex<Vec<CrossPlatformDescriptor>>>,
    /// Captured attribute hand-offs.
    attributes: Arc<Mutex<Vec<(String, Attributes)>>>,
    /// Queued readiness answers; `Err` holds a failure message.
    readiness_answers: Arc<Mutex<VecDeque<Result<bool, String>>>>,
    /// Events published from inside `initialize`.
    init_events: Arc<Mutex<Vec<ShieldEvent>>>,
    /// Failure returned by `initialize`.
    init_failure: Arc<Mutex<Option<String>>>,
    initialized: Arc<AtomicBool>,
    listener_arms: Arc<AtomicUsize>,
    ready_on_arm: bool,
    session_id: Arc<Mutex<Option<String>>>,
    device_result: Arc<Mutex<DeviceResultMode>>,
}

impl MockEngine {
    /// Create a mock publishing on `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            init_calls: Arc::new(Mutex::new(Vec::new())),
            descriptors: Arc::new(Mutex::new(Vec::new())),
            attributes: Arc::new(Mutex::new(Vec::new())),
            readiness_answers: Arc::new(Mutex::new(VecDeque::new())),
            init_events: Arc::new(Mutex::new(Vec::new())),
            init_failure: Arc::new(Mutex::new(None)),
            initialized: Arc::new(AtomicBool::new(false)),
            listener_arms: Arc::new(AtomicUsize::new(0)),
            ready_on_arm: false,
            session_id: Arc::new(Mutex::new(None)),
            device_result: Arc::new(Mutex::new(DeviceResultMode::default())),
        }
    }

    /// This mock as a trait object for the session.
    #[must_use]
    pub fn handle(&self) -> Arc<dyn Engine> {
        Arc::new(self.clone())
    }

    /// Start out initialized.
    #[must_use]
    pub fn initialized(self) -> Self {
        self.initialized.store(true, Ordering::SeqCst);
        self
    }

    /// Broadcast readiness as soon as the readiness listener is armed.
    #[must_use]
    pub fn with_ready_on_arm(mut self) -> Self {
        self.ready_on_arm = true;
        self
    }

    /// Queue an answer for the next `is_initialized` query.
    #[must_use]
    pub fn with_readiness_answer(self, answer: bool) -> Self {
        self.queue_readiness(Ok(answer));
        self
    }

    /// Make the next `is_initialized` query fail.
    #[must_use]
    pub fn with_readiness_error(self, message: impl Into<String>) -> Self {
        self.queue_readiness(Err(message.into()));
        self
    }

    /// Publish `event` from inside `initialize`.
    #[must_use]
    pub fn with_init_event(self, event: ShieldEvent) -> Self {
        if let Ok(mut guard) = self.init_events.lock() {
            guard.push(event);
        }
        self
    }

    /// Make `initialize` fail with `message`.
    #[must_use]
    pub fn with_init_failure(self, message: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.init_failure.lock() {
            *guard = Some(message.into());
        }
        self
    }

    /// Session identifier returned once initialized.
    #[must_use]
    pub fn with_session_id(self, id: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.session_id.lock() {
            *guard = Some(id.into());
        }
        self
    }

    /// How `latest_device_result` answers.
    #[must_use]
    pub fn with_device_result(self, mode: DeviceResultMode) -> Self {
        self.set_device_result(mode);
        self
    }

    /// Change how `latest_device_result` answers.
    pub fn set_device_result(&self, mode: DeviceResultMode) {
        if let Ok(mut guard) = self.device_result.lock() {
            *guard = mode;
        }
    }

    /// Queue a readiness answer.
    pub fn queue_readiness(&self, answer: Result<bool, String>) {
        if let Ok(mut guard) = self.readiness_answers.lock() {
            guard.push_back(answer);
        }
    }

    /// Emit a `success` event.
    pub fn emit_success(&self, payload: Value) -> usize {
        self.bus.publish(ShieldEvent::success(payload))
    }

    /// Emit an `error` event.
    pub fn emit_error(&self, payload: Value) -> usize {
        self.bus.publish(ShieldEvent::error(payload))
    }

    /// Emit the readiness broadcast and mark the engine initialized.
    pub fn emit_ready(&self) -> usize {
        self.initialized.store(true, Ordering::SeqCst);
        self.bus.publish(ShieldEvent::sdk_ready())
    }

    /// Emit a `device_result_state` event with an arbitrary status.
    pub fn emit_status(&self, status: &str) -> usize {
        self.bus.publish(ShieldEvent::device_result_state(status))
    }

    /// Captured initializer arguments.
    #[must_use]
    pub fn init_calls(&self) -> Vec<InitArgs> {
        self.init_calls.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Captured descriptors.
    #[must_use]
    pub fn descriptors(&self) -> Vec<CrossPlatformDescriptor> {
        self.descriptors.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Captured attribute hand-offs.
    #[must_use]
    pub fn attribute_calls(&self) -> Vec<(String, Attributes)> {
        self.attributes.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// How many times the readiness listener was armed.
    #[must_use]
    pub fn listener_arms(&self) -> usize {
        self.listener_arms.load(Ordering::SeqCst)
    }

    /// Whether the mock considers itself initialized.
    #[must_use]
    pub fn is_initialized_now(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn initialize(&self, args: InitArgs) -> ShieldResult<()> {
        if let Ok(mut guard) = self.init_calls.lock() {
            guard.push(args);
        }

        let events = self
            .init_events
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default();
        for event in events {
            self.bus.publish(event);
        }

        let failure = self.init_failure.lock().ok().and_then(|g| g.clone());
        if let Some(message) = failure {
            return Err(ShieldError::Internal(message));
        }

        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_cross_platform_parameters(&self, name: &str, version: &str) {
        if let Ok(mut guard) = self.descriptors.lock() {
            guard.push(CrossPlatformDescriptor::new(name, version));
        }
    }

    async fn is_initialized(&self) -> ShieldResult<bool> {
        let scripted = self
            .readiness_answers
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front());
        match scripted {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(ShieldError::ReadinessCheckFailed(message)),
            None => Ok(self.initialized.load(Ordering::SeqCst)),
        }
    }

    fn set_readiness_listener(&self) {
        self.listener_arms.fetch_add(1, Ordering::SeqCst);
        if self.ready_on_arm {
            self.emit_ready();
        }
    }

    async fn session_id(&self) -> ShieldResult<Option<String>> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.session_id.lock().ok().and_then(|g| g.clone()))
    }

    fn send_attributes(&self, screen_name: &str, attributes: Attributes) {
        if let Ok(mut guard) = self.attributes.lock() {
            guard.push((screen_name.to_owned(), attributes));
        }
    }

    fn latest_device_result(&self, on_success: NativeCallback, on_error: NativeCallback) {
        let mode = self
            .device_result
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default();
        match mode {
            DeviceResultMode::Success(payload) => on_success(payload),
            DeviceResultMode::Error(payload) => on_error(payload),
            DeviceResultMode::Both { success, error } => {
                on_success(success);
                on_error(error);
            },
            DeviceResultMode::Drop => {
                tracing::debug!("Mock dropping device result callbacks");
            },
        }
    }
}

//! Application-facing session over one engine instance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shield_core::{
    Attributes, CrossPlatformDescriptor, DeviceResult, Engine, Readiness, ReadinessOptions,
    ShieldConfig, ShieldError, ShieldResult, settle_pair,
};
use shield_events::{EventBridge, EventBus, Registration, ShieldCallbacks};
use shield_telemetry::{OperationContext, OperationGuard};
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

use crate::binding_descriptor;
use crate::gate::ReadinessGate;

/// A session with the fraud engine.
///
/// Holds the engine handle, the emitter it publishes on, the callback
/// bridge and the readiness gate. Sessions are independent; several may
/// coexist over different engines.
pub struct ShieldSession {
    engine: Arc<dyn Engine>,
    bridge: EventBridge,
    gate: ReadinessGate,
    descriptor: CrossPlatformDescriptor,
    registration: Mutex<Option<Registration>>,
    correlation_id: Uuid,
}

impl std::fmt::Debug for ShieldSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShieldSession")
            .field("descriptor", &self.descriptor)
            .field("options", self.gate.options())
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}

impl ShieldSession {
    /// Create a session with default readiness options.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, emitter: EventBus) -> Self {
        Self::with_options(engine, emitter, ReadinessOptions::default())
    }

    /// Create a session with explicit readiness options.
    #[must_use]
    pub fn with_options(
        engine: Arc<dyn Engine>,
        emitter: EventBus,
        options: ReadinessOptions,
    ) -> Self {
        let gate = ReadinessGate::new(Arc::clone(&engine), emitter.clone(), options);
        Self {
            engine,
            bridge: EventBridge::new(emitter),
            gate,
            descriptor: binding_descriptor(),
            registration: Mutex::new(None),
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Override the descriptor forwarded before initialization.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: CrossPlatformDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Descriptor forwarded on every `initialize`.
    #[must_use]
    pub fn descriptor(&self) -> &CrossPlatformDescriptor {
        &self.descriptor
    }

    /// Readiness options used by [`ready`](Self::ready).
    #[must_use]
    pub fn options(&self) -> &ReadinessOptions {
        self.gate.options()
    }

    /// The emitter shared with the engine.
    #[must_use]
    pub fn emitter(&self) -> &EventBus {
        self.bridge.bus()
    }

    /// Correlation ID attached to every operation span of this session.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Whether a callback pair is currently registered.
    #[must_use]
    pub fn has_callbacks(&self) -> bool {
        self.bridge.is_registered()
    }

    /// Initialize the engine.
    ///
    /// Forwards the descriptor, registers `callbacks` (replacing any
    /// previous pair) and only then calls the engine initializer, so events
    /// emitted during initialization reach the new callbacks. Without
    /// callbacks the current registration, if any, is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::InvalidConfiguration`] for empty identifiers,
    /// or the engine's error verbatim. On engine failure the registration
    /// made by this call is released.
    pub async fn initialize(
        &self,
        config: &ShieldConfig,
        callbacks: Option<ShieldCallbacks>,
    ) -> ShieldResult<()> {
        let ctx = self.context("initialize");
        async move {
            config.validate()?;

            self.engine
                .set_cross_platform_parameters(&self.descriptor.name, &self.descriptor.version);

            let args = config.to_init_args(callbacks.is_some());
            let armed = callbacks.map(|callbacks| {
                let registration = self.bridge.register(callbacks);
                let id = registration.id();
                // The superseded handle is dropped here; its release is a no-op.
                *self.registration_slot() = Some(registration);
                id
            });

            match self.engine.initialize(args).await {
                Ok(()) => {
                    info!(
                        site_id = %config.site_id,
                        has_callbacks = armed.is_some(),
                        "Engine initialized"
                    );
                    Ok(())
                },
                Err(e) => {
                    if let Some(id) = armed {
                        let mut slot = self.registration_slot();
                        if slot.as_ref().is_some_and(|r| r.id() == id)
                            && let Some(mut registration) = slot.take()
                        {
                            registration.release();
                        }
                    }
                    warn!(error = %e, "Engine initialization failed");
                    Err(e)
                },
            }
        }
        .instrument(ctx.span())
        .await
    }

    /// Remove the active callback registration.
    ///
    /// Returns `true` if one was removed.
    pub fn release_callbacks(&self) -> bool {
        let released = self
            .registration_slot()
            .take()
            .is_some_and(|mut registration| registration.release());
        if released {
            debug!(correlation_id = %self.correlation_id, "Callbacks released");
        }
        released
    }

    /// Ask the engine whether it is initialized.
    ///
    /// # Errors
    ///
    /// Returns the engine's error verbatim.
    pub async fn is_initialized(&self) -> ShieldResult<bool> {
        let ctx = self.context("is_initialized");
        self.engine.is_initialized().instrument(ctx.span()).await
    }

    /// Wait until the engine is usable.
    ///
    /// Never fails; see [`ReadinessGate::check`].
    pub async fn ready(&self) -> Readiness {
        let ctx = self
            .context("ready")
            .with_metadata("policy", self.gate.options().policy.to_string());
        let span = ctx.span();
        let outcome = self.gate.check().instrument(span.clone()).await;
        span.in_scope(|| debug!(%outcome, elapsed_ms = ctx.elapsed_ms(), "Readiness resolved"));
        outcome
    }

    /// Wait until the engine is usable and report the outcome to `callback`
    /// exactly once.
    pub async fn await_ready<F>(&self, callback: F)
    where
        F: FnOnce(bool) + Send,
    {
        let outcome = self.ready().await;
        callback(outcome.is_ready());
    }

    /// Current engine session identifier.
    ///
    /// Call after [`ready`](Self::ready) reports ready.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::NotInitialized`] if the engine has no session
    /// yet, or the engine's error verbatim.
    pub async fn session_id(&self) -> ShieldResult<String> {
        let ctx = self.context("session_id");
        async move {
            self.engine
                .session_id()
                .await?
                .ok_or(ShieldError::NotInitialized)
        }
        .instrument(ctx.span())
        .await
    }

    /// Forward screen attributes to the engine. Fire-and-forget.
    pub fn send_attributes(&self, screen_name: &str, attributes: Attributes) {
        let _guard = OperationGuard::new(self.context("send_attributes"));
        if screen_name.is_empty() {
            warn!("Sending attributes with an empty screen name");
        }
        debug!(screen_name, attribute_count = attributes.len(), "Forwarding attributes");
        self.engine.send_attributes(screen_name, attributes);
    }

    /// Fetch the most recent device result.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::NativeCallFailed`] carrying the engine's error
    /// payload, or [`ShieldError::Abandoned`] if the engine dropped both
    /// callbacks without calling either.
    pub async fn latest_device_result(&self) -> ShieldResult<DeviceResult> {
        let ctx = self.context("latest_device_result");
        async move {
            let (on_success, settlement) = settle_pair::<DeviceResult, ShieldError>();
            let on_error = on_success.clone();

            self.engine.latest_device_result(
                Box::new(move |payload| {
                    if !on_success.resolve(DeviceResult::new(payload)) {
                        debug!("Device result already settled");
                    }
                }),
                Box::new(move |payload| {
                    if !on_error.reject(ShieldError::NativeCallFailed(payload)) {
                        debug!("Device result already settled");
                    }
                }),
            );

            settlement
                .await
                .unwrap_or(Err(ShieldError::Abandoned("latest_device_result")))
        }
        .instrument(ctx.span())
        .await
    }

    fn context(&self, operation: &str) -> OperationContext {
        OperationContext::new("shield-session")
            .with_correlation_id(self.correlation_id)
            .with_operation(operation)
    }

    fn registration_slot(&self) -> MutexGuard<'_, Option<Registration>> {
        self.registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use shield_core::{InitArgs, NativeCallback};
    use shield_events::ShieldEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Outcome {
        Succeed,
        Fail,
        Both,
        Drop,
    }

    struct LocalEngine {
        bus: EventBus,
        init_fails: bool,
        emit_on_init: bool,
        device: Outcome,
        init_calls: AtomicUsize,
    }

    impl LocalEngine {
        fn new(bus: &EventBus) -> Self {
            Self {
                bus: bus.clone(),
                init_fails: false,
                emit_on_init: false,
                device: Outcome::Succeed,
                init_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Engine for LocalEngine {
        async fn initialize(&self, _args: InitArgs) -> ShieldResult<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.emit_on_init {
                self.bus.publish(ShieldEvent::success(json!({"phase": "init"})));
            }
            if self.init_fails {
                return Err(ShieldError::Internal("native init failed".to_owned()));
            }
            Ok(())
        }

        fn set_cross_platform_parameters(&self, _name: &str, _version: &str) {}

        async fn is_initialized(&self) -> ShieldResult<bool> {
            Ok(true)
        }

        fn set_readiness_listener(&self) {}

        async fn session_id(&self) -> ShieldResult<Option<String>> {
            Ok(None)
        }

        fn send_attributes(&self, _screen_name: &str, _attributes: Attributes) {}

        fn latest_device_result(&self, on_success: NativeCallback, on_error: NativeCallback) {
            match self.device {
                Outcome::Succeed => on_success(json!({"score": 0.1})),
                Outcome::Fail => on_error(json!("unknown error")),
                Outcome::Both => {
                    on_error(json!("late"));
                    on_success(json!({"score": 0.2}));
                },
                Outcome::Drop => {},
            }
        }
    }

    fn session_over(engine: LocalEngine) -> (Arc<LocalEngine>, ShieldSession) {
        let engine = Arc::new(engine);
        let bus = engine.bus.clone();
        let session = ShieldSession::new(engine.clone(), bus);
        (engine, session)
    }

    fn counting() -> (Arc<AtomicUsize>, ShieldCallbacks) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callbacks = ShieldCallbacks::new().on_success(move |_: Value| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, callbacks)
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_engine() {
        let bus = EventBus::new();
        let (engine, session) = session_over(LocalEngine::new(&bus));

        let err = session
            .initialize(&ShieldConfig::new("", "K1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShieldError::InvalidConfiguration { .. }));
        assert_eq!(engine.init_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_callbacks_armed_before_initializer() {
        let bus = EventBus::new();
        let mut local = LocalEngine::new(&bus);
        local.emit_on_init = true;
        let (_engine, session) = session_over(local);

        let (count, callbacks) = counting();
        session
            .initialize(&ShieldConfig::new("S1", "K1"), Some(callbacks))
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(session.has_callbacks());
    }

    #[tokio::test]
    async fn test_failed_init_releases_registration() {
        let bus = EventBus::new();
        let mut local = LocalEngine::new(&bus);
        local.init_fails = true;
        let (_engine, session) = session_over(local);

        let (_count, callbacks) = counting();
        let err = session
            .initialize(&ShieldConfig::new("S1", "K1"), Some(callbacks))
            .await
            .unwrap_err();
        assert!(matches!(err, ShieldError::Internal(ref m) if m == "native init failed"));
        assert!(!session.has_callbacks());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_release_callbacks() {
        let bus = EventBus::new();
        let (_engine, session) = session_over(LocalEngine::new(&bus));

        let (count, callbacks) = counting();
        session
            .initialize(&ShieldConfig::new("S1", "K1"), Some(callbacks))
            .await
            .unwrap();
        assert!(session.release_callbacks());
        assert!(!session.release_callbacks());

        bus.publish(ShieldEvent::success(json!({})));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_id_missing() {
        let bus = EventBus::new();
        let (_engine, session) = session_over(LocalEngine::new(&bus));
        assert!(matches!(
            session.session_id().await,
            Err(ShieldError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_device_result_outcomes() {
        let bus = EventBus::new();

        let (_e, session) = session_over(LocalEngine::new(&bus));
        let result = session.latest_device_result().await.unwrap();
        assert_eq!(result.as_value(), &json!({"score": 0.1}));

        let mut local = LocalEngine::new(&bus);
        local.device = Outcome::Fail;
        let (_e, session) = session_over(local);
        let err = session.latest_device_result().await.unwrap_err();
        assert_eq!(err.native_payload(), Some(&json!("unknown error")));

        let mut local = LocalEngine::new(&bus);
        local.device = Outcome::Both;
        let (_e, session) = session_over(local);
        let err = session.latest_device_result().await.unwrap_err();
        assert_eq!(err.native_payload(), Some(&json!("late")));

        let mut local = LocalEngine::new(&bus);
        local.device = Outcome::Drop;
        let (_e, session) = session_over(local);
        assert!(matches!(
            session.latest_device_result().await,
            Err(ShieldError::Abandoned(_))
        ));
    }

    #[test]
    fn test_with_descriptor() {
        let bus = EventBus::new();
        let (_e, session) = session_over(LocalEngine::new(&bus));
        assert_eq!(session.descriptor(), &binding_descriptor());

        let session = session.with_descriptor(CrossPlatformDescriptor::new("flutter", "2.1.0"));
        assert_eq!(session.descriptor().name, "flutter");
    }
}

//! Readiness gate.
//!
//! Each check sleeps the grace period, starts watching for readiness
//! broadcasts, then asks the engine whether it is initialized. Watching
//! first means a readiness broadcast racing the query is still observed.
//! Broadcasts are counted apart from the event stream, so a burst of
//! `success`/`error` traffic cannot crowd one out. The watch lives only as
//! long as the check, so a broadcast that arrives after the check has
//! finished reaches nobody.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use shield_core::{Engine, Readiness, ReadinessOptions, ReadinessPolicy};
use shield_events::{EventBus, ReadinessReceiver};
use tracing::{debug, warn};

/// Decides when the engine may be used.
#[derive(Clone)]
pub struct ReadinessGate {
    engine: Arc<dyn Engine>,
    bus: EventBus,
    options: ReadinessOptions,
}

impl std::fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ReadinessGate {
    /// Create a gate over an engine and the emitter it publishes on.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, bus: EventBus, options: ReadinessOptions) -> Self {
        Self {
            engine,
            bus,
            options,
        }
    }

    /// Options this gate was built with.
    #[must_use]
    pub fn options(&self) -> &ReadinessOptions {
        &self.options
    }

    /// Run one readiness check.
    ///
    /// Never fails: query errors and panics are logged and reported as
    /// [`Readiness::NotReady`]. Each call owns its watch, so concurrent
    /// checks resolve independently.
    pub async fn check(&self) -> Readiness {
        let grace = self.options.grace();
        if !grace.is_zero() {
            tokio::time::sleep(grace).await;
        }

        let mut broadcasts = self.bus.subscribe_readiness();

        let initialized = match AssertUnwindSafe(self.engine.is_initialized())
            .catch_unwind()
            .await
        {
            Ok(Ok(initialized)) => initialized,
            Ok(Err(e)) => {
                warn!(error = %e, "Readiness query failed");
                return Readiness::NotReady;
            },
            Err(_) => {
                warn!("Readiness query panicked");
                return Readiness::NotReady;
            },
        };

        match self.options.policy {
            ReadinessPolicy::WaitForBroadcast | ReadinessPolicy::ReportOnce if initialized => {
                debug!("Engine already initialized");
                Readiness::Ready
            },
            ReadinessPolicy::ReportOnce => {
                debug!("Engine not initialized, reporting once");
                Readiness::NotReady
            },
            ReadinessPolicy::AwaitDeviceResult if !initialized => {
                debug!("Engine not initialized, device result not awaited");
                Readiness::NotReady
            },
            ReadinessPolicy::WaitForBroadcast | ReadinessPolicy::AwaitDeviceResult => {
                self.engine.set_readiness_listener();
                self.wait_for_ready(&mut broadcasts).await
            },
        }
    }

    async fn wait_for_ready(&self, broadcasts: &mut ReadinessReceiver) -> Readiness {
        let Some(limit) = self.options.timeout() else {
            broadcasts.ready().await;
            debug!("Engine reported ready");
            return Readiness::Ready;
        };

        if tokio::time::timeout(limit, broadcasts.ready()).await.is_ok() {
            debug!("Engine reported ready");
            Readiness::Ready
        } else {
            warn!(timeout_ms = self.options.timeout_ms, "Readiness wait timed out");
            Readiness::TimedOut
        }
    }
}

//! Readiness policy and outcome types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ShieldError;

/// Default grace period before the first readiness query, in milliseconds.
pub const DEFAULT_GRACE_MS: u64 = 100;

/// Default upper bound on waiting for the readiness broadcast, in milliseconds.
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 30_000;

/// How the gate turns the engine's initialized flag into a readiness outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// Ready when initialized; otherwise arm the readiness broadcast and
    /// wait for it.
    #[default]
    WaitForBroadcast,
    /// Ready when initialized; otherwise report not-ready once and let the
    /// caller retry.
    ReportOnce,
    /// Not ready until initialized. Once initialized, arm the readiness
    /// broadcast and wait for device analysis to complete.
    AwaitDeviceResult,
}

impl fmt::Display for ReadinessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitForBroadcast => write!(f, "wait_for_broadcast"),
            Self::ReportOnce => write!(f, "report_once"),
            Self::AwaitDeviceResult => write!(f, "await_device_result"),
        }
    }
}

impl FromStr for ReadinessPolicy {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "wait_for_broadcast" | "wait" => Ok(Self::WaitForBroadcast),
            "report_once" | "once" => Ok(Self::ReportOnce),
            "await_device_result" | "device_result" => Ok(Self::AwaitDeviceResult),
            other => Err(ShieldError::invalid_config(
                "readiness.policy",
                format!(
                    "unknown policy '{other}'; expected wait_for_broadcast, report_once or await_device_result"
                ),
            )),
        }
    }
}

/// Tuning for the readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessOptions {
    /// Behavior when the engine is not yet initialized.
    #[serde(default)]
    pub policy: ReadinessPolicy,
    /// Delay before querying the engine, in milliseconds.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    /// Upper bound on the broadcast wait, in milliseconds. `None` waits forever.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
}

fn default_grace_ms() -> u64 {
    DEFAULT_GRACE_MS
}

#[allow(clippy::unnecessary_wraps)]
fn default_timeout_ms() -> Option<u64> {
    Some(DEFAULT_READINESS_TIMEOUT_MS)
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            policy: ReadinessPolicy::default(),
            grace_ms: DEFAULT_GRACE_MS,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ReadinessOptions {
    /// Set the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReadinessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the grace period.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace_ms = duration_to_ms(grace);
        self
    }

    /// Set the broadcast wait bound.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(duration_to_ms(timeout));
        self
    }

    /// Wait for the broadcast without a bound.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    /// Grace period as a [`Duration`].
    #[must_use]
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Broadcast wait bound as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Outcome of a single readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// The engine can answer session and result queries.
    Ready,
    /// The engine is not initialized, or the check failed.
    NotReady,
    /// The readiness broadcast did not arrive within the configured bound.
    TimedOut,
}

impl Readiness {
    /// Boolean form delivered to bool-style callbacks.
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::NotReady => write!(f, "not_ready"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

//! Operation context for correlating calls across the engine boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Context carried by one facade operation.
///
/// All operations issued by the same session share a correlation ID, so a
/// `ready` wait can be tied back to the `initialize` that preceded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Unique operation identifier.
    pub operation_id: Uuid,
    /// Correlation ID shared by related operations.
    pub correlation_id: Uuid,
    /// When the operation started.
    pub started_at: DateTime<Utc>,
    /// Component that created this context.
    pub source: String,
    /// Operation being performed.
    pub operation: Option<String>,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl OperationContext {
    /// Create a new operation context.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            operation_id: id,
            correlation_id: id,
            started_at: Utc::now(),
            source: source.into(),
            operation: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add metadata.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Elapsed time in milliseconds since the operation started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        // started_at is set at creation, so this is never negative
        #[allow(clippy::arithmetic_side_effects)]
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds()
    }

    /// Create a tracing span for this operation.
    ///
    /// For async work attach it with `tracing::Instrument::instrument`
    /// rather than entering it across `.await` points.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "operation",
            operation_id = %self.operation_id,
            correlation_id = %self.correlation_id,
            source = %self.source,
            operation = self.operation.as_deref(),
        )
    }

    /// Short identifier for logging.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.operation_id.simple().to_string().chars().take(8).collect()
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// Guard that enters an operation span and logs completion on drop.
///
/// Only for synchronous sections; the span is entered on the current thread.
pub struct OperationGuard {
    context: OperationContext,
    /// Held to keep the span active until the guard is dropped.
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl OperationGuard {
    /// Enter the context's span.
    #[must_use]
    pub fn new(context: OperationContext) -> Self {
        let span = context.span().entered();
        tracing::trace!("Operation started");
        Self { context, span }
    }

    /// Get the operation context.
    #[must_use]
    pub fn context(&self) -> &OperationContext {
        &self.context
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        tracing::trace!(elapsed_ms = self.context.elapsed_ms(), "Operation completed");
    }
}

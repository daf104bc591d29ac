//! # Statsd Client Abstraction
//!
//! Outbound seam between the lifecycle observer and whatever statistics
//! backend a deployment wires in. Implementations are fire-and-forget: they
//! never surface transport failures back into the lifecycle handlers.
//!
//! Three implementations ship with the crate:
//! - [`LogStatsdClient`] forwards samples to structured `tracing` output
//! - [`NullStatsdClient`] discards everything
//! - [`MemoryStatsdClient`] records samples for inspection in tests

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CeleryStatsdError, Result};

/// Statistics-collection collaborator: counters and millisecond timings.
pub trait StatsdClient: Send + Sync {
    /// Increment the named counter by one.
    fn incr(&self, metric: &str);

    /// Record a duration sample in milliseconds.
    fn timing(&self, metric: &str, millis: u64);
}

/// Client that discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStatsdClient;

impl StatsdClient for NullStatsdClient {
    fn incr(&self, _metric: &str) {}

    fn timing(&self, _metric: &str, _millis: u64) {}
}

/// Client that emits samples as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatsdClient;

impl StatsdClient for LogStatsdClient {
    fn incr(&self, metric: &str) {
        debug!(metric = metric, kind = "counter", value = 1u64, "statsd sample");
    }

    fn timing(&self, metric: &str, millis: u64) {
        debug!(metric = metric, kind = "timing", value_ms = millis, "statsd sample");
    }
}

/// In-memory recording client for tests and local inspection.
#[derive(Debug, Default)]
pub struct MemoryStatsdClient {
    counters: RwLock<HashMap<String, u64>>,
    timers: RwLock<HashMap<String, Vec<u64>>>,
}

impl MemoryStatsdClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if never incremented.
    pub fn counter(&self, metric: &str) -> u64 {
        self.counters.read().get(metric).copied().unwrap_or(0)
    }

    /// Timing samples recorded under a metric, in arrival order.
    pub fn timings(&self, metric: &str) -> Vec<u64> {
        self.timers.read().get(metric).cloned().unwrap_or_default()
    }

    /// Total increments across all counters.
    pub fn total_increments(&self) -> u64 {
        self.counters.read().values().sum()
    }

    /// Total timing samples across all metrics.
    pub fn total_timing_samples(&self) -> usize {
        self.timers.read().values().map(Vec::len).sum()
    }

    /// Drop everything recorded so far.
    pub fn reset(&self) {
        self.counters.write().clear();
        self.timers.write().clear();
    }
}

impl StatsdClient for MemoryStatsdClient {
    fn incr(&self, metric: &str) {
        *self.counters.write().entry(metric.to_string()).or_insert(0) += 1;
    }

    fn timing(&self, metric: &str, millis: u64) {
        self.timers
            .write()
            .entry(metric.to_string())
            .or_default()
            .push(millis);
    }
}

/// Construct a statsd client from its configured name.
///
/// Recognizes `"log"`, `"null"` and `"memory"`; anything else is a
/// configuration error.
pub fn client_from_name(name: &str) -> Result<Arc<dyn StatsdClient>> {
    match name {
        "log" => Ok(Arc::new(LogStatsdClient)),
        "null" => Ok(Arc::new(NullStatsdClient)),
        "memory" => Ok(Arc::new(MemoryStatsdClient::new())),
        other => Err(CeleryStatsdError::UnknownClient(other.to_string())),
    }
}

//! # Lifecycle Metrics Observer
//!
//! Translates task-queue lifecycle signals into statsd counters and timing
//! samples, correlating paired signals through transient in-memory tables.
//!
//! ## Emitted metrics
//!
//! - `after_task_publish` increments `celery.<type>.sent`, and when the
//!   matching publish start is known, times `celery.<type>.publish.runtime`
//! - `task_prerun` increments `celery.<name>.start`
//! - `task_postrun` increments `celery.<name>.done`, and when the matching
//!   run start is known, times `celery.<name>.runtime`
//! - `task_failure` increments `celery.<identifier>.failure`
//!
//! ## Correlation
//!
//! Publish starts are keyed by task type, so overlapping publishes of the same
//! type overwrite each other's start time and the last write wins. Run starts
//! are keyed by invocation id and never collide. A failed invocation leaves
//! its run-start entry behind; deployments that care can run the orphan
//! sweeper.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::StatsdClient;
use crate::constants::metrics;
use crate::signals::CelerySignal;

/// Time source seam so tests can drive exact durations.
pub(crate) trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by the monotonic system clock.
#[derive(Debug, Default)]
pub(crate) struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Entry counts of the observer's correlation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverStats {
    /// Publishes begun but not yet acknowledged by the broker.
    pub pending_publishes: usize,
    /// Invocations started but not yet finished.
    pub pending_runs: usize,
}

/// Observer that turns lifecycle signals into statsd metrics.
///
/// All handlers are non-blocking and infallible: signals missing the
/// identifier a handler keys on are skipped, and unmatched completions emit
/// their counter without a timing sample. Shared freely across threads behind
/// an [`Arc`].
pub struct CeleryMetricsObserver {
    client: Arc<dyn StatsdClient>,
    /// Publish start times keyed by task type.
    publish_started: DashMap<String, Instant>,
    /// Run start times keyed by invocation id.
    run_started: DashMap<Uuid, Instant>,
    clock: Arc<dyn Clock>,
}

impl CeleryMetricsObserver {
    /// Create an observer emitting through the given statsd client.
    pub fn new(client: Arc<dyn StatsdClient>) -> Self {
        Self::with_clock(client, Arc::new(MonotonicClock))
    }

    pub(crate) fn with_clock(client: Arc<dyn StatsdClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            publish_started: DashMap::new(),
            run_started: DashMap::new(),
            clock,
        }
    }

    /// Route a signal to its lifecycle handler.
    ///
    /// Signals missing the identifier their handler keys on are inapplicable
    /// and skipped with a debug log.
    pub fn handle(&self, signal: &CelerySignal) {
        match signal {
            CelerySignal::BeforeTaskPublish { sender, .. } => self.on_before_task_publish(sender),
            CelerySignal::AfterTaskPublish { sender, .. } => self.on_after_task_publish(sender),
            CelerySignal::TaskPrerun { task_id, task_name } => match task_name {
                Some(task_name) => self.on_task_prerun(*task_id, task_name),
                None => debug!(
                    task_id = %task_id,
                    signal = signal.name(),
                    "Task name missing - skipping handler"
                ),
            },
            CelerySignal::TaskPostrun { task_id, task_name } => match task_name {
                Some(task_name) => self.on_task_postrun(*task_id, task_name),
                None => debug!(
                    task_id = %task_id,
                    signal = signal.name(),
                    "Task name missing - skipping handler"
                ),
            },
            CelerySignal::TaskFailure {
                task_id,
                sender,
                exception,
            } => match sender {
                Some(sender) => {
                    if let Some(exception) = exception {
                        debug!(task_id = %task_id, exception = %exception, "Task failure observed");
                    }
                    self.on_task_failure(sender);
                }
                None => debug!(
                    task_id = %task_id,
                    signal = signal.name(),
                    "Sender missing - skipping handler"
                ),
            },
        }
    }

    /// Record the moment a publish of `sender` began. Emits nothing.
    pub fn on_before_task_publish(&self, sender: &str) {
        self.publish_started
            .insert(sender.to_string(), self.clock.now());
    }

    /// Count a sent task and, when the publish start is known, time the publish.
    ///
    /// Emits the `celery.<type>.sent` counter first, then consumes the
    /// matching start entry and emits `celery.<type>.publish.runtime`.
    pub fn on_after_task_publish(&self, sender: &str) {
        self.client.incr(&metric(sender, metrics::SENT));

        if let Some((_, started)) = self.publish_started.remove(sender) {
            let elapsed = self.elapsed_ms(started);
            self.client
                .timing(&metric(sender, metrics::PUBLISH_RUNTIME), elapsed);
        } else {
            debug!(sender = sender, "Publish start unknown - no publish.runtime sample");
        }
    }

    /// Count a task start and record the run start under its invocation id.
    ///
    /// Emits the `celery.<name>.start` counter first, then stores the start
    /// time.
    pub fn on_task_prerun(&self, task_id: Uuid, task_name: &str) {
        self.client.incr(&metric(task_name, metrics::START));
        self.run_started.insert(task_id, self.clock.now());
    }

    /// Count a finished task and, when the run start is known, time the run.
    ///
    /// Emits the `celery.<name>.done` counter first, then consumes the
    /// matching start entry and emits `celery.<name>.runtime`.
    pub fn on_task_postrun(&self, task_id: Uuid, task_name: &str) {
        self.client.incr(&metric(task_name, metrics::DONE));

        if let Some((_, started)) = self.run_started.remove(&task_id) {
            let elapsed = self.elapsed_ms(started);
            self.client
                .timing(&metric(task_name, metrics::RUNTIME), elapsed);
        } else {
            debug!(
                task_id = %task_id,
                task_name = task_name,
                "Run start unknown - no runtime sample"
            );
        }
    }

    /// Count a task failure, keyed on the raw sender token.
    ///
    /// Touches neither correlation table: the failed invocation's run-start
    /// entry stays behind until a postrun for the same id or the orphan
    /// sweeper removes it.
    pub fn on_task_failure(&self, sender: &str) {
        self.client.incr(&metric(sender, metrics::FAILURE));
    }

    /// Entry counts of both correlation tables.
    pub fn stats(&self) -> ObserverStats {
        ObserverStats {
            pending_publishes: self.publish_started.len(),
            pending_runs: self.run_started.len(),
        }
    }

    /// Whether a run-start entry is pending for an invocation id.
    pub fn has_pending_run(&self, task_id: &Uuid) -> bool {
        self.run_started.contains_key(task_id)
    }

    /// Evict run-start entries older than `max_age`, returning the eviction count.
    ///
    /// Entries linger when a task failed or its worker died between prerun and
    /// postrun.
    pub fn sweep_orphaned_runs(&self, max_age: Duration) -> usize {
        let now = self.clock.now();

        // Prerun inserts can land mid-sweep, so a len() diff would miscount.
        let mut removed_count = 0;
        self.run_started.retain(|_, started| {
            let keep = now.duration_since(*started) <= max_age;
            if !keep {
                removed_count += 1;
            }
            keep
        });

        if removed_count > 0 {
            warn!(
                removed_count = removed_count,
                remaining_count = self.run_started.len(),
                "Evicted orphaned run-start entries past max age"
            );
        }

        removed_count
    }

    /// Run [`sweep_orphaned_runs`](Self::sweep_orphaned_runs) on a cadence in a
    /// background task.
    ///
    /// Panics if `sweep_interval` is zero. Requires a running tokio runtime;
    /// the returned handle lets embedders abort the sweeper on shutdown.
    pub fn spawn_orphan_sweeper(
        self: Arc<Self>,
        sweep_interval: Duration,
        max_age: Duration,
    ) -> tokio::task::JoinHandle<()> {
        // Built outside the spawn so a zero interval panics the caller, not
        // the detached task.
        let mut interval = tokio::time::interval(sweep_interval);

        info!(
            sweep_interval_ms = sweep_interval.as_millis() as u64,
            max_age_ms = max_age.as_millis() as u64,
            "Starting orphaned-run sweeper"
        );

        tokio::spawn(async move {
            loop {
                interval.tick().await;
                self.sweep_orphaned_runs(max_age);
            }
        })
    }

    fn elapsed_ms(&self, started: Instant) -> u64 {
        // Truncates to whole milliseconds; duration_since saturates to zero
        // if the clock reads backwards.
        self.clock.now().duration_since(started).as_millis() as u64
    }
}

impl std::fmt::Debug for CeleryMetricsObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CeleryMetricsObserver")
            .field("pending_publishes", &self.publish_started.len())
            .field("pending_runs", &self.run_started.len())
            .finish()
    }
}

/// Assemble a metric name as `celery.<task>.<suffix>`.
fn metric(task: &str, suffix: &str) -> String {
    format!("{}.{task}.{suffix}", metrics::PREFIX)
}

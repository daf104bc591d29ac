#![allow(clippy::doc_markdown)] // Allow technical terms like Celery, statsd in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Celery Statsd
//!
//! Statsd lifecycle instrumentation for Celery-compatible task queues.
//!
//! ## Overview
//!
//! The crate observes the five task lifecycle signals a Celery-style framework
//! emits around publishing and execution, and turns them into statsd counters
//! and timing samples. Paired signals are correlated through transient
//! in-memory tables: publish begin/end by task type, run begin/end by
//! invocation id.
//!
//! ## Emitted metrics
//!
//! - `celery.<type>.sent` and `celery.<type>.publish.runtime` around publishing
//! - `celery.<name>.start`, `celery.<name>.done` and `celery.<name>.runtime`
//!   around execution
//! - `celery.<identifier>.failure` on task failure
//!
//! Names are read by existing dashboards and stay byte-for-byte stable.
//!
//! ## Key Properties
//!
//! - **Infallible handlers**: sparse payloads are skipped, unmatched
//!   completions emit their counter without a timing sample
//! - **Thread-safe correlation**: lock-free concurrent maps keyed by task type
//!   and invocation id
//! - **Graceful degradation**: registration without a signal bus is a no-op
//! - **Pluggable backends**: statsd clients behind a trait, selected by name
//!
//! ## Module Organization
//!
//! - [`clients`] - statsd client trait and built-in implementations
//! - [`config`] - environment-driven runtime configuration
//! - [`constants`] - signal names and metric segments
//! - [`error`] - structured error handling
//! - [`logging`] - tracing initialization helpers
//! - [`observer`] - the lifecycle metrics observer
//! - [`signals`] - signal payloads and the dispatch registry
//! - [`subscriber`] - observer registration against the bus
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use celery_statsd::{
//!     register_celery_events, CelerySignal, CeleryMetricsObserver, MemoryStatsdClient,
//!     SignalRegistry,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let client = Arc::new(MemoryStatsdClient::new());
//! let observer = Arc::new(CeleryMetricsObserver::new(client.clone()));
//!
//! let mut registry = SignalRegistry::new();
//! let bound = register_celery_events(Some(&mut registry), &observer);
//! assert_eq!(bound, 5);
//!
//! let task_id = uuid::Uuid::new_v4();
//! registry
//!     .dispatch(&CelerySignal::prerun(task_id, "resize_image"))
//!     .await;
//! registry
//!     .dispatch(&CelerySignal::postrun(task_id, "resize_image"))
//!     .await;
//!
//! assert_eq!(client.counter("celery.resize_image.start"), 1);
//! assert_eq!(client.counter("celery.resize_image.done"), 1);
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observer;
pub mod signals;
pub mod subscriber;

pub use clients::{
    client_from_name, LogStatsdClient, MemoryStatsdClient, NullStatsdClient, StatsdClient,
};
pub use config::MetricsConfig;
pub use constants::{metrics as metric_names, signals as signal_names};
pub use error::{CeleryStatsdError, Result};
pub use logging::init_logging;
pub use observer::{CeleryMetricsObserver, ObserverStats};
pub use signals::{CelerySignal, SignalRegistry};
pub use subscriber::register_celery_events;

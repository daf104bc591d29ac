//! # Signal Registry
//!
//! Subscription and dispatch system for task lifecycle signals. Stands in for
//! the task-queue framework's signal bus: the framework integration dispatches
//! signals, consumers connect handlers by signal name.
//!
//! ## Features
//!
//! - **Named Connections**: Handlers bind to exact signal names
//! - **Concurrent Dispatch**: Handlers execute in parallel via `futures::join_all`
//! - **Error Collection**: All handlers execute even if some fail
//!
//! ## Usage Example
//!
//! ```rust
//! use celery_statsd::signals::{CelerySignal, SignalHandlerError, SignalRegistry};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut registry = SignalRegistry::new();
//!
//! let handler = Arc::new(|signal: CelerySignal| {
//!     Box::pin(async move {
//!         println!("observed: {}", signal.name());
//!         Ok(())
//!     })
//!         as std::pin::Pin<
//!             Box<dyn std::future::Future<Output = Result<(), SignalHandlerError>> + Send>,
//!         >
//! });
//! registry.connect("task_prerun", handler).unwrap();
//!
//! let signal = CelerySignal::prerun(uuid::Uuid::new_v4(), "resize_image");
//! let errors = registry.dispatch(&signal).await;
//! assert!(errors.is_empty());
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use super::types::CelerySignal;

/// Signal handler function type
///
/// Handlers are async functions that process lifecycle signals. They must be:
/// - `Send + Sync` for thread-safe sharing
/// - Return a pinned future for async execution
/// - Return `Result<(), SignalHandlerError>` for error handling
pub type SignalHandler = Arc<
    dyn Fn(CelerySignal) -> Pin<Box<dyn Future<Output = Result<(), SignalHandlerError>> + Send>>
        + Send
        + Sync,
>;

/// Errors that can occur during registry connection management
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Signal name failed validation
    #[error("Invalid signal name '{name}': {reason}")]
    InvalidSignalName { name: String, reason: String },
}

/// Errors that can occur during signal handler execution
#[derive(Debug, Clone, Error)]
pub enum SignalHandlerError {
    /// Handler execution failed
    #[error("Handler for signal '{signal}' failed: {reason}")]
    ExecutionFailed { signal: String, reason: String },

    /// Generic error for handler failures
    #[error("Handler error: {0}")]
    Generic(String),
}

/// Signal registry with named connections
///
/// Manages handler connections and dispatches signals to every handler bound
/// to the signal's name. All matching handlers execute concurrently using
/// `futures::join_all`; errors from individual handlers are collected but
/// don't stop other handlers.
#[derive(Default)]
pub struct SignalRegistry {
    /// Map of signal names to connected handlers
    connections: HashMap<String, Vec<SignalHandler>>,
}

impl SignalRegistry {
    /// Create a new signal registry
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Connect a handler to a signal name
    ///
    /// Multiple handlers may connect to the same name; dispatch runs them all.
    pub fn connect(
        &mut self,
        signal_name: &str,
        handler: SignalHandler,
    ) -> Result<(), RegistryError> {
        if signal_name.is_empty() {
            return Err(RegistryError::InvalidSignalName {
                name: signal_name.to_string(),
                reason: "Signal name cannot be empty".to_string(),
            });
        }

        self.connections
            .entry(signal_name.to_string())
            .or_default()
            .push(handler);

        Ok(())
    }

    /// Dispatch a signal to all handlers connected to its name
    ///
    /// Handlers execute concurrently; the returned vector holds errors from
    /// failed handlers (empty when all succeeded or none were connected).
    pub async fn dispatch(&self, signal: &CelerySignal) -> Vec<SignalHandlerError> {
        let Some(handlers) = self.connections.get(signal.name()) else {
            return Vec::new();
        };

        let futures: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let handler = Arc::clone(handler);
                let signal = signal.clone();
                async move { handler(signal).await.err() }
            })
            .collect();

        let results = join_all(futures).await;

        results.into_iter().flatten().collect()
    }

    /// Get the number of signal names with at least one handler
    pub fn signal_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the total number of handlers across all signal names
    pub fn handler_count(&self) -> usize {
        self.connections.values().map(Vec::len).sum()
    }

    /// Clear all connections
    pub fn clear(&mut self) {
        self.connections.clear();
    }
}

// Manual Debug implementation for SignalRegistry
impl std::fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("signal_count", &self.signal_count())
            .field("handler_count", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Helper to create a success handler with counter
    fn create_counting_handler(counter: Arc<AtomicUsize>) -> SignalHandler {
        Arc::new(move |_signal| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
    }

    /// Helper to create a failing handler
    fn create_failing_handler(error_msg: &str) -> SignalHandler {
        let msg = error_msg.to_string();
        Arc::new(move |signal| {
            let msg = msg.clone();
            Box::pin(async move {
                Err(SignalHandlerError::ExecutionFailed {
                    signal: signal.name().to_string(),
                    reason: msg,
                })
            })
        })
    }

    #[test]
    fn test_new_registry() {
        let registry = SignalRegistry::new();
        assert_eq!(registry.signal_count(), 0);
        assert_eq!(registry.handler_count(), 0);
    }

    #[test]
    fn test_connect_named_signal() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = create_counting_handler(counter);

        let result = registry.connect("task_prerun", handler);
        assert!(result.is_ok());
        assert_eq!(registry.signal_count(), 1);
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_connect_empty_name() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = create_counting_handler(counter);

        let result = registry.connect("", handler);
        assert!(result.is_err());

        match result {
            Err(RegistryError::InvalidSignalName { name, reason }) => {
                assert_eq!(name, "");
                assert!(reason.contains("empty"));
            }
            _ => panic!("Expected InvalidSignalName error"),
        }
    }

    #[test]
    fn test_multiple_handlers_same_signal() {
        let mut registry = SignalRegistry::new();
        let counter1 = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::new(AtomicUsize::new(0));

        let handler1 = create_counting_handler(counter1);
        let handler2 = create_counting_handler(counter2);

        registry.connect("task_prerun", handler1).unwrap();
        registry.connect("task_prerun", handler2).unwrap();

        assert_eq!(registry.signal_count(), 1);
        assert_eq!(registry.handler_count(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_named_match() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = create_counting_handler(counter.clone());

        registry.connect("task_prerun", handler).unwrap();

        let signal = CelerySignal::prerun(Uuid::new_v4(), "resize_image");
        let errors = registry.dispatch(&signal).await;

        assert!(errors.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_no_match() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = create_counting_handler(counter.clone());

        registry.connect("task_postrun", handler).unwrap();

        let signal = CelerySignal::prerun(Uuid::new_v4(), "resize_image");
        let errors = registry.dispatch(&signal).await;

        assert!(errors.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_partial_failure() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        // Mix of successful and failing handlers
        let success_handler = create_counting_handler(counter.clone());
        let failing_handler = create_failing_handler("intentional failure");

        registry.connect("task_failure", success_handler).unwrap();
        registry.connect("task_failure", failing_handler).unwrap();

        let signal = CelerySignal::failure(Uuid::new_v4(), "app.tasks.resize_image");
        let errors = registry.dispatch(&signal).await;

        // One handler should succeed, one should fail
        assert_eq!(errors.len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        match &errors[0] {
            SignalHandlerError::ExecutionFailed { signal, reason } => {
                assert_eq!(signal, "task_failure");
                assert!(reason.contains("intentional failure"));
            }
            _ => panic!("Expected ExecutionFailed error"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_concurrent_execution() {
        use std::time::Duration;
        use tokio::time::sleep;

        let mut registry = SignalRegistry::new();

        // Create handlers that sleep for the same duration
        let handler1 = Arc::new(|_signal: CelerySignal| {
            Box::pin(async move {
                sleep(Duration::from_millis(50)).await;
                Ok(())
            }) as Pin<Box<dyn Future<Output = Result<(), SignalHandlerError>> + Send>>
        });

        let handler2 = Arc::new(|_signal: CelerySignal| {
            Box::pin(async move {
                sleep(Duration::from_millis(50)).await;
                Ok(())
            }) as Pin<Box<dyn Future<Output = Result<(), SignalHandlerError>> + Send>>
        });

        registry.connect("task_postrun", handler1).unwrap();
        registry.connect("task_postrun", handler2).unwrap();

        let signal = CelerySignal::postrun(Uuid::new_v4(), "resize_image");

        // If concurrent, should take ~50ms. If sequential, would take ~100ms.
        let start = std::time::Instant::now();
        let errors = registry.dispatch(&signal).await;
        let elapsed = start.elapsed();

        assert!(errors.is_empty());
        assert!(
            elapsed < Duration::from_millis(80),
            "Handlers should execute concurrently, took {:?}",
            elapsed
        );
    }

    #[test]
    fn test_clear_registry() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = create_counting_handler(counter);

        registry.connect("task_prerun", handler).unwrap();
        assert_eq!(registry.signal_count(), 1);

        registry.clear();
        assert_eq!(registry.signal_count(), 0);
        assert_eq!(registry.handler_count(), 0);
    }

    #[test]
    fn test_debug_impl() {
        let mut registry = SignalRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = create_counting_handler(counter);

        registry.connect("task_prerun", handler).unwrap();

        let debug_str = format!("{:?}", registry);
        assert!(debug_str.contains("SignalRegistry"));
        assert!(debug_str.contains("signal_count"));
        assert!(debug_str.contains("handler_count"));
    }
}

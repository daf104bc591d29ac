//! Observer registration against the task-queue signal bus.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::constants::signals;
use crate::observer::CeleryMetricsObserver;
use crate::signals::{SignalHandler, SignalHandlerError, SignalRegistry};

/// Bind the observer's five lifecycle handlers to the signal bus.
///
/// Pass `None` in processes where the task-queue framework is not present;
/// registration then degrades to a no-op and the rest of the crate stays
/// usable. Returns the number of handlers bound.
pub fn register_celery_events(
    registry: Option<&mut SignalRegistry>,
    observer: &Arc<CeleryMetricsObserver>,
) -> usize {
    let Some(registry) = registry else {
        debug!("Task-queue signal bus unavailable - lifecycle handlers not bound");
        return 0;
    };

    let mut bound = 0;
    for signal_name in signals::ALL {
        match registry.connect(signal_name, observer_handler(observer)) {
            Ok(()) => bound += 1,
            Err(e) => error!(signal = signal_name, error = %e, "Failed to bind lifecycle handler"),
        }
    }

    info!(bound = bound, "📊 Lifecycle metrics handlers registered");
    bound
}

/// Handler closure delegating to [`CeleryMetricsObserver::handle`].
fn observer_handler(observer: &Arc<CeleryMetricsObserver>) -> SignalHandler {
    let observer = Arc::clone(observer);
    Arc::new(move |signal| {
        let observer = Arc::clone(&observer);
        Box::pin(async move {
            observer.handle(&signal);
            Ok(())
        }) as Pin<Box<dyn Future<Output = Result<(), SignalHandlerError>> + Send>>
    })
}

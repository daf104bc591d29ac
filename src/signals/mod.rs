//! # Task Lifecycle Signals
//!
//! Signal payload types and the subscription registry that connects the
//! metrics observer to a task-queue bus.

pub mod registry;
pub mod types;

pub use registry::{RegistryError, SignalHandler, SignalHandlerError, SignalRegistry};
pub use types::CelerySignal;

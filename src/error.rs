use thiserror::Error;

/// Errors surfaced by the metrics adapter.
///
/// Lifecycle handling itself has no fatal paths: handlers skip inapplicable
/// signals and a missing task-queue bus degrades registration to a no-op.
/// Errors exist only at the edges, when configuration is parsed and when a
/// statsd client is selected by name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CeleryStatsdError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown statsd client '{0}'")]
    UnknownClient(String),
}

pub type Result<T> = std::result::Result<T, CeleryStatsdError>;

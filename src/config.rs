use crate::error::{CeleryStatsdError, Result};
use std::time::Duration;

/// Runtime configuration for the metrics adapter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Statsd client selected by name: "log", "null" or "memory".
    pub client: String,
    /// Age after which unmatched run-start entries are swept, in seconds.
    /// `None` disables sweeping and keeps entries indefinitely.
    pub orphan_max_age_secs: Option<u64>,
    /// Cadence of the orphan sweeper when sweeping is enabled, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            client: "log".to_string(),
            orphan_max_age_secs: None,
            sweep_interval_secs: 30,
        }
    }
}

impl MetricsConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(client) = std::env::var("CELERY_STATSD_CLIENT") {
            config.client = client;
        }

        if let Ok(max_age) = std::env::var("CELERY_STATSD_ORPHAN_MAX_AGE_SECS") {
            config.orphan_max_age_secs = Some(max_age.parse().map_err(|e| {
                CeleryStatsdError::Configuration(format!("Invalid orphan_max_age_secs: {e}"))
            })?);
        }

        if let Ok(interval) = std::env::var("CELERY_STATSD_SWEEP_INTERVAL_SECS") {
            config.sweep_interval_secs = interval.parse().map_err(|e| {
                CeleryStatsdError::Configuration(format!("Invalid sweep_interval_secs: {e}"))
            })?;
        }

        if config.sweep_interval_secs == 0 {
            return Err(CeleryStatsdError::Configuration(
                "sweep_interval_secs must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    /// Sweep eviction threshold as a [`Duration`], when sweeping is enabled.
    pub fn orphan_max_age(&self) -> Option<Duration> {
        self.orphan_max_age_secs.map(Duration::from_secs)
    }

    /// Sweeper cadence as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

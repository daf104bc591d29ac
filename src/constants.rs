//! # Signal and Metric Constants
//!
//! Wire-level names for the task-queue lifecycle signals this crate consumes
//! and the statsd metric segments it emits.
//!
//! Metric names are read by existing dashboards and alerting rules; the
//! assembled `celery.<task>.<suffix>` strings must stay byte-for-byte stable.

/// Lifecycle signal names as delivered by the task-queue bus
pub mod signals {
    // Publisher-side signals
    pub const BEFORE_TASK_PUBLISH: &str = "before_task_publish";
    pub const AFTER_TASK_PUBLISH: &str = "after_task_publish";

    // Worker-side signals
    pub const TASK_PRERUN: &str = "task_prerun";
    pub const TASK_POSTRUN: &str = "task_postrun";
    pub const TASK_FAILURE: &str = "task_failure";

    /// All five lifecycle signals, in lifecycle order
    pub const ALL: [&str; 5] = [
        BEFORE_TASK_PUBLISH,
        AFTER_TASK_PUBLISH,
        TASK_PRERUN,
        TASK_POSTRUN,
        TASK_FAILURE,
    ];
}

/// Statsd metric segments, assembled as `celery.<task>.<suffix>`
pub mod metrics {
    /// Namespace prefix shared by every emitted metric
    pub const PREFIX: &str = "celery";

    // Counter suffixes
    pub const SENT: &str = "sent";
    pub const START: &str = "start";
    pub const DONE: &str = "done";
    pub const FAILURE: &str = "failure";

    // Timing suffixes
    pub const RUNTIME: &str = "runtime";
    pub const PUBLISH_RUNTIME: &str = "publish.runtime";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names_are_distinct() {
        let mut names = signals::ALL.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), signals::ALL.len());
    }
}

//! Task lifecycle signal payloads.
//!
//! Field optionality mirrors the loosely-populated payloads real task-queue
//! frameworks deliver: a worker may fire `task_prerun` without a resolvable
//! task object, and failure payloads sometimes omit the sender token entirely.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::signals;

/// Lifecycle notifications emitted around task publishing and execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum CelerySignal {
    /// A publisher is about to hand a task message to the broker.
    BeforeTaskPublish {
        /// Task type identifier (the registered task name).
        sender: String,
        /// Broker message headers, when the framework forwards them.
        #[serde(skip_serializing_if = "Option::is_none")]
        headers: Option<serde_json::Value>,
    },

    /// The broker accepted a task message.
    AfterTaskPublish {
        sender: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        headers: Option<serde_json::Value>,
    },

    /// A worker is about to execute a task invocation.
    TaskPrerun {
        /// Unique identifier of this invocation.
        task_id: Uuid,
        /// Short task name; absent when the worker could not resolve the task object.
        task_name: Option<String>,
    },

    /// A worker finished executing a task invocation.
    TaskPostrun {
        task_id: Uuid,
        task_name: Option<String>,
    },

    /// Task execution raised an error.
    ///
    /// `sender` is the framework's raw sender token for the failed task. Its
    /// rendering differs from the short names carried by `TaskPrerun` and
    /// `TaskPostrun`; the failure metric keys on this token as-is.
    TaskFailure {
        task_id: Uuid,
        sender: Option<String>,
        /// Stringified exception, when the framework captured one.
        #[serde(skip_serializing_if = "Option::is_none")]
        exception: Option<String>,
    },
}

impl CelerySignal {
    /// Wire-level signal name used for bus connections.
    pub fn name(&self) -> &'static str {
        match self {
            CelerySignal::BeforeTaskPublish { .. } => signals::BEFORE_TASK_PUBLISH,
            CelerySignal::AfterTaskPublish { .. } => signals::AFTER_TASK_PUBLISH,
            CelerySignal::TaskPrerun { .. } => signals::TASK_PRERUN,
            CelerySignal::TaskPostrun { .. } => signals::TASK_POSTRUN,
            CelerySignal::TaskFailure { .. } => signals::TASK_FAILURE,
        }
    }

    /// Publish-begin signal for a task type.
    pub fn before_publish(sender: impl Into<String>) -> Self {
        CelerySignal::BeforeTaskPublish {
            sender: sender.into(),
            headers: None,
        }
    }

    /// Broker-acknowledged signal for a task type.
    pub fn after_publish(sender: impl Into<String>) -> Self {
        CelerySignal::AfterTaskPublish {
            sender: sender.into(),
            headers: None,
        }
    }

    /// Execution-begin signal for a resolved task.
    pub fn prerun(task_id: Uuid, task_name: impl Into<String>) -> Self {
        CelerySignal::TaskPrerun {
            task_id,
            task_name: Some(task_name.into()),
        }
    }

    /// Execution-end signal for a resolved task.
    pub fn postrun(task_id: Uuid, task_name: impl Into<String>) -> Self {
        CelerySignal::TaskPostrun {
            task_id,
            task_name: Some(task_name.into()),
        }
    }

    /// Failure signal carrying the raw sender token.
    pub fn failure(task_id: Uuid, sender: impl Into<String>) -> Self {
        CelerySignal::TaskFailure {
            task_id,
            sender: Some(sender.into()),
            exception: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names_match_serialized_tags() {
        let task_id = Uuid::new_v4();
        let all = [
            CelerySignal::before_publish("email_task"),
            CelerySignal::after_publish("email_task"),
            CelerySignal::prerun(task_id, "resize_image"),
            CelerySignal::postrun(task_id, "resize_image"),
            CelerySignal::failure(task_id, "app.tasks.resize_image"),
        ];

        for signal in &all {
            let value = serde_json::to_value(signal).unwrap();
            assert_eq!(value["signal"], signal.name());
        }
    }

    #[test]
    fn sparse_payloads_deserialize() {
        let raw = serde_json::json!({
            "signal": "task_prerun",
            "task_id": Uuid::new_v4(),
            "task_name": null,
        });

        let signal: CelerySignal = serde_json::from_value(raw).unwrap();
        match signal {
            CelerySignal::TaskPrerun { task_name, .. } => assert!(task_name.is_none()),
            other => panic!("Unexpected signal: {other:?}"),
        }
    }
}

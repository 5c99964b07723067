use serde::{Deserialize, Serialize};

/// Execution state of a task inside one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Task is registered but not launched yet.
    Pending,
    /// Task is launched and its result has not been collected.
    Running,
    /// Task delivered a value.
    Succeeded,
    /// Task delivered an error.
    Failed,
    /// Deadline elapsed before the task delivered anything.
    Timeout,
    /// Run was cancelled from outside before the task delivered anything.
    Canceled,
}

impl TaskStatus {
    /// Returns `true` if the task is in a terminal state (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Timeout | TaskStatus::Canceled
        )
    }

    /// Returns `true` if the task is still active (pending or running).
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// Returns `true` if the task delivered a result (value or error).
    pub fn is_reported(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

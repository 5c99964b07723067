use serde::{Deserialize, Serialize};

use crate::{TaskId, TaskStatus};

/// Result delivered by a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TaskOutcome<V> {
    Succeeded { id: TaskId, value: V },
    Failed { id: TaskId, reason: String },
}

impl<V> TaskOutcome<V> {
    pub fn succeeded(id: TaskId, value: V) -> Self {
        TaskOutcome::Succeeded { id, value }
    }

    pub fn failed(id: TaskId, reason: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            id,
            reason: reason.into(),
        }
    }

    pub fn id(&self) -> TaskId {
        match self {
            TaskOutcome::Succeeded { id, .. } | TaskOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            TaskOutcome::Succeeded { value, .. } => Some(value),
            TaskOutcome::Failed { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TaskOutcome::Failed { reason, .. } => Some(reason),
            TaskOutcome::Succeeded { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Succeeded { .. } => TaskStatus::Succeeded,
            TaskOutcome::Failed { .. } => TaskStatus::Failed,
        }
    }
}

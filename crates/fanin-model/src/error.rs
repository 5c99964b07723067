use thiserror::Error;

use crate::TaskId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),
    #[error("invalid task spec {id}: {reason}")]
    InvalidSpec { id: TaskId, reason: String },
}

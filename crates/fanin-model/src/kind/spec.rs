use serde::{Deserialize, Serialize};

use crate::{TaskId, TaskKind};

/// Descriptor of one task in a collection run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: TaskId,
    pub kind: TaskKind,
}

impl TaskSpec {
    pub fn new(id: impl Into<TaskId>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

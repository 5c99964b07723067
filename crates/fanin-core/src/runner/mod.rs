use thiserror::Error;

use fanin_model::{TaskSpec, Value};

use crate::task::Task;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid task spec: {0}")]
    InvalidSpec(String),
    #[error("runner {runner} does not support kind {kind}")]
    Unsupported {
        runner: &'static str,
        kind: &'static str,
    },
}

/// Builds runnable tasks from [`TaskSpec`] descriptors.
pub trait Runner: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, spec: &TaskSpec) -> bool;

    fn build_task(&self, spec: &TaskSpec) -> Result<Task<Value>, RunnerError>;
}

use thiserror::Error;

use fanin_model::{ModelError, TaskId};

use crate::runner::RunnerError;

/// Errors raised before a run launches anything.
///
/// Once tasks are running every condition (failures, deadline, cancellation) resolves to a value
/// in the [`crate::CollectReport`] instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no runner supports task kind: {0}")]
    NoRunner(String),
    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] ModelError),
}

use std::{fmt, future::Future, pin::Pin};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use fanin_model::TaskId;

/// Error returned by a task's unit of work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkError {
    #[error("{reason}")]
    Fail { reason: String },
    #[error("cancelled")]
    Cancelled,
}

impl WorkError {
    pub fn fail(reason: impl Into<String>) -> Self {
        WorkError::Fail {
            reason: reason.into(),
        }
    }
}

/// Per-task launch context.
///
/// Handed to the work by value when the task starts, so every task owns its own id
/// and its own handle on the run-wide cancellation signal.
#[derive(Clone, Debug)]
pub struct TaskContext {
    pub id: TaskId,
    pub cancel: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(id: TaskId, cancel: CancellationToken) -> Self {
        Self { id, cancel }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the run is cancelled (deadline or external).
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

pub type WorkFuture<V> = Pin<Box<dyn Future<Output = Result<V, WorkError>> + Send + 'static>>;

type WorkFn<V> = Box<dyn FnOnce(TaskContext) -> WorkFuture<V> + Send + 'static>;

/// One unit of work producing a single `V`.
///
/// A task runs at most once: [`Task::start`] consumes it.
pub struct Task<V> {
    id: TaskId,
    work: WorkFn<V>,
}

impl<V> Task<V>
where
    V: Send + 'static,
{
    pub fn new<F, Fut>(id: impl Into<TaskId>, work: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, WorkError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            work: Box::new(move |ctx| Box::pin(work(ctx))),
        }
    }

    /// Task that reports `value` immediately.
    pub fn ready(id: impl Into<TaskId>, value: V) -> Self {
        Self::new(id, move |_ctx| async move { Ok(value) })
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn start(self, cancel: CancellationToken) -> WorkFuture<V> {
        (self.work)(TaskContext::new(self.id, cancel))
    }
}

impl<V> fmt::Debug for Task<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish_non_exhaustive()
    }
}

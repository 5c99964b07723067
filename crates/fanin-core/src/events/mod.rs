mod bus;
pub(crate) use bus::EventBus;

use std::fmt;

use async_trait::async_trait;
use fanin_model::TaskId;
use uuid::Uuid;

/// Identifier of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // run
    RunStarted,
    RunCompleted,
    DeadlineExceeded,
    RunCancelled,

    // task
    TaskStarting,
    TaskSucceeded,
    TaskFailed,
    TaskCanceled,
    DeliveryDropped,
}

/// Something that happened during a run.
///
/// Task events carry `task`; run events carry the counters.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub run: RunId,
    pub task: Option<TaskId>,
    pub reason: Option<String>,
    pub total: Option<usize>,
    pub collected: Option<usize>,
    pub outstanding: Option<usize>,
    pub elapsed_ms: Option<u64>,
}

impl Event {
    pub fn new(kind: EventKind, run: RunId) -> Self {
        Self {
            kind,
            run,
            task: None,
            reason: None,
            total: None,
            collected: None,
            outstanding: None,
            elapsed_ms: None,
        }
    }

    pub fn task(kind: EventKind, run: RunId, task: TaskId) -> Self {
        Self {
            task: Some(task),
            ..Self::new(kind, run)
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_counts(mut self, total: usize, collected: usize, outstanding: usize) -> Self {
        self.total = Some(total);
        self.collected = Some(collected);
        self.outstanding = Some(outstanding);
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = Some(elapsed_ms);
        self
    }
}

/// Receives run events.
///
/// Each subscriber gets its own bounded queue; when it is full the event is dropped for that
/// subscriber only and tasks never wait on a slow subscriber.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    fn name(&self) -> &'static str;

    fn queue_capacity(&self) -> usize {
        1024
    }
}

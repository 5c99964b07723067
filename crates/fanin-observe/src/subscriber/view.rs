use std::borrow::Borrow;

use fanin_core::{Event, EventKind};
use tracing::{debug, info, trace, warn};

pub trait View {
    fn as_task(&self) -> String;
    fn as_reason(&self) -> &str;
    fn as_run(&self) -> String;
    fn kind(&self) -> EventKind;
    fn total(&self) -> usize;
    fn collected(&self) -> usize;
    fn outstanding(&self) -> usize;
    fn elapsed_ms(&self) -> u64;
}

impl<T> View for T
where
    T: Borrow<Event>,
{
    #[inline]
    fn as_task(&self) -> String {
        self.borrow()
            .task
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn as_run(&self) -> String {
        self.borrow().run.to_string()
    }
    #[inline]
    fn kind(&self) -> EventKind {
        self.borrow().kind
    }
    #[inline]
    fn total(&self) -> usize {
        self.borrow().total.unwrap_or(0)
    }
    #[inline]
    fn collected(&self) -> usize {
        self.borrow().collected.unwrap_or(0)
    }
    #[inline]
    fn outstanding(&self) -> usize {
        self.borrow().outstanding.unwrap_or(0)
    }
    #[inline]
    fn elapsed_ms(&self) -> u64 {
        self.borrow().elapsed_ms.unwrap_or(0)
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // run
        EventKind::RunStarted => "run started (tasks launched)",
        EventKind::RunCompleted => "run finished",
        EventKind::DeadlineExceeded => "deadline exceeded; outstanding tasks cancelled",
        EventKind::RunCancelled => "run cancelled by parent",

        // task
        EventKind::TaskStarting => "task is starting",
        EventKind::TaskSucceeded => "task delivered a value",
        EventKind::TaskFailed => "task failed",
        EventKind::TaskCanceled => "task cancelled before completion",
        EventKind::DeliveryDropped => "result discarded (run already stopped)",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // run
        EventKind::RunStarted => debug!(run = e.as_run(), total = e.total(), "{msg}"),
        EventKind::RunCompleted => info!(
            run = e.as_run(),
            stop = e.as_reason(),
            total = e.total(),
            collected = e.collected(),
            outstanding = e.outstanding(),
            elapsed_ms = e.elapsed_ms(),
            "{msg}"
        ),
        EventKind::DeadlineExceeded => warn!(
            run = e.as_run(),
            collected = e.collected(),
            outstanding = e.outstanding(),
            elapsed_ms = e.elapsed_ms(),
            "{msg}"
        ),
        EventKind::RunCancelled => warn!(
            run = e.as_run(),
            collected = e.collected(),
            outstanding = e.outstanding(),
            "{msg}"
        ),

        // task
        EventKind::TaskStarting => trace!(task = e.as_task(), "{msg}"),
        EventKind::TaskSucceeded => debug!(task = e.as_task(), "{msg}"),
        EventKind::TaskFailed => {
            warn!(task = e.as_task(), reason = e.as_reason(), "{msg}")
        }
        EventKind::TaskCanceled => debug!(task = e.as_task(), "{msg}"),
        EventKind::DeliveryDropped => trace!(task = e.as_task(), "{msg}"),
    }
}

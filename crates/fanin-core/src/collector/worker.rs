use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, trace};

use fanin_model::TaskOutcome;

use crate::{
    events::{Event, EventBus, EventKind, RunId},
    task::{Task, WorkError},
};

/// Everything a launched task shares with its run.
pub(super) struct Shared<V> {
    pub run: RunId,
    pub cancel: CancellationToken,
    pub tracker: TaskTracker,
    pub results: mpsc::Sender<TaskOutcome<V>>,
    pub bus: EventBus,
    pub stop_grace: Duration,
    /// Deliver results of work that finished while the run was stopping.
    pub keep_late: bool,
}

/// Runs one task to completion and hands its result to the coordinator.
///
/// Both suspension points (the work and the hand-off) race the run's cancellation signal.
/// The work itself runs as a tracked task so a panic surfaces as a failure and an
/// abort on cancellation is observed by the completion barrier. On cancellation the work
/// gets `stop_grace` to return on its own before it is aborted.
///
/// With `keep_late`, work that is already done when cancellation is observed (or that
/// returns within `stop_grace`) still hands its result off. The result channel holds one
/// slot per task, so that hand-off never waits.
pub(super) async fn drive<V>(task: Task<V>, shared: Shared<V>)
where
    V: Send + 'static,
{
    let Shared {
        run,
        cancel,
        tracker,
        results,
        bus,
        stop_grace,
        keep_late,
    } = shared;
    let id = task.id();

    if cancel.is_cancelled() {
        trace!(target: "fanin.core.worker", %id, "cancelled before start");
        bus.emit(Event::task(EventKind::TaskCanceled, run, id).with_reason("cancelled before start"));
        return;
    }

    bus.emit(Event::task(EventKind::TaskStarting, run, id));
    let mut work = tracker.spawn(task.start(cancel.clone()));

    let joined = tokio::select! {
        biased;
        _ = cancel.cancelled() => match wind_down(&mut work, stop_grace, keep_late).await {
            Some(joined) => joined,
            None => {
                debug!(target: "fanin.core.worker", %id, "cancelled during work");
                bus.emit(Event::task(EventKind::TaskCanceled, run, id));
                return;
            }
        },
        joined = &mut work => joined,
    };

    let outcome = match joined {
        Ok(Ok(value)) => TaskOutcome::succeeded(id, value),
        Ok(Err(WorkError::Cancelled)) if cancel.is_cancelled() => {
            bus.emit(Event::task(EventKind::TaskCanceled, run, id));
            return;
        }
        // gave up on its own while the run is still live
        Ok(Err(WorkError::Cancelled)) => TaskOutcome::failed(id, "cancelled by task"),
        Ok(Err(WorkError::Fail { reason })) => TaskOutcome::failed(id, reason),
        Err(e) if e.is_panic() => TaskOutcome::failed(id, "task panicked"),
        Err(e) => TaskOutcome::failed(id, e.to_string()),
    };

    match &outcome {
        TaskOutcome::Succeeded { .. } => {
            bus.emit(Event::task(EventKind::TaskSucceeded, run, id));
        }
        TaskOutcome::Failed { reason, .. } => {
            bus.emit(Event::task(EventKind::TaskFailed, run, id).with_reason(reason.clone()));
        }
    }

    if keep_late {
        if results.try_send(outcome).is_err() {
            trace!(target: "fanin.core.worker", %id, "result stream closed; result dropped");
            bus.emit(Event::task(EventKind::DeliveryDropped, run, id));
        }
        return;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            trace!(target: "fanin.core.worker", %id, "run stopped before hand-off; result dropped");
            bus.emit(Event::task(EventKind::DeliveryDropped, run, id));
        }
        sent = results.send(outcome) => {
            if sent.is_err() {
                trace!(target: "fanin.core.worker", %id, "result stream closed; result dropped");
                bus.emit(Event::task(EventKind::DeliveryDropped, run, id));
            }
        }
    }
}

/// Settles work whose run was cancelled.
///
/// Returns the join result when it is to be reported; otherwise the work has been left to
/// finish within `stop_grace` or aborted.
async fn wind_down<V>(
    work: &mut JoinHandle<Result<V, WorkError>>,
    stop_grace: Duration,
    keep_late: bool,
) -> Option<Result<Result<V, WorkError>, JoinError>> {
    if keep_late && work.is_finished() {
        return Some(work.await);
    }
    if stop_grace.is_zero() {
        work.abort();
        return None;
    }
    match tokio::time::timeout(stop_grace, &mut *work).await {
        Ok(joined) if keep_late => Some(joined),
        Ok(_) => None,
        Err(_) => {
            work.abort();
            None
        }
    }
}

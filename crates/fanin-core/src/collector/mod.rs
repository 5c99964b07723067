//! Bounded worker collector.
//!
//! Runs a fixed set of tasks concurrently and gathers whatever they deliver before a deadline.
//!
//! ## Guarantees
//! - every task runs at most once and is counted at most once;
//! - the coordinator stops waiting at the deadline (plus the drain grace when
//!   [`DrainPolicy::Drain`] is selected), or as soon as the last result arrives;
//! - every launched task terminates: the deadline fires a broadcast cancellation that both the
//!   work and the result hand-off race against, and a completion barrier tracks them until
//!   they are gone.
//!
//! ## Shared state
//! Tasks share exactly two things with the coordinator: the bounded result channel (capacity N)
//! and the completion barrier. A watcher task holds the last result sender and releases it only
//! after the barrier drains, so the result stream closes strictly after every task has exited.
mod completion;
mod config;
mod ledger;
mod report;
mod worker;

pub use completion::Completion;
pub use config::CollectConfig;
pub use report::{CollectReport, StopReason};

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::Instant};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, instrument, warn};

use fanin_model::{CollectPlan, DrainPolicy, TaskOutcome, TaskSpec, TaskStatus, Value};

use crate::{
    error::CoreError,
    events::{Event, EventBus, EventKind, RunId, Subscribe},
    router::RunnerRouter,
    task::Task,
};

use ledger::Ledger;
use worker::Shared;

/// Entry point for collection runs.
///
/// Holds what is shared between runs (runners, subscribers, an optional parent cancellation
/// token). Run state itself is created per call and discarded when the call returns.
#[derive(Default, Clone)]
pub struct Collector {
    router: RunnerRouter,
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: Option<CancellationToken>,
}

impl Collector {
    pub fn new(router: RunnerRouter) -> Self {
        Self {
            router,
            subscribers: Vec::new(),
            parent: None,
        }
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Derives every run's cancellation signal from `parent`.
    ///
    /// Cancelling `parent` stops in-flight runs with [`StopReason::Cancelled`].
    /// Runs never cancel `parent` itself.
    pub fn with_cancel(mut self, parent: &CancellationToken) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn router(&self) -> &RunnerRouter {
        &self.router
    }

    /// Builds runnable tasks from specs through the registered runners.
    pub fn build_tasks(&self, specs: &[TaskSpec]) -> Result<Vec<Task<Value>>, CoreError> {
        specs.iter().map(|spec| self.router.build(spec)).collect()
    }

    /// Validates the plan, builds its tasks and runs them under the plan's deadline.
    pub async fn collect_plan(&self, plan: &CollectPlan) -> Result<CollectReport<Value>, CoreError> {
        self.collect_plan_tracked(plan)
            .await
            .map(|(report, _)| report)
    }

    /// Same as [`Collector::collect_plan`], also returning the run's completion barrier.
    pub async fn collect_plan_tracked(
        &self,
        plan: &CollectPlan,
    ) -> Result<(CollectReport<Value>, Completion), CoreError> {
        plan.validate()?;
        let tasks = self.build_tasks(&plan.tasks)?;
        self.collect_tracked(tasks, &CollectConfig::from(plan)).await
    }

    /// Runs `tasks` concurrently and returns what they delivered before the deadline.
    ///
    /// Fails only when task ids are not unique; nothing is launched in that case.
    /// Dropping the returned future before it completes cancels every launched task.
    pub async fn collect<V>(
        &self,
        tasks: Vec<Task<V>>,
        cfg: &CollectConfig,
    ) -> Result<CollectReport<V>, CoreError>
    where
        V: Send + 'static,
    {
        self.collect_tracked(tasks, cfg)
            .await
            .map(|(report, _)| report)
    }

    /// Same as [`Collector::collect`], also returning the run's completion barrier.
    pub async fn collect_tracked<V>(
        &self,
        tasks: Vec<Task<V>>,
        cfg: &CollectConfig,
    ) -> Result<(CollectReport<V>, Completion), CoreError>
    where
        V: Send + 'static,
    {
        let ledger = Ledger::new(tasks.iter().map(Task::id))?;
        Ok(self.run(RunId::new(), tasks, ledger, cfg).await)
    }

    #[instrument(
        level = "debug",
        target = "fanin.core.collector",
        skip_all,
        fields(%run, tasks = ledger.total(), deadline_ms = millis(cfg.deadline))
    )]
    async fn run<V>(
        &self,
        run: RunId,
        tasks: Vec<Task<V>>,
        mut ledger: Ledger,
        cfg: &CollectConfig,
    ) -> (CollectReport<V>, Completion)
    where
        V: Send + 'static,
    {
        let started = Instant::now();
        let total = ledger.total();

        let cancel = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        // Fires if the caller drops this future before the run finishes.
        let _stop_on_drop = cancel.clone().drop_guard();
        let deadline = tokio::time::sleep(cfg.deadline);
        tokio::pin!(deadline);
        if cfg.deadline.is_zero() {
            cancel.cancel();
        }

        let subscribers = TaskTracker::new();
        let bus = EventBus::start(&self.subscribers, &subscribers);
        subscribers.close();
        bus.emit(Event::new(EventKind::RunStarted, run).with_counts(total, 0, total));

        let tracker = TaskTracker::new();
        let (tx, mut rx) = mpsc::channel::<TaskOutcome<V>>(total.max(1));

        for task in tasks {
            ledger.mark_running(task.id());
            let shared = Shared {
                run,
                cancel: cancel.clone(),
                tracker: tracker.clone(),
                results: tx.clone(),
                bus: bus.clone(),
                stop_grace: cfg.stop_grace,
                keep_late: cfg.drain == DrainPolicy::Drain,
            };
            tracker.spawn(worker::drive(task, shared));
        }
        tracker.close();

        // The stream closes once this sender is released, after every tracked task is gone.
        let barrier = tracker.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            drop(tx);
        });

        let mut outcomes = Vec::with_capacity(total);
        let stop = if cfg.deadline.is_zero() && !ledger.is_complete() {
            StopReason::DeadlineExceeded
        } else {
            loop {
                if ledger.is_complete() {
                    break StopReason::Completed;
                }
                tokio::select! {
                    biased;
                    _ = &mut deadline => break StopReason::DeadlineExceeded,
                    _ = cancel.cancelled() => break StopReason::Cancelled,
                    received = rx.recv() => match received {
                        Some(outcome) => accept(&mut ledger, &mut outcomes, outcome),
                        None => {
                            warn!(target: "fanin.core.collector", "result stream closed before every task reported");
                            break StopReason::Cancelled;
                        }
                    },
                }
            }
        };
        cancel.cancel();

        if stop != StopReason::Completed && cfg.drain == DrainPolicy::Drain {
            let drained = drain(&mut rx, cfg.drain_grace, &mut ledger, &mut outcomes).await;
            debug!(target: "fanin.core.collector", drained, "drained buffered results");
        }

        let outstanding = ledger.expire(match stop {
            StopReason::Cancelled => TaskStatus::Canceled,
            _ => TaskStatus::Timeout,
        });
        let collected = ledger.reported();
        let elapsed_ms = millis(started.elapsed());

        match stop {
            StopReason::Completed => {}
            StopReason::DeadlineExceeded => bus.emit(
                Event::new(EventKind::DeadlineExceeded, run)
                    .with_counts(total, collected, outstanding.len())
                    .with_elapsed_ms(elapsed_ms),
            ),
            StopReason::Cancelled => bus.emit(
                Event::new(EventKind::RunCancelled, run)
                    .with_counts(total, collected, outstanding.len())
                    .with_elapsed_ms(elapsed_ms),
            ),
        }
        bus.emit(
            Event::new(EventKind::RunCompleted, run)
                .with_reason(stop.as_str())
                .with_counts(total, collected, outstanding.len())
                .with_elapsed_ms(elapsed_ms),
        );
        info!(
            target: "fanin.core.collector",
            total,
            collected,
            outstanding = outstanding.len(),
            elapsed_ms,
            stop = stop.as_str(),
            "run finished"
        );

        let report = CollectReport {
            total,
            outcomes,
            outstanding,
            stop,
            elapsed_ms,
        };
        (report, Completion::new(tracker, subscribers))
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Records a delivered outcome unless its task was already counted.
fn accept<V>(ledger: &mut Ledger, outcomes: &mut Vec<TaskOutcome<V>>, outcome: TaskOutcome<V>) {
    let id = outcome.id();
    if ledger.record(id, outcome.status()) {
        outcomes.push(outcome);
    } else {
        warn!(target: "fanin.core.collector", %id, "ignoring result for unknown or already reported task");
    }
}

/// Reads results until the stream closes or `grace` elapses; returns how many were accepted.
async fn drain<V>(
    rx: &mut mpsc::Receiver<TaskOutcome<V>>,
    grace: Duration,
    ledger: &mut Ledger,
    outcomes: &mut Vec<TaskOutcome<V>>,
) -> usize {
    let before = outcomes.len();
    let grace = tokio::time::sleep(grace);
    tokio::pin!(grace);

    loop {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some(outcome) => accept(ledger, outcomes, outcome),
                None => break,
            },
            _ = &mut grace => {
                warn!(target: "fanin.core.collector", "drain grace elapsed before the result stream closed");
                break;
            }
        }
    }
    outcomes.len() - before
}

/// Runs `tasks` without subscribers or runners.
pub async fn collect<V>(
    tasks: Vec<Task<V>>,
    cfg: &CollectConfig,
) -> Result<CollectReport<V>, CoreError>
where
    V: Send + 'static,
{
    Collector::default().collect(tasks, cfg).await
}

/// Runs `tasks` without subscribers or runners, also returning the completion barrier.
pub async fn collect_tracked<V>(
    tasks: Vec<Task<V>>,
    cfg: &CollectConfig,
) -> Result<(CollectReport<V>, Completion), CoreError>
where
    V: Send + 'static,
{
    Collector::default().collect_tracked(tasks, cfg).await
}

#[cfg(test)]
mod tests;

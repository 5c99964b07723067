use std::iter::Sum;

use serde::Serialize;

use fanin_model::{TaskId, TaskOutcome};

/// Why the coordinator stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// Every task delivered a result.
    Completed,
    /// The deadline elapsed first.
    DeadlineExceeded,
    /// The parent cancellation token fired first.
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::DeadlineExceeded => "deadline_exceeded",
            StopReason::Cancelled => "cancelled",
        }
    }
}

/// Aggregate of one run.
///
/// `outcomes` holds the delivered results in arrival order, at most one per task.
/// `outstanding` lists the tasks that delivered nothing before the run stopped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectReport<V> {
    pub total: usize,
    pub outcomes: Vec<TaskOutcome<V>>,
    pub outstanding: Vec<TaskId>,
    pub stop: StopReason,
    pub elapsed_ms: u64,
}

impl<V> CollectReport<V> {
    /// Number of delivered results (values and errors).
    pub fn collected(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    /// `true` when the deadline cut the run short.
    pub fn timed_out(&self) -> bool {
        self.stop == StopReason::DeadlineExceeded
    }

    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Completed
    }

    /// Ids of the tasks that delivered, in arrival order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.outcomes.iter().map(TaskOutcome::id)
    }

    /// Successful values, in arrival order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.outcomes.iter().filter_map(TaskOutcome::value)
    }

    pub fn fold<A, F>(&self, init: A, f: F) -> A
    where
        F: FnMut(A, &V) -> A,
    {
        self.values().fold(init, f)
    }

    /// Sum of the successful values.
    pub fn sum<S>(&self) -> S
    where
        S: for<'a> Sum<&'a V>,
    {
        self.values().sum()
    }
}

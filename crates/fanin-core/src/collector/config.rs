use std::time::Duration;

use fanin_model::{CollectPlan, DrainPolicy};

/// Deadline rules for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectConfig {
    /// Overall time budget; the coordinator never waits for results beyond it.
    pub deadline: Duration,
    /// Handling of results still in flight when the run stops early.
    pub drain: DrainPolicy,
    /// Upper bound on the time spent draining after an early stop.
    pub drain_grace: Duration,
    /// Time a cancelled task may keep running to clean up before it is aborted.
    ///
    /// Zero aborts immediately. The coordinator never waits for it; only the completion
    /// barrier does.
    pub stop_grace: Duration,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(30),
            drain: DrainPolicy::Discard,
            drain_grace: Duration::from_millis(100),
            stop_grace: Duration::ZERO,
        }
    }
}

impl CollectConfig {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            ..Default::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_drain(mut self, drain: DrainPolicy) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }
}

impl From<&CollectPlan> for CollectConfig {
    fn from(plan: &CollectPlan) -> Self {
        Self {
            deadline: Duration::from_millis(plan.deadline_ms),
            drain: plan.drain,
            drain_grace: Duration::from_millis(plan.drain_grace_ms),
            stop_grace: Duration::from_millis(plan.stop_grace_ms),
        }
    }
}

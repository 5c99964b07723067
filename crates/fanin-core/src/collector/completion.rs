use tokio_util::task::TaskTracker;

/// Handle on a run's completion barrier.
///
/// Tracks every task launched by the run, including the work each task spawns, and the
/// subscriber workers of the run's event bus. Reaches "finished" only once all tasks have
/// exited and every event they emitted has been handed to the subscribers.
#[derive(Clone, Debug)]
pub struct Completion {
    tasks: TaskTracker,
    events: TaskTracker,
}

impl Completion {
    pub(crate) fn new(tasks: TaskTracker, events: TaskTracker) -> Self {
        Self { tasks, events }
    }

    /// Waits until every task of the run has exited and its events were delivered.
    pub async fn wait(&self) {
        self.tasks.wait().await;
        self.events.wait().await;
    }

    /// Number of run tasks still alive.
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.is_closed()
            && self.tasks.is_empty()
            && self.events.is_closed()
            && self.events.is_empty()
    }
}

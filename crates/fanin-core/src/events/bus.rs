use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::events::{Event, Subscribe};

/// Fan-out of run events to subscribers.
///
/// One queue and one worker per subscriber. Workers exit once every clone of the bus
/// (the coordinator and each task) has been dropped, after delivering what was queued.
/// They run on `tracker`, so waiting on it means every emitted event was handled.
#[derive(Clone, Default)]
pub(crate) struct EventBus {
    queues: Arc<Vec<Queue>>,
}

struct Queue {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

impl EventBus {
    pub(crate) fn start(subscribers: &[Arc<dyn Subscribe>], tracker: &TaskTracker) -> Self {
        let queues = subscribers
            .iter()
            .map(|sub| {
                let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
                let sub = Arc::clone(sub);
                let name = sub.name();

                tracker.spawn(async move {
                    while let Some(event) = rx.recv().await {
                        sub.on_event(&event).await;
                    }
                });
                Queue { name, tx }
            })
            .collect();

        Self {
            queues: Arc::new(queues),
        }
    }

    pub(crate) fn emit(&self, event: Event) {
        if self.queues.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for queue in self.queues.iter() {
            match queue.tx.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    warn!(
                        target: "fanin.core.events",
                        subscriber = queue.name,
                        kind = ?dropped.kind,
                        "subscriber queue full; event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }
}

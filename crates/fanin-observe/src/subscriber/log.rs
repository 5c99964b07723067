use async_trait::async_trait;
use fanin_core::{Event, Subscribe};

use crate::subscriber::view::log_event;

/// Writes every run event to `tracing`.
#[derive(Debug, Default)]
pub struct LogSubscriber;

impl LogSubscriber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogSubscriber {
    async fn on_event(&self, event: &Event) {
        log_event(event);
    }
    fn name(&self) -> &'static str {
        "log"
    }
    fn queue_capacity(&self) -> usize {
        2048
    }
}

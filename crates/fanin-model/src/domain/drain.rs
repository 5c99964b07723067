use serde::{Deserialize, Serialize};

/// What to do with results that are still in flight once the run stops early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrainPolicy {
    /// Stop reading at the deadline; anything buffered afterwards is dropped.
    #[default]
    Discard,
    /// Keep reading the result stream until it is closed (every task has exited),
    /// bounded by the drain grace period.
    Drain,
}

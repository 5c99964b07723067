pub mod error;
pub use error::CoreError;

pub mod task;
pub use task::{Task, TaskContext, WorkError};

pub mod runner;
pub use runner::{Runner, RunnerError};

pub mod router;
pub use router::RunnerRouter;

pub mod events;
pub use events::{Event, EventKind, RunId, Subscribe};

pub mod collector;
pub use collector::{
    CollectConfig, CollectReport, Collector, Completion, StopReason, collect, collect_tracked,
};

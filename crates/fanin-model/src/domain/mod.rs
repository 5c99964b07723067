mod task_id;
pub use task_id::TaskId;

mod task_status;
pub use task_status::TaskStatus;

mod task_outcome;
pub use task_outcome::TaskOutcome;

mod drain;
pub use drain::DrainPolicy;

/// Value produced by tasks built from a [`crate::TaskSpec`].
///
/// Simulated tasks report the configured number, process tasks report their exit code.
pub type Value = i64;

/// Duration value in milliseconds.
pub type DurationMs = u64;

//! Simulated work: a fixed delay followed by a configured value or failure.
use std::time::Duration;

use fanin_core::{Runner, RunnerError, Task, TaskContext, WorkError};
use fanin_model::{TaskKind, TaskSpec, Value};
use tracing::trace;

/// Runner for [`TaskKind::Sleep`].
pub struct SleepRunner {
    name: &'static str,
}

impl SleepRunner {
    pub fn new() -> Self {
        Self { name: "sleep" }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Default for SleepRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for SleepRunner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, spec: &TaskSpec) -> bool {
        matches!(spec.kind, TaskKind::Sleep { .. })
    }

    fn build_task(&self, spec: &TaskSpec) -> Result<Task<Value>, RunnerError> {
        let TaskKind::Sleep {
            duration_ms,
            value,
            fail,
        } = &spec.kind
        else {
            return Err(RunnerError::Unsupported {
                runner: self.name,
                kind: spec.kind.kind(),
            });
        };

        let duration = Duration::from_millis(*duration_ms);
        let value = *value;
        let fail = fail.clone();

        Ok(Task::new(spec.id, move |ctx: TaskContext| async move {
            trace!(target: "fanin.exec.sleep", id = %ctx.id, ?duration, "simulated work started");
            tokio::select! {
                _ = ctx.cancelled() => Err(WorkError::Cancelled),
                _ = tokio::time::sleep(duration) => match fail {
                    Some(reason) => Err(WorkError::fail(reason)),
                    None => Ok(value),
                },
            }
        }))
    }
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{DrainPolicy, DurationMs, ModelError, TaskKind, TaskSpec};

const DEFAULT_DEADLINE_MS: DurationMs = 30_000;
const DEFAULT_DRAIN_GRACE_MS: DurationMs = 100;

/// Full description of a collection run: the tasks plus the deadline rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectPlan {
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: DurationMs,
    #[serde(default)]
    pub drain: DrainPolicy,
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: DurationMs,
    /// Time cancelled tasks get to wind down before they are aborted.
    #[serde(default)]
    pub stop_grace_ms: DurationMs,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

fn default_deadline_ms() -> DurationMs {
    DEFAULT_DEADLINE_MS
}

fn default_drain_grace_ms() -> DurationMs {
    DEFAULT_DRAIN_GRACE_MS
}

impl Default for CollectPlan {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_DEADLINE_MS,
            drain: DrainPolicy::default(),
            drain_grace_ms: DEFAULT_DRAIN_GRACE_MS,
            stop_grace_ms: 0,
            tasks: Vec::new(),
        }
    }
}

impl CollectPlan {
    pub fn new(deadline_ms: DurationMs) -> Self {
        Self {
            deadline_ms,
            ..Default::default()
        }
    }

    pub fn with_drain(mut self, drain: DrainPolicy) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_stop_grace_ms(mut self, stop_grace_ms: DurationMs) -> Self {
        self.stop_grace_ms = stop_grace_ms;
        self
    }

    pub fn with_task(mut self, spec: TaskSpec) -> Self {
        self.tasks.push(spec);
        self
    }

    /// Checks that task ids are unique and that every process task names a program.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for spec in &self.tasks {
            if !seen.insert(spec.id) {
                return Err(ModelError::DuplicateTask(spec.id));
            }
            match &spec.kind {
                TaskKind::Exec { command, .. } if command.trim().is_empty() => {
                    return Err(ModelError::InvalidSpec {
                        id: spec.id,
                        reason: "command is empty".into(),
                    });
                }
                TaskKind::Shell { script, .. } if script.trim().is_empty() => {
                    return Err(ModelError::InvalidSpec {
                        id: spec.id,
                        reason: "script is empty".into(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

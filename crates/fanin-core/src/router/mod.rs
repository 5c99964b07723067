use std::sync::Arc;

use fanin_model::{TaskSpec, Value};
use tracing::{instrument, trace};

use crate::{error::CoreError, runner::Runner, task::Task};

#[derive(Default, Clone)]
pub struct RunnerRouter {
    runners: Vec<Arc<dyn Runner>>,
}

impl RunnerRouter {
    #[inline]
    pub fn new() -> Self {
        Self {
            runners: Vec::new(),
        }
    }

    #[inline]
    pub fn register(&mut self, runner: Arc<dyn Runner>) {
        self.runners.push(runner);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.runners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// First registered runner that supports the spec.
    pub fn pick(&self, spec: &TaskSpec) -> Option<&Arc<dyn Runner>> {
        self.runners.iter().find(|r| r.supports(spec))
    }

    #[instrument(level = "trace", skip(self, spec), fields(id = %spec.id, kind = spec.kind.kind()))]
    pub fn build(&self, spec: &TaskSpec) -> Result<Task<Value>, CoreError> {
        let r = self
            .pick(spec)
            .ok_or_else(|| CoreError::NoRunner(spec.kind.kind().to_string()))?;

        let task = r.build_task(spec)?;
        trace!(runner = r.name(), "runner built task successfully");
        Ok(task)
    }
}

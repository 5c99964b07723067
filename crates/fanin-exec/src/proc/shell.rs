use std::time::Duration;

use tokio::process::Command;

use fanin_core::{Runner, RunnerError, Task, TaskContext};
use fanin_model::{TaskKind, TaskSpec, Value};

use super::{DEFAULT_KILL_GRACE, run_child};

cfg_if::cfg_if! {
    if #[cfg(target_family = "windows")] {
        fn shell_command(script: &str) -> Command {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
            cmd
        }
    } else {
        fn shell_command(script: &str) -> Command {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
            cmd
        }
    }
}

/// ShellRunner: runs a script through the platform shell (`sh -c` / `cmd /C`).
pub struct ShellRunner {
    name: &'static str,
    kill_grace: Duration,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            name: "shell",
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for ShellRunner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, spec: &TaskSpec) -> bool {
        matches!(spec.kind, TaskKind::Shell { .. })
    }

    fn build_task(&self, spec: &TaskSpec) -> Result<Task<Value>, RunnerError> {
        let TaskKind::Shell {
            script,
            env,
            cwd,
            fail_on_non_zero,
        } = &spec.kind
        else {
            return Err(RunnerError::Unsupported {
                runner: self.name,
                kind: spec.kind.kind(),
            });
        };
        if script.trim().is_empty() {
            return Err(RunnerError::InvalidSpec("empty shell script".into()));
        }

        let mut cmd = shell_command(script);
        cmd.envs(env.iter());
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let fail_on_non_zero = *fail_on_non_zero;
        let grace = self.kill_grace;

        Ok(Task::new(spec.id, move |ctx: TaskContext| async move {
            run_child(cmd, ctx, fail_on_non_zero, grace)
                .await
                .map_err(Into::into)
        }))
    }
}

use std::{process::Stdio, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::{debug, trace};

use fanin_core::{Runner, RunnerError, Task, TaskContext};
use fanin_model::{TaskKind, TaskSpec, Value};

use crate::{
    error::ExecError,
    util::{cmd_program, kill_graceful},
};

const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Runner for [`TaskKind::Exec`]: one host process per task, exit code as the value.
pub struct ProcRunner {
    name: &'static str,
    kill_grace: Duration,
}

impl ProcRunner {
    pub fn new() -> Self {
        Self {
            name: "proc",
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Time a cancelled process gets between SIGTERM and SIGKILL.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

impl Default for ProcRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for ProcRunner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, spec: &TaskSpec) -> bool {
        matches!(spec.kind, TaskKind::Exec { .. })
    }

    fn build_task(&self, spec: &TaskSpec) -> Result<Task<Value>, RunnerError> {
        let TaskKind::Exec {
            command,
            args,
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
        if command.trim().is_empty() {
            return Err(RunnerError::InvalidSpec("program is empty".into()));
        }

        let cmd = cmd_program(command, args, env, cwd.as_deref());
        let fail_on_non_zero = *fail_on_non_zero;
        let grace = self.kill_grace;

        Ok(Task::new(spec.id, move |ctx: TaskContext| async move {
            run_child(cmd, ctx, fail_on_non_zero, grace)
                .await
                .map_err(Into::into)
        }))
    }
}

/// Spawns `cmd` and waits for it, racing the run's cancellation.
///
/// Stdout lines are forwarded to `trace` logs. A cancelled child gets SIGTERM, then SIGKILL
/// after `grace`; if the task itself is dropped the child is killed on drop.
pub(crate) async fn run_child(
    mut cmd: Command,
    ctx: TaskContext,
    fail_on_non_zero: bool,
    grace: Duration,
) -> Result<Value, ExecError> {
    cmd.kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    trace!(target: "fanin.exec.proc", id = %ctx.id, ?cmd, "spawn");
    let mut child = cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;

    let mut out_lines = child.stdout.take().map(|out| BufReader::new(out).lines());
    let status = loop {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!(target: "fanin.exec.proc", id = %ctx.id, "cancelled; killing child");
                let _ = kill_graceful(&mut child, grace).await;
                return Err(ExecError::Cancelled);
            }
            line = next_line(&mut out_lines), if out_lines.is_some() => match line {
                Some(line) => trace!(target: "fanin.exec.proc.out", id = %ctx.id, %line),
                None => out_lines = None,
            },
            status = child.wait() => break status?,
        }
    };

    match status.code() {
        Some(0) => {
            debug!(target: "fanin.exec.proc", id = %ctx.id, "exit success");
            Ok(0)
        }
        Some(code) if fail_on_non_zero => {
            debug!(target: "fanin.exec.proc", id = %ctx.id, code, "exit non-zero");
            Err(ExecError::NonZeroExit { code })
        }
        Some(code) => Ok(Value::from(code)),
        None => Err(ExecError::KilledBySignal),
    }
}

async fn next_line<R>(lines: &mut Option<tokio::io::Lines<R>>) -> Option<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}

#[cfg(feature = "shell")]
pub mod shell;

use std::{collections::BTreeMap, path::Path, time::Duration};

use tokio::process::{Child, Command};
use tracing::debug;

pub fn cmd_program(
    program: &str,
    args: &[String],
    env: &BTreeMap<String, String>,
    cwd: Option<&Path>,
) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd.envs(env.iter());
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    cmd
}

/// Asks the child to terminate, then kills it if it is still alive after `grace`.
#[cfg(target_family = "unix")]
pub async fn kill_graceful(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if let Some(id) = child.id() {
        // SAFETY: plain syscall on a pid we own; failure only means the child is already gone.
        let _ = unsafe { libc::kill(id as libc::pid_t, libc::SIGTERM) };
        if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
            debug!(target: "fanin.exec.proc", ?status, "child exited after SIGTERM");
            return Ok(());
        }
    }
    child.kill().await
}

#[cfg(not(target_family = "unix"))]
pub async fn kill_graceful(child: &mut Child, _grace: Duration) -> std::io::Result<()> {
    child.kill().await
}

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{DurationMs, Value};

/// How a task performs its unit of work.
///
/// Each variant represents a different execution backend together with the parameters it needs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskKind {
    /// Simulated work: wait for a fixed duration, then report a value (or fail).
    #[serde(rename_all = "camelCase")]
    Sleep {
        /// How long the work takes.
        duration_ms: DurationMs,
        /// Value reported on success.
        #[serde(default)]
        value: Value,
        /// When set, the task fails with this reason instead of reporting `value`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fail: Option<String>,
    },
    /// Execute a native process on the host; the exit code is the reported value.
    #[serde(rename_all = "camelCase")]
    Exec {
        /// Command to execute (e.g., `"ls"`, `"/usr/bin/python"`).
        command: String,
        /// Command-line arguments.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        /// Environment variables for the process.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
        /// Working directory.
        ///
        /// If `None`, the process inherits the working directory of the parent process.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<PathBuf>,
        /// Whether to treat non-zero exit codes as task failure.
        #[serde(default = "default_fail_on_non_zero")]
        fail_on_non_zero: bool,
    },
    /// Run a script through the platform shell (`sh -c` / `cmd /C`).
    #[serde(rename_all = "camelCase")]
    Shell {
        script: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<PathBuf>,
        #[serde(default = "default_fail_on_non_zero")]
        fail_on_non_zero: bool,
    },
}

fn default_fail_on_non_zero() -> bool {
    true
}

impl TaskKind {
    /// Simulated task that reports `value` after `duration_ms`.
    pub fn sleep(duration_ms: DurationMs, value: Value) -> Self {
        TaskKind::Sleep {
            duration_ms,
            value,
            fail: None,
        }
    }

    /// Simulated task that fails with `reason` after `duration_ms`.
    pub fn failing(duration_ms: DurationMs, reason: impl Into<String>) -> Self {
        TaskKind::Sleep {
            duration_ms,
            value: 0,
            fail: Some(reason.into()),
        }
    }

    /// Host process with default options.
    pub fn exec<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TaskKind::Exec {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            cwd: None,
            fail_on_non_zero: true,
        }
    }

    /// Returns a short symbolic identifier for the backend.
    ///
    /// Used for logging, metrics and routing:
    /// - `"sleep"`
    /// - `"exec"`
    /// - `"shell"`
    pub fn kind(&self) -> &'static str {
        match self {
            TaskKind::Sleep { .. } => "sleep",
            TaskKind::Exec { .. } => "exec",
            TaskKind::Shell { .. } => "shell",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(TaskKind::sleep(10, 1).kind(), "sleep");
        assert_eq!(TaskKind::exec("true", Vec::<String>::new()).kind(), "exec");
    }

    #[test]
    fn sleep_defaults_from_json() {
        let kind: TaskKind =
            serde_json::from_str(r#"{"type":"sleep","durationMs":250}"#).unwrap();
        assert_eq!(kind, TaskKind::sleep(250, 0));
    }

    #[test]
    fn exec_fails_on_non_zero_by_default() {
        let kind: TaskKind =
            serde_json::from_str(r#"{"type":"exec","command":"ls","args":["-l"]}"#).unwrap();
        match kind {
            TaskKind::Exec {
                command,
                args,
                fail_on_non_zero,
                ..
            } => {
                assert_eq!(command, "ls");
                assert_eq!(args, vec!["-l".to_string()]);
                assert!(fail_on_non_zero);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}

use fanin_core::WorkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("non-zero exit code: {code}")]
    NonZeroExit { code: i32 },
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("killed by signal")]
    KilledBySignal,
    #[error("io error: {0}")]
    Io(String),
    #[error("cancelled")]
    Cancelled,
}

pub type ExecResult<T> = Result<T, ExecError>;

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

impl From<ExecError> for WorkError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Cancelled => WorkError::Cancelled,
            other => WorkError::fail(other.to_string()),
        }
    }
}

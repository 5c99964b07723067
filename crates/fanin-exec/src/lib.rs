mod error;
pub use error::{ExecError, ExecResult};

#[cfg(feature = "proc")]
mod util;

pub mod sleep;
pub use sleep::SleepRunner;

#[cfg(feature = "proc")]
pub mod proc;
#[cfg(feature = "proc")]
pub use proc::ProcRunner;
#[cfg(feature = "shell")]
pub use proc::shell::ShellRunner;

use std::sync::Arc;

use fanin_core::RunnerRouter;
use tracing::debug;

/// Registers every runner enabled by crate features.
pub fn register_default_runners(router: &mut RunnerRouter) {
    router.register(Arc::new(SleepRunner::new()));
    #[cfg(feature = "proc")]
    router.register(Arc::new(ProcRunner::new()));
    #[cfg(feature = "shell")]
    router.register(Arc::new(ShellRunner::new()));
    debug!(target: "fanin.exec", runners = router.len(), "default runners registered");
}

pub mod prelude {
    pub use crate::SleepRunner;
    pub use crate::error::{ExecError, ExecResult};
    #[cfg(feature = "proc")]
    pub use crate::ProcRunner;
    #[cfg(feature = "shell")]
    pub use crate::ShellRunner;
    pub use crate::register_default_runners;
}

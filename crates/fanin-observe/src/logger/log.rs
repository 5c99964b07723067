use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Registry, fmt,
    fmt::time::OffsetTime,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type Filtered = Layered<EnvFilter, Registry>;

/// Builds the subscriber stack for `cfg.format` and installs it globally.
pub(super) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(&cfg.level)
        .map_err(|_| LoggerError::InvalidLogLevel(cfg.level.clone()))?;
    let base = tracing_subscriber::registry().with(filter);

    let installed = match cfg.format {
        LoggerFormat::Text => base
            .with(
                fmt::layer()
                    .with_ansi(cfg.use_color)
                    .with_target(cfg.with_targets)
                    .with_timer(local_timer()),
            )
            .try_init(),
        LoggerFormat::Json => base
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(cfg.with_targets)
                    .with_current_span(true)
                    .with_timer(local_timer()),
            )
            .try_init(),
        LoggerFormat::Journald => return journald(base),
    };
    installed.map_err(classify)
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

// Both the tracing dispatcher and the `log` bridge report a second install with "already".
fn classify(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("already") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald(base: Filtered) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("fanin".to_string());
    base.with(layer).try_init().map_err(classify)
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald(_base: Filtered) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

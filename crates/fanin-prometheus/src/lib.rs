//! Prometheus metrics for fanin collection runs.
//!
//! [`PrometheusMetrics`] is a [`fanin_core::Subscribe`] implementation: attach it to a
//! [`fanin_core::Collector`] and every run updates the counters below.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use fanin_core::{Collector, RunnerRouter};
//! use fanin_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let collector = Collector::new(RunnerRouter::new()).with_subscriber(Arc::new(metrics.clone()));
//! # let _ = collector;
//!
//! // later, e.g. from a /metrics handler
//! let text = metrics.encode_text()?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `fanin_tasks_started_total` - Counter
//! - `fanin_task_outcomes_total{outcome}` - Counter (`succeeded`, `failed`, `canceled`, `dropped`)
//! - `fanin_runs_total{stop}` - Counter (`completed`, `deadline_exceeded`, `cancelled`)
//! - `fanin_run_duration_seconds` - Histogram
//!
//! ## HTTP Server
//! This crate does NOT provide an HTTP server for the `/metrics` endpoint.
//! Serve [`PrometheusMetrics::gather`] through your application's own HTTP stack.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};

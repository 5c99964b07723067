use async_trait::async_trait;
use fanin_core::{Event, EventKind, Subscribe};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

const DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Run and task metrics backed by a dedicated [`Registry`].
///
/// Cloning is cheap; clones update and expose the same metrics.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    tasks_started: IntCounter,
    task_outcomes: IntCounterVec,
    runs: IntCounterVec,
    run_duration: Histogram,
}

impl PrometheusMetrics {
    /// Creates the metrics in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Registers the metrics in `registry`.
    ///
    /// Fails when the registry already holds metrics with the same names.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let tasks_started = IntCounter::with_opts(Opts::new(
            "fanin_tasks_started_total",
            "Tasks launched by collection runs",
        ))?;
        let task_outcomes = IntCounterVec::new(
            Opts::new(
                "fanin_task_outcomes_total",
                "Task terminations by outcome",
            ),
            &["outcome"],
        )?;
        let runs = IntCounterVec::new(
            Opts::new("fanin_runs_total", "Finished collection runs by stop reason"),
            &["stop"],
        )?;
        let run_duration = Histogram::with_opts(
            HistogramOpts::new(
                "fanin_run_duration_seconds",
                "Wall-clock time from run start to report",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(tasks_started.clone()))?;
        registry.register(Box::new(task_outcomes.clone()))?;
        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(run_duration.clone()))?;

        Ok(Self {
            registry,
            tasks_started,
            task_outcomes,
            runs,
            run_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Renders all metrics in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn record(&self, event: &Event) {
        match event.kind {
            EventKind::TaskStarting => self.tasks_started.inc(),
            EventKind::TaskSucceeded => self.outcome("succeeded"),
            EventKind::TaskFailed => self.outcome("failed"),
            EventKind::TaskCanceled => self.outcome("canceled"),
            EventKind::DeliveryDropped => self.outcome("dropped"),
            EventKind::RunCompleted => {
                let stop = event.reason.as_deref().unwrap_or("unknown");
                self.runs.with_label_values(&[stop]).inc();
                if let Some(ms) = event.elapsed_ms {
                    self.run_duration.observe(ms as f64 / 1000.0);
                }
            }
            EventKind::RunStarted | EventKind::DeadlineExceeded | EventKind::RunCancelled => {}
        }
    }

    fn outcome(&self, outcome: &str) {
        self.task_outcomes.with_label_values(&[outcome]).inc();
    }
}

#[async_trait]
impl Subscribe for PrometheusMetrics {
    async fn on_event(&self, event: &Event) {
        self.record(event);
    }
    fn name(&self) -> &'static str {
        "prometheus"
    }
    fn queue_capacity(&self) -> usize {
        4096
    }
}

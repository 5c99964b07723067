use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fanin_core::{Collector, RunnerRouter};
use fanin_exec::register_default_runners;
use fanin_model::{CollectPlan, TaskKind, TaskSpec};
use fanin_observe::{LogSubscriber, LoggerConfig, logger_init};
use fanin_prometheus::PrometheusMetrics;

/// Usage: `collect-demo [plan.json]`; without a path the built-in partial plan runs.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    let level = std::env::var("FANIN_LOG").unwrap_or_else(|_| "info".to_string());
    logger_init(&LoggerConfig::default().with_level(level))?;
    info!("logger initialized");

    // 2) Plan
    let plan = match std::env::args().nth(1) {
        Some(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading plan {path}"))?;
            serde_json::from_str::<CollectPlan>(&raw)
                .with_context(|| format!("parsing plan {path}"))?
        }
        None => builtin_plan(),
    };
    info!(tasks = plan.tasks.len(), deadline_ms = plan.deadline_ms, "plan loaded");

    // 3) Router + runners
    let mut router = RunnerRouter::new();
    register_default_runners(&mut router);

    // 4) Collector, stopped early by Ctrl+C
    let metrics = PrometheusMetrics::new()?;
    let shutdown = CancellationToken::new();
    let collector = Collector::new(router)
        .with_subscriber(Arc::new(LogSubscriber::new()))
        .with_subscriber(Arc::new(metrics.clone()))
        .with_cancel(&shutdown);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            signal.cancel();
        }
    });

    // 5) Run
    let (report, completion) = collector.collect_plan_tracked(&plan).await?;
    info!(
        sum = report.sum::<i64>(),
        collected = report.collected(),
        outstanding = report.outstanding_count(),
        timed_out = report.timed_out(),
        "collection finished"
    );

    // cancelled tasks and subscriber queues settle after the report is ready
    completion.wait().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    print!("{}", metrics.encode_text()?);
    Ok(())
}

/// Three sleepers of 1s, 2s and 10s under a 3s deadline.
fn builtin_plan() -> CollectPlan {
    CollectPlan::new(3_000)
        .with_task(TaskSpec::new(1u64, TaskKind::sleep(1_000, 10)))
        .with_task(TaskSpec::new(2u64, TaskKind::sleep(2_000, 20)))
        .with_task(TaskSpec::new(3u64, TaskKind::sleep(10_000, 30)))
}

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;

use fanin_model::{DrainPolicy, TaskId, TaskOutcome};

use super::*;
use crate::{
    events::{Event, EventKind, Subscribe},
    task::{TaskContext, WorkError},
};

/// Simulated work: sleep for `ms`, then report `value`.
fn sleeper(id: u64, ms: u64, value: i64) -> Task<i64> {
    Task::new(id, move |_ctx: TaskContext| async move {
        sleep(Duration::from_millis(ms)).await;
        Ok(value)
    })
}

/// Counts finished work, including work dropped by cancellation.
struct Finished(Arc<AtomicUsize>);

impl Drop for Finished {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn counted_sleeper(id: u64, ms: u64, value: i64, finished: &Arc<AtomicUsize>) -> Task<i64> {
    let finished = Arc::clone(finished);
    Task::new(id, move |_ctx: TaskContext| async move {
        let _guard = Finished(finished);
        sleep(Duration::from_millis(ms)).await;
        Ok(value)
    })
}

fn secs(s: u64) -> CollectConfig {
    CollectConfig::new(Duration::from_secs(s))
}

#[tokio::test(start_paused = true)]
async fn partial_collection_stops_at_deadline() {
    let tasks = vec![
        sleeper(1, 1_000, 10),
        sleeper(2, 2_000, 20),
        sleeper(3, 10_000, 30),
    ];

    let report = collect(tasks, &secs(3)).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.collected(), 2);
    assert_eq!(report.outstanding, vec![TaskId::new(3)]);
    assert_eq!(report.outstanding_count(), 1);
    assert!(report.timed_out());
    assert_eq!(report.sum::<i64>(), 30);
    assert_eq!(report.elapsed_ms, 3_000);
}

#[tokio::test(start_paused = true)]
async fn full_collection_returns_with_last_result() {
    let tasks = vec![
        sleeper(1, 1_000, 1),
        sleeper(2, 1_000, 2),
        sleeper(3, 1_000, 3),
    ];

    let report = collect(tasks, &secs(5)).await.unwrap();

    assert_eq!(report.collected(), 3);
    assert!(report.outstanding.is_empty());
    assert!(!report.timed_out());
    assert!(report.is_complete());
    assert_eq!(report.sum::<i64>(), 6);
    assert_eq!(report.elapsed_ms, 1_000);
}

#[tokio::test(start_paused = true)]
async fn zero_deadline_collects_nothing_and_leaks_nothing() {
    let finished = Arc::new(AtomicUsize::new(0));
    let tasks = vec![
        counted_sleeper(1, 0, 1, &finished),
        counted_sleeper(2, 10, 2, &finished),
        counted_sleeper(3, 1_000, 3, &finished),
    ];

    let (report, completion) = collect_tracked(tasks, &CollectConfig::new(Duration::ZERO))
        .await
        .unwrap();

    assert_eq!(report.collected(), 0);
    assert_eq!(report.outstanding_count(), 3);
    assert!(report.timed_out());

    tokio::time::timeout(Duration::from_millis(50), completion.wait())
        .await
        .expect("tasks must exit right after a zero deadline");
    assert!(completion.is_finished());
}

#[tokio::test(start_paused = true)]
async fn empty_run_completes_immediately() {
    let report = collect(Vec::<Task<i64>>::new(), &CollectConfig::new(Duration::ZERO))
        .await
        .unwrap();

    assert_eq!(report.total, 0);
    assert!(report.is_complete());
    assert!(!report.timed_out());
    assert_eq!(report.elapsed_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn every_task_is_counted_exactly_once() {
    let n = 64u64;
    let tasks = (0..n)
        .map(|i| sleeper(i, (i * 37) % 101, i as i64))
        .collect::<Vec<_>>();

    let report = collect(tasks, &secs(1)).await.unwrap();

    assert_eq!(report.collected(), n as usize);
    let ids: HashSet<TaskId> = report.ids().collect();
    assert_eq!(ids.len(), n as usize);
    assert!((0..n).all(|i| ids.contains(&TaskId::new(i))));
}

#[tokio::test(start_paused = true)]
async fn deadline_bounds_wall_clock() {
    let tasks = (0..32u64)
        .map(|i| sleeper(i, 60_000 + i, 1))
        .collect::<Vec<_>>();

    let started = tokio::time::Instant::now();
    let report = collect(tasks, &CollectConfig::new(Duration::from_millis(250)))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(260));
    assert_eq!(report.collected(), 0);
    assert_eq!(report.outstanding_count(), 32);
}

#[tokio::test(start_paused = true)]
async fn no_task_outlives_the_run() {
    let finished = Arc::new(AtomicUsize::new(0));
    let tasks = vec![
        counted_sleeper(1, 1_000, 1, &finished),
        counted_sleeper(2, 2_000, 2, &finished),
        counted_sleeper(3, 10_000, 3, &finished),
        counted_sleeper(4, 600_000, 4, &finished),
    ];

    let (report, completion) = collect_tracked(tasks, &secs(3)).await.unwrap();
    assert_eq!(report.outstanding_count(), 2);

    tokio::time::timeout(Duration::from_millis(50), completion.wait())
        .await
        .expect("cancelled tasks must exit within the grace period");
    assert_eq!(completion.running(), 0);
    assert_eq!(finished.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn aggregate_ignores_launch_order() {
    let durations = [(1u64, 300u64, 5i64), (2, 100, 7), (3, 200, 11), (4, 5_000, 13)];

    let forward = durations
        .iter()
        .map(|&(id, ms, v)| sleeper(id, ms, v))
        .collect::<Vec<_>>();
    let reversed = durations
        .iter()
        .rev()
        .map(|&(id, ms, v)| sleeper(id, ms, v))
        .collect::<Vec<_>>();

    let a = collect(forward, &secs(1)).await.unwrap();
    let b = collect(reversed, &secs(1)).await.unwrap();

    assert_eq!(a.sum::<i64>(), 23);
    assert_eq!(a.sum::<i64>(), b.sum::<i64>());

    let mut a_ids = a.ids().collect::<Vec<_>>();
    let mut b_ids = b.ids().collect::<Vec<_>>();
    a_ids.sort();
    b_ids.sort();
    assert_eq!(a_ids, b_ids);
}

#[tokio::test(start_paused = true)]
async fn results_arrive_in_completion_order() {
    let tasks = vec![sleeper(1, 300, 1), sleeper(2, 100, 2), sleeper(3, 200, 3)];

    let report = collect(tasks, &secs(1)).await.unwrap();

    assert_eq!(
        report.ids().collect::<Vec<_>>(),
        vec![TaskId::new(2), TaskId::new(3), TaskId::new(1)]
    );
}

#[tokio::test(start_paused = true)]
async fn failures_are_reported_not_dropped() {
    let tasks: Vec<Task<i64>> = vec![
        sleeper(1, 100, 1),
        Task::new(2u64, |_ctx: TaskContext| async move {
            sleep(Duration::from_millis(50)).await;
            Err(WorkError::fail("disk full"))
        }),
    ];

    let report = collect(tasks, &secs(1)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.outcomes[0], TaskOutcome::failed(TaskId::new(2), "disk full"));
}

#[tokio::test(start_paused = true)]
async fn panicking_work_becomes_failure() {
    let tasks: Vec<Task<i64>> = vec![
        sleeper(1, 10, 1),
        Task::new(2u64, |_ctx: TaskContext| async move {
            let blow_up = true;
            if blow_up {
                panic!("work blew up");
            }
            Ok(0)
        }),
    ];

    let report = collect(tasks, &secs(1)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.failed(), 1);
    let failed = report.outcomes.iter().find(|o| !o.is_success()).unwrap();
    assert_eq!(failed.id(), TaskId::new(2));
    assert_eq!(failed.reason(), Some("task panicked"));
}

#[tokio::test(start_paused = true)]
async fn self_cancelled_work_is_a_failure() {
    let tasks: Vec<Task<i64>> = vec![Task::new(1u64, |_ctx: TaskContext| async move {
        Err(WorkError::Cancelled)
    })];

    let report = collect(tasks, &secs(1)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.failed(), 1);
}

#[tokio::test(start_paused = true)]
async fn drain_returns_once_stream_closes() {
    let tasks = vec![sleeper(1, 1_000, 1), sleeper(2, 60_000, 2)];
    let cfg = secs(2)
        .with_drain(DrainPolicy::Drain)
        .with_drain_grace(Duration::from_secs(30));

    let report = collect(tasks, &cfg).await.unwrap();

    // the watcher closes the stream as soon as the cancelled task exits,
    // well before the drain grace would elapse
    assert!(report.elapsed_ms < 2_100);
    assert!(report.timed_out());
    assert_eq!(report.collected(), 1);
    assert_eq!(report.outstanding, vec![TaskId::new(2)]);
}

#[tokio::test(start_paused = true)]
async fn parent_cancellation_stops_the_run() {
    let parent = CancellationToken::new();
    let collector = Collector::default().with_cancel(&parent);

    let trigger = parent.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(1_500)).await;
        trigger.cancel();
    });

    let tasks = vec![sleeper(1, 1_000, 1), sleeper(2, 10_000, 2)];
    let (report, completion) = collector.collect_tracked(tasks, &secs(5)).await.unwrap();

    assert_eq!(report.stop, StopReason::Cancelled);
    assert!(!report.timed_out());
    assert_eq!(report.collected(), 1);
    assert_eq!(report.outstanding, vec![TaskId::new(2)]);
    assert_eq!(report.elapsed_ms, 1_500);

    tokio::time::timeout(Duration::from_millis(50), completion.wait())
        .await
        .expect("tasks must exit after parent cancellation");
}

#[tokio::test(start_paused = true)]
async fn runs_do_not_cancel_the_parent() {
    let parent = CancellationToken::new();
    let collector = Collector::default().with_cancel(&parent);

    let report = collector
        .collect(vec![sleeper(1, 10_000, 1)], &secs(1))
        .await
        .unwrap();

    assert!(report.timed_out());
    assert!(!parent.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn stop_grace_lets_cooperative_work_clean_up() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&cleaned);
    let tasks = vec![Task::new(1u64, move |ctx: TaskContext| async move {
        tokio::select! {
            _ = ctx.cancelled() => {
                sleep(Duration::from_millis(200)).await;
                flag.fetch_add(1, Ordering::SeqCst);
                Err(WorkError::Cancelled)
            }
            _ = sleep(Duration::from_secs(60)) => Ok(1i64),
        }
    })];
    let cfg = secs(1).with_stop_grace(Duration::from_secs(1));

    let (report, completion) = collect_tracked(tasks, &cfg).await.unwrap();

    // the coordinator does not wait for the clean-up
    assert_eq!(report.elapsed_ms, 1_000);
    assert_eq!(report.outstanding, vec![TaskId::new(1)]);

    tokio::time::timeout(Duration::from_secs(2), completion.wait())
        .await
        .expect("cooperative task must exit within the stop grace");
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_grace_is_bounded_for_stubborn_work() {
    let finished = Arc::new(AtomicUsize::new(0));
    let tasks = vec![counted_sleeper(1, 600_000, 1, &finished)];
    let cfg = secs(1).with_stop_grace(Duration::from_millis(500));

    let (_, completion) = collect_tracked(tasks, &cfg).await.unwrap();
    let waiting = tokio::time::Instant::now();

    tokio::time::timeout(Duration::from_secs(2), completion.wait())
        .await
        .expect("work ignoring cancellation must be aborted after the stop grace");
    assert!(waiting.elapsed() <= Duration::from_millis(500));
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_run_cancels_its_tasks() {
    let finished = Arc::new(AtomicUsize::new(0));
    let tasks = vec![
        counted_sleeper(1, 600_000, 1, &finished),
        counted_sleeper(2, 600_000, 2, &finished),
    ];

    let run = tokio::time::timeout(Duration::from_secs(1), collect(tasks, &secs(5))).await;
    assert!(run.is_err());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 2);
}

/// Two tasks, one finishing at 1s and one exactly at the 2s deadline.
async fn boundary_run(drain: DrainPolicy) -> CollectReport<i64> {
    let tasks = vec![sleeper(1, 2_000, 20), sleeper(2, 1_000, 10)];
    let cfg = secs(2)
        .with_drain(drain)
        .with_drain_grace(Duration::from_secs(1))
        .with_stop_grace(Duration::from_millis(100));
    collect(tasks, &cfg).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn drain_keeps_results_finished_at_the_deadline() {
    let discarded = boundary_run(DrainPolicy::Discard).await;
    assert_eq!(discarded.collected(), 1);
    assert_eq!(discarded.outstanding, vec![TaskId::new(1)]);

    let drained = boundary_run(DrainPolicy::Drain).await;
    assert_eq!(drained.stop, StopReason::DeadlineExceeded);
    assert_eq!(drained.collected(), 2);
    assert!(drained.outstanding.is_empty());
    assert_eq!(drained.sum::<i64>(), 30);
}

#[test]
fn millis_saturates() {
    assert_eq!(millis(Duration::from_millis(1_500)), 1_500);
    assert_eq!(millis(Duration::MAX), u64::MAX);
}

#[tokio::test]
async fn duplicate_ids_launch_nothing() {
    let started = Arc::new(AtomicUsize::new(0));
    let task = |id: u64| {
        let started = Arc::clone(&started);
        Task::new(id, move |_ctx: TaskContext| async move {
            started.fetch_add(1, Ordering::SeqCst);
            Ok(1i64)
        })
    };

    let result = collect(vec![task(1), task(2), task(1)], &secs(1)).await;

    assert!(matches!(result, Err(CoreError::DuplicateTask(id)) if id == TaskId::new(1)));
    tokio::task::yield_now().await;
    assert_eq!(started.load(Ordering::SeqCst), 0);
}

struct Recorder(mpsc::UnboundedSender<Event>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        let _ = self.0.send(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

async fn events_until_completed(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = event.kind == EventKind::RunCompleted;
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_the_run_lifecycle() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let collector = Collector::default().with_subscriber(Arc::new(Recorder(tx)));

    let tasks = vec![sleeper(1, 100, 1), sleeper(2, 200, 2), sleeper(3, 300, 3)];
    let report = collector.collect(tasks, &secs(1)).await.unwrap();
    assert!(report.is_complete());

    let events = events_until_completed(&mut rx).await;
    let count = |kind: EventKind| events.iter().filter(|e| e.kind == kind).count();

    assert_eq!(events.first().map(|e| e.kind), Some(EventKind::RunStarted));
    assert_eq!(count(EventKind::TaskStarting), 3);
    assert_eq!(count(EventKind::TaskSucceeded), 3);
    assert_eq!(count(EventKind::DeadlineExceeded), 0);

    let last = events.last().unwrap();
    assert_eq!(last.kind, EventKind::RunCompleted);
    assert_eq!(last.collected, Some(3));
    assert_eq!(last.outstanding, Some(0));
    assert_eq!(last.reason.as_deref(), Some("completed"));
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_the_deadline() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let collector = Collector::default().with_subscriber(Arc::new(Recorder(tx)));

    let tasks = vec![sleeper(1, 100, 1), sleeper(2, 5_000, 2)];
    collector.collect(tasks, &secs(1)).await.unwrap();

    let events = events_until_completed(&mut rx).await;
    let deadline = events
        .iter()
        .find(|e| e.kind == EventKind::DeadlineExceeded)
        .expect("deadline event");

    assert_eq!(deadline.total, Some(2));
    assert_eq!(deadline.collected, Some(1));
    assert_eq!(deadline.outstanding, Some(1));
    assert_eq!(deadline.elapsed_ms, Some(1_000));
}

#[tokio::test(start_paused = true)]
async fn completion_covers_late_task_events() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let collector = Collector::default().with_subscriber(Arc::new(Recorder(tx)));

    let tasks = vec![sleeper(1, 100, 1), sleeper(2, 5_000, 2)];
    let (_, completion) = collector.collect_tracked(tasks, &secs(1)).await.unwrap();
    completion.wait().await;
    assert!(completion.is_finished());

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind);
    }
    assert!(kinds.contains(&EventKind::TaskCanceled));
    assert!(kinds.contains(&EventKind::RunCompleted));
}

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::http::RequestOutcome;
use crate::report::LoadTestReport;
use crate::shutdown::{
    ShutdownReceiver, ShutdownSender, setup_deadline_shutdown, shutdown_channel, stop_requested,
    take_stop_reason,
};

use super::collector::OutcomeCollector;
use super::config::LoadTestConfig;
use super::queue::TaskQueue;
use super::task::{RequestExecutor, RequestTask};

/// Description used for ordinals whose worker ended without reporting.
const WORKER_LOST_REASON: &str = "worker exited before reporting";

struct WorkerContext<E: ?Sized> {
    worker_id: usize,
    config: Arc<LoadTestConfig>,
    queue: Arc<TaskQueue>,
    executor: Arc<E>,
    outcome_tx: mpsc::Sender<(u64, RequestOutcome)>,
    shutdown_rx: ShutdownReceiver,
}

/// Runs every request in `config` and returns once each ordinal has exactly
/// one outcome.
pub async fn run<E>(config: LoadTestConfig, executor: Arc<E>) -> LoadTestReport
where
    E: RequestExecutor + ?Sized + 'static,
{
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    run_with_shutdown(config, executor, &shutdown_tx).await
}

/// Like [`run`], but stops dispatching when a [`StopReason`] is broadcast on
/// `shutdown_tx`. Unfinished ordinals are reported as cancelled.
///
/// [`StopReason`]: crate::shutdown::StopReason
pub async fn run_with_shutdown<E>(
    config: LoadTestConfig,
    executor: Arc<E>,
    shutdown_tx: &ShutdownSender,
) -> LoadTestReport
where
    E: RequestExecutor + ?Sized + 'static,
{
    let config = Arc::new(config);
    let total = config.total_requests();
    let workers = config.effective_concurrency().max(1);
    let queue = Arc::new(TaskQueue::new(total));
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<(u64, RequestOutcome)>(workers);
    let mut stop_rx = shutdown_tx.subscribe();

    debug!("Spawning {} workers for {} requests", workers, total);
    let run_start = Instant::now();
    let deadline_task = config
        .run_deadline()
        .map(|deadline| setup_deadline_shutdown(shutdown_tx, deadline));

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let context = WorkerContext {
            worker_id,
            config: Arc::clone(&config),
            queue: Arc::clone(&queue),
            executor: Arc::clone(&executor),
            outcome_tx: outcome_tx.clone(),
            shutdown_rx: shutdown_tx.subscribe(),
        };
        handles.push(tokio::spawn(worker_loop(context)));
    }
    drop(outcome_tx);

    let mut collector = OutcomeCollector::new(total);
    while let Some((ordinal, outcome)) = outcome_rx.recv().await {
        collector.record(ordinal, outcome);
    }
    let total_duration = run_start.elapsed();

    if let Some(task) = deadline_task {
        task.abort();
    }
    for handle in handles {
        if let Err(err) = handle.await {
            error!("Worker task failed: {}", err);
        }
    }

    let stop_reason = take_stop_reason(&mut stop_rx);
    let completed = u64::try_from(collector.received()).unwrap_or(u64::MAX);
    if let Some(reason) = stop_reason
        && completed < total
    {
        warn!(
            "Run stopped early ({}): {} of {} requests dispatched, {} completed",
            reason,
            queue.dispatched(),
            total,
            completed
        );
    }
    let gap_reason =
        stop_reason.map_or_else(|| WORKER_LOST_REASON.to_owned(), |reason| reason.to_string());

    LoadTestReport::from_outcomes(
        config.expected_response(),
        collector.finish(&gap_reason),
        total_duration,
    )
}

async fn worker_loop<E>(mut context: WorkerContext<E>)
where
    E: RequestExecutor + ?Sized,
{
    loop {
        if take_stop_reason(&mut context.shutdown_rx).is_some() {
            break;
        }
        let Some(ordinal) = context.queue.claim() else {
            break;
        };
        let task = RequestTask::new(ordinal, Arc::clone(&context.config));

        let outcome = tokio::select! {
            biased;
            () = stop_requested(&mut context.shutdown_rx) => {
                debug!(
                    "Worker {} abandoning request #{} on shutdown",
                    context.worker_id, ordinal
                );
                break;
            }
            outcome = context.executor.execute(&task) => outcome,
        };

        log_outcome(ordinal, &outcome);
        if context.outcome_tx.send((ordinal, outcome)).await.is_err() {
            warn!("Outcome collector closed; worker {} exiting", context.worker_id);
            break;
        }
    }
}

fn log_outcome(ordinal: u64, outcome: &RequestOutcome) {
    match outcome {
        RequestOutcome::Success { elapsed, .. } => {
            info!(
                "[ok] Request #{} succeeded in {:.2}s",
                ordinal,
                elapsed.as_secs_f64()
            );
        }
        RequestOutcome::Failure {
            description,
            elapsed,
            ..
        } => {
            warn!(
                "[fail] Request #{} failed after {:.2}s: {}",
                ordinal,
                elapsed.as_secs_f64(),
                description
            );
        }
    }
}

//! Background worker persisting click events.
//!
//! Events are processed concurrently (bounded by a semaphore). Each write is
//! retried with jittered exponential backoff; once retries are exhausted the
//! click is dropped and logged. When the channel closes the worker waits for
//! in-flight writes before returning.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickRepository;

const BACKOFF_BASE_MS: u64 = 50;
const BACKOFF_MAX: Duration = Duration::from_secs(2);

/// Runs the click worker until `rx` is closed and drained.
pub async fn run_click_worker<C>(
    mut rx: mpsc::Receiver<ClickEvent>,
    repo: Arc<C>,
    concurrency: usize,
    max_retries: usize,
) where
    C: ClickRepository + ?Sized + 'static,
{
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repo = repo.clone();

        tasks.spawn(async move {
            process_event(repo.as_ref(), event, max_retries).await;
            drop(permit);
        });

        // Reap finished tasks so the set does not grow unbounded.
        while tasks.try_join_next().is_some() {}
    }

    while tasks.join_next().await.is_some() {}
    tracing::info!("Click worker stopped");
}

/// Persists one click, retrying transient failures.
pub(crate) async fn process_event<C>(repo: &C, event: ClickEvent, max_retries: usize)
where
    C: ClickRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(BACKOFF_BASE_MS)
        .max_delay(BACKOFF_MAX)
        .map(jitter)
        .take(max_retries);

    let result = Retry::spawn(strategy, || repo.record_click(&event.code, event.clicked_at)).await;

    match result {
        Ok(true) => {
            metrics::counter!("clicks_recorded_total").increment(1);
        }
        Ok(false) => {
            tracing::debug!(code = %event.code, "Click for unknown code ignored");
        }
        Err(e) => {
            metrics::counter!("clicks_failed_total").increment(1);
            tracing::error!(code = %event.code, error = %e, "Failed to record click");
        }
    }
}

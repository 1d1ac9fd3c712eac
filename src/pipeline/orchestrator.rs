//! The task that drives one pipeline run from planning to close.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, debug_span, info, Instrument};

use crate::core::{Error, PagedSource, Result};
use crate::pagination::{self, PagePlan, Pagination};
use crate::pipeline::scope::{millis, RunScope};
use crate::pipeline::task::{self, ItemSink};
use crate::pipeline::{FetchMode, PipelineConfig, PipelineState};

/// Channels the orchestrator finalizes when the run ends.
pub(crate) struct Outputs<T> {
    pub(crate) items: mpsc::Sender<T>,
    pub(crate) error: oneshot::Sender<Option<Error>>,
    pub(crate) state: watch::Sender<PipelineState>,
}

/// Run the pipeline to completion and close its outputs exactly once.
pub(crate) async fn drive<S>(
    source: Arc<S>,
    config: PipelineConfig,
    scope: Arc<RunScope>,
    outputs: Outputs<S::Item>,
) where
    S: PagedSource + 'static,
{
    let started = Instant::now();
    let Outputs {
        items,
        error,
        state,
    } = outputs;

    let sink = ItemSink::new(items);
    let result = {
        // Sequential fetches run on this task; a panicking source must still
        // let the run close.
        let work = AssertUnwindSafe(run_stages(&source, &config, &scope, &sink, &state))
            .catch_unwind()
            .map(|outcome| outcome.unwrap_or_else(|panic| Err(panicked(panic))));
        tokio::pin!(work);

        let result = match config.deadline {
            Some(limit) => {
                tokio::select! {
                    result = &mut work => result,
                    _ = tokio::time::sleep(limit) => {
                        debug!(deadline_ms = millis(limit), "Deadline elapsed, cancelling");
                        scope.expire();
                        (&mut work).await
                    }
                }
            }
            None => (&mut work).await,
        };
        result
    };

    if let Err(e) = result {
        scope.fail(e);
    }

    if drains_after(*state.borrow()) {
        state.send_replace(PipelineState::Draining);
    }
    let first_error = scope.first_error();
    match &first_error {
        None => info!(elapsed_ms = millis(started.elapsed()), "Pipeline completed"),
        Some(e) => info!(
            elapsed_ms = millis(started.elapsed()),
            error = %e,
            "Pipeline closed with error"
        ),
    }

    // The consumer may have dropped the slot already; nothing else to do.
    let _ = error.send(first_error);

    // Last sender: dropping it closes the item stream.
    drop(sink);
    state.send_replace(PipelineState::Closed);
}

/// A run that never left planning has no fetches to drain and closes
/// directly.
fn drains_after(last: PipelineState) -> bool {
    last != PipelineState::Planning
}

fn panicked(panic: Box<dyn Any + Send>) -> Error {
    let message = match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast_ref::<&str>() {
            Some(message) => (*message).to_string(),
            None => "unknown panic payload".to_string(),
        },
    };
    Error::TaskPanicked(message)
}

async fn run_stages<S>(
    source: &Arc<S>,
    config: &PipelineConfig,
    scope: &Arc<RunScope>,
    sink: &ItemSink<S::Item>,
    state: &watch::Sender<PipelineState>,
) -> Result<()>
where
    S: PagedSource + 'static,
{
    state.send_replace(PipelineState::Planning);
    let total = scope.guard(source.count()).await?;
    let plan = pagination::plan(total, config.page_size, config.partial_page)?;
    info!(
        total,
        pages = plan.len(),
        items = plan.item_count(),
        "Planned pages"
    );

    state.send_replace(PipelineState::Fetching);
    match config.mode {
        FetchMode::Sequential => run_sequential(&**source, plan, scope, sink).await,
        FetchMode::Concurrent => {
            run_concurrent(source, plan, config.max_concurrency, scope, sink).await;
            Ok(())
        }
    }
}

async fn run_sequential<S>(
    source: &S,
    plan: PagePlan,
    scope: &RunScope,
    sink: &ItemSink<S::Item>,
) -> Result<()>
where
    S: PagedSource,
{
    for page in plan {
        task::fetch_page(source, page, sink, scope).await?;
    }
    Ok(())
}

/// Fan pages out over `min(pages, max_concurrency)` workers. Workers record
/// their own errors in the scope so the first failure cancels the rest.
async fn run_concurrent<S>(
    source: &Arc<S>,
    plan: PagePlan,
    max_concurrency: usize,
    scope: &Arc<RunScope>,
    sink: &ItemSink<S::Item>,
) where
    S: PagedSource + 'static,
{
    let pages: Arc<[Pagination]> = plan.into_iter().collect();
    let workers = max_concurrency.max(1).min(pages.len());
    let cursor = Arc::new(AtomicUsize::new(0));
    debug!(workers, "Starting fetch workers");

    let mut set = JoinSet::new();
    for worker in 0..workers {
        let source = Arc::clone(source);
        let pages = Arc::clone(&pages);
        let cursor = Arc::clone(&cursor);
        let scope = Arc::clone(scope);
        let sink = sink.clone();

        set.spawn(
            async move {
                loop {
                    let next = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(&page) = pages.get(next) else {
                        break;
                    };
                    if let Err(e) = task::fetch_page(&*source, page, &sink, &scope).await {
                        scope.fail(e);
                        break;
                    }
                }
            }
            .instrument(debug_span!("fetch_worker", worker)),
        );
    }

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            scope.fail(Error::from(e));
        }
    }
}

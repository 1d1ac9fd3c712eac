//! The per-page fetch task.

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::{Error, PagedSource, Result};
use crate::pagination::Pagination;
use crate::pipeline::scope::RunScope;
use crate::telemetry;

/// Sending half of the item stream, as seen by one fetch task.
pub(crate) struct ItemSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T: Send> ItemSink<T> {
    pub(crate) fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }

    /// Hand one item to the consumer, giving up if the run is cancelled
    /// first.
    pub(crate) async fn send(&self, item: T, scope: &RunScope) -> Result<()> {
        scope
            .guard(async move { self.tx.send(item).await.map_err(Error::from) })
            .await?;
        telemetry::item_emitted();
        Ok(())
    }
}

impl<T> Clone for ItemSink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Fetch one page and push its items, in page order, into the sink.
///
/// Returns the number of items delivered.
pub(crate) async fn fetch_page<S>(
    source: &S,
    page: Pagination,
    sink: &ItemSink<S::Item>,
    scope: &RunScope,
) -> Result<usize>
where
    S: PagedSource + ?Sized,
{
    let items = scope.guard(source.fetch_page(page)).await?;
    let fetched = items.len();
    debug!(offset = page.offset, size = page.size, fetched, "Fetched page");
    telemetry::page_fetched(fetched);

    for item in items {
        sink.send(item, scope).await?;
    }
    Ok(fetched)
}

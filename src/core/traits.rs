//! The collaborator trait the pipeline pulls pages from.

use async_trait::async_trait;

use crate::core::error::Result;
use crate::pagination::Pagination;

/// A source of paginated data.
///
/// The pipeline asks the source for its total item count once, plans the
/// pages, then fetches each page. Sources are shared between fetch workers,
/// so both methods take `&self`.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use pagestream::core::{PagedSource, Result};
/// use pagestream::pagination::Pagination;
///
/// struct Squares;
///
/// #[async_trait]
/// impl PagedSource for Squares {
///     type Item = u64;
///
///     async fn count(&self) -> Result<usize> {
///         Ok(25)
///     }
///
///     async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>> {
///         Ok(page.range().map(|i| (i * i) as u64).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait PagedSource: Send + Sync {
    /// The type of items this source yields
    type Item: Send + 'static;

    /// Total number of items available.
    async fn count(&self) -> Result<usize>;

    /// Fetch the items of one page, in page order.
    ///
    /// Errors are surfaced to the consumer unmodified; the pipeline never
    /// retries a page.
    async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>>;
}

#[async_trait]
impl<S: PagedSource + ?Sized> PagedSource for std::sync::Arc<S> {
    type Item = S::Item;

    async fn count(&self) -> Result<usize> {
        (**self).count().await
    }

    async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>> {
        (**self).fetch_page(page).await
    }
}

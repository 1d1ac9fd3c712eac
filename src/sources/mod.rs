//! Source implementations for the pagestream library.
//!
//! These are in-memory stand-ins for a paginated backend: they answer
//! `count` and `fetch_page` without any real I/O.

use async_trait::async_trait;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

use crate::core::{Error, PagedSource, Result};
use crate::pagination::Pagination;

/// Failures injected by the in-memory sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The count call was configured to fail
    #[error("count unavailable")]
    CountUnavailable,

    /// A page was configured to fail
    #[error("page at offset {offset} unavailable")]
    PageUnavailable { offset: usize },
}

/// A source of the integers `0..total`, paged by index.
///
/// Item `i` is the integer `i`, so the full run yields `0..total`.
pub struct NumberSource {
    total: usize,
    fail_count: bool,
    failing_offsets: HashSet<usize>,
    fetches: AtomicUsize,
}

impl NumberSource {
    /// Create a number source holding `total` items
    pub fn new(total: usize) -> Self {
        Self {
            total,
            fail_count: false,
            failing_offsets: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Make `count` fail
    pub fn fail_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    /// Make the page starting at `offset` fail
    pub fn fail_at_offset(mut self, offset: usize) -> Self {
        self.failing_offsets.insert(offset);
        self
    }

    /// Make the 1-based page `page_number` of a `page_size`-item plan fail.
    ///
    /// Page number zero names no page and is ignored.
    pub fn fail_on_page(self, page_number: usize, page_size: usize) -> Self {
        match Pagination::from_page_number(page_number, page_size) {
            Some(page) => self.fail_at_offset(page.offset),
            None => self,
        }
    }

    /// Number of `fetch_page` calls made so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for NumberSource {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl PagedSource for NumberSource {
    type Item = usize;

    async fn count(&self) -> Result<usize> {
        if self.fail_count {
            return Err(Error::from_source(SourceError::CountUnavailable));
        }
        Ok(self.total)
    }

    async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_offsets.contains(&page.offset) {
            return Err(Error::from_source(SourceError::PageUnavailable {
                offset: page.offset,
            }));
        }
        Ok(page.range().collect())
    }
}

/// A source that pages over an in-memory vector
pub struct VecSource<T> {
    items: Vec<T>,
}

impl<T> VecSource<T> {
    /// Create a new vector source
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Check if the source holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> PagedSource for VecSource<T> {
    type Item = T;

    async fn count(&self) -> Result<usize> {
        Ok(self.items.len())
    }

    async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>> {
        let start = page.offset.min(self.items.len());
        let end = page.end().min(self.items.len());
        Ok(self.items[start..end].to_vec())
    }
}

/// A source that waits before every call to its inner source
pub struct DelayedSource<S> {
    inner: S,
    count_delay: Duration,
    page_delay: Duration,
}

impl<S> DelayedSource<S> {
    /// Delay every page fetch by `page_delay`
    pub fn new(inner: S, page_delay: Duration) -> Self {
        Self {
            inner,
            count_delay: Duration::ZERO,
            page_delay,
        }
    }

    /// Also delay the count call
    pub fn with_count_delay(mut self, delay: Duration) -> Self {
        self.count_delay = delay;
        self
    }

    /// The wrapped source
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PagedSource> PagedSource for DelayedSource<S> {
    type Item = S::Item;

    async fn count(&self) -> Result<usize> {
        if !self.count_delay.is_zero() {
            sleep(self.count_delay).await;
        }
        self.inner.count().await
    }

    async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>> {
        sleep(self.page_delay).await;
        self.inner.fetch_page(page).await
    }
}

/// A source built from a count closure and a page closure
pub struct FnSource<C, F> {
    count: C,
    fetch: F,
}

/// Create a source from two async closures
pub fn from_fns<C, CFut, F, FFut, T>(count: C, fetch: F) -> FnSource<C, F>
where
    C: Fn() -> CFut + Send + Sync,
    CFut: Future<Output = Result<usize>> + Send,
    F: Fn(Pagination) -> FFut + Send + Sync,
    FFut: Future<Output = Result<Vec<T>>> + Send,
    T: Send + 'static,
{
    FnSource { count, fetch }
}

#[async_trait]
impl<C, CFut, F, FFut, T> PagedSource for FnSource<C, F>
where
    C: Fn() -> CFut + Send + Sync,
    CFut: Future<Output = Result<usize>> + Send,
    F: Fn(Pagination) -> FFut + Send + Sync,
    FFut: Future<Output = Result<Vec<T>>> + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn count(&self) -> Result<usize> {
        (self.count)().await
    }

    async fn fetch_page(&self, page: Pagination) -> Result<Vec<Self::Item>> {
        (self.fetch)(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_number_source_pages() {
        let source = NumberSource::default();
        assert_eq!(source.count().await.unwrap(), 100);
        assert_eq!(
            source.fetch_page(Pagination::new(0, 10)).await.unwrap(),
            (0..10).collect::<Vec<_>>()
        );
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_number_source_injected_failures() {
        let source = NumberSource::new(50).fail_on_page(2, 10);
        let err = source
            .fetch_page(Pagination::new(10, 10))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "source error: page at offset 10 unavailable");

        let source = NumberSource::new(50).fail_on_page(3, 4).fail_on_page(0, 4);
        assert!(source.fetch_page(Pagination::new(4, 4)).await.is_ok());
        assert!(source.fetch_page(Pagination::new(0, 4)).await.is_ok());
        assert!(source.fetch_page(Pagination::new(8, 4)).await.is_err());

        let source = NumberSource::new(50).fail_count();
        assert!(matches!(source.count().await, Err(Error::Source(_))));
    }

    #[tokio::test]
    async fn test_vec_source_clips_last_page() {
        let source = VecSource::new(vec!["a", "b", "c", "d", "e"]);
        assert_eq!(source.count().await.unwrap(), 5);
        assert_eq!(
            source.fetch_page(Pagination::new(3, 3)).await.unwrap(),
            vec!["d", "e"]
        );
        assert!(source
            .fetch_page(Pagination::new(9, 3))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_fn_source() {
        let source = from_fns(
            || async { Ok::<_, Error>(4) },
            |page: Pagination| async move {
                Ok::<_, Error>(page.range().map(|i| i * 2).collect::<Vec<usize>>())
            },
        );
        assert_eq!(source.count().await.unwrap(), 4);
        assert_eq!(
            source.fetch_page(Pagination::new(2, 2)).await.unwrap(),
            vec![4, 6]
        );
    }

    #[tokio::test]
    async fn test_delayed_source_waits() {
        let source = DelayedSource::new(NumberSource::new(10), Duration::from_millis(30));
        let started = std::time::Instant::now();
        source.fetch_page(Pagination::new(0, 10)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(source.inner().fetches(), 1);
    }
}

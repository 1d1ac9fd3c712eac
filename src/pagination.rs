//! Page planning.
//!
//! A [`PagePlan`] splits `[0, total)` into consecutive, non-overlapping
//! [`Pagination`] windows of a fixed size.

use std::ops::Range;

use crate::core::{Error, Result};

/// One page window, expressed as an offset and a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pagination {
    /// Index of the first item of the page
    pub offset: usize,
    /// Number of items in the page
    pub size: usize,
}

impl Pagination {
    /// Create a page window
    pub fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// Build a window from a 1-based page number and a page size.
    ///
    /// Returns `None` for page number zero.
    pub fn from_page_number(page_number: usize, page_size: usize) -> Option<Self> {
        let index = page_number.checked_sub(1)?;
        Some(Self::new(index * page_size, page_size))
    }

    /// The 1-based page number of this window within a plan of `page_size`.
    ///
    /// A clipped final page reports the same number as its full-size slot.
    pub fn page_number(&self, page_size: usize) -> usize {
        self.offset / page_size.max(1) + 1
    }

    /// Item indices covered by this page.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// One past the last item index of this page.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// What to do with the trailing items when the total is not a multiple of
/// the page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PartialPage {
    /// Emit a short final page
    #[default]
    Include,
    /// Drop the trailing items (integer-division page count)
    Truncate,
}

/// An ordered, gap-free sequence of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pages: Vec<Pagination>,
    total: usize,
}

impl PagePlan {
    /// Pages in fetch order
    pub fn pages(&self) -> &[Pagination] {
        &self.pages
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the plan has no pages
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of items the plan will fetch.
    pub fn item_count(&self) -> usize {
        self.pages.last().map_or(0, Pagination::end)
    }

    /// Total reported by the source, which may exceed `item_count` when
    /// the plan truncates.
    pub fn source_total(&self) -> usize {
        self.total
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pagination> {
        self.pages.iter()
    }
}

impl IntoIterator for PagePlan {
    type Item = Pagination;
    type IntoIter = std::vec::IntoIter<Pagination>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter()
    }
}

impl<'a> IntoIterator for &'a PagePlan {
    type Item = &'a Pagination;
    type IntoIter = std::slice::Iter<'a, Pagination>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Split `total` items into pages of `page_size`.
///
/// Page `k` (1-based) covers `[(k - 1) * page_size, k * page_size)`. Under
/// [`PartialPage::Include`] the last page is clipped to `total`.
pub fn plan(total: usize, page_size: usize, partial: PartialPage) -> Result<PagePlan> {
    if page_size == 0 {
        return Err(Error::InvalidPageSize);
    }

    let full_pages = total / page_size;
    let remainder = total % page_size;

    let mut pages = Vec::with_capacity(full_pages + 1);
    pages.extend((0..full_pages).map(|index| Pagination::new(index * page_size, page_size)));

    if remainder > 0 && partial == PartialPage::Include {
        pages.push(Pagination::new(full_pages * page_size, remainder));
    }

    Ok(PagePlan { pages, total })
}

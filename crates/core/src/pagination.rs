//! Search + pagination state for the lecturer roster table.
//!
//! Pages are 1-indexed. Page `k` of size `p` over `n` filtered rows shows
//! rows `[(k-1)p, kp)` clipped to `n`.

use std::ops::Range;

use crate::error::CoreError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Row range for a page, clipped to `total`. Page 0 is treated as page 1.
pub fn page_range(page: usize, page_size: usize, total: usize) -> Range<usize> {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = page.saturating_mul(page_size).min(total);
    start..end
}

/// Number of pages needed for `total` rows; at least 1.
pub fn total_pages(page_size: usize, total: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// Slice of `items` shown on `page`.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    &items[page_range(page, page_size, items.len())]
}

/// Current search query and page for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    page: usize,
    query: String,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
            query: String::new(),
        }
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self, CoreError> {
        if page_size == 0 {
            return Err(CoreError::Validation(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            page_size,
            ..Default::default()
        })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the search query. Any change sends the table back to page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn range(&self, total: usize) -> Range<usize> {
        page_range(self.page, self.page_size, total)
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total_pages(self.page_size, total)
    }
}

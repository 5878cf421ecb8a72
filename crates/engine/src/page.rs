//! Pagination: window the processed row list.
//!
//! Two modes: a fixed page size with 1-based page navigation, and
//! "load all" where the page is the whole processed list (nested grids
//! and small fixed result sets). View changes upstream (filter, sort,
//! grouping) re-clamp the current page when it falls out of range; they
//! never touch the selection set.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageSize {
    Fixed(usize),
    All,
}

impl PageSize {
    fn per_page(&self, total: usize) -> usize {
        match self {
            // A zero page size would loop forever upstream; treat as 1
            PageSize::Fixed(n) => (*n).max(1),
            PageSize::All => total.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page_size: PageSize,
    /// 1-based.
    pub current_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: PageSize::Fixed(10),
            current_page: 1,
        }
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: PageSize::Fixed(page_size),
            current_page: 1,
        }
    }

    /// Load-all mode: one page holding everything.
    pub fn all() -> Self {
        Self {
            page_size: PageSize::All,
            current_page: 1,
        }
    }

    /// Number of pages for `total` items. At least 1, even when empty.
    pub fn page_count(&self, total: usize) -> usize {
        let per_page = self.page_size.per_page(total);
        total.div_ceil(per_page).max(1)
    }

    /// Clamp `current_page` into `[1, page_count]`. Called after any
    /// upstream change that can shrink the list.
    pub fn clamp(&mut self, total: usize) {
        self.current_page = self.current_page.clamp(1, self.page_count(total));
    }

    /// Navigate to `page`, clamped into range.
    pub fn set_page(&mut self, page: usize, total: usize) {
        self.current_page = page;
        self.clamp(total);
    }

    /// Change the page size and return to the first page.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    /// The current page's window of `items`.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let per_page = self.page_size.per_page(items.len());
        let page = self.current_page.clamp(1, self.page_count(items.len()));
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(items.len());
        if start >= items.len() {
            return &[];
        }
        &items[start..end]
    }
}

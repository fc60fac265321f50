//! # Pagination
//! 1-based page slicing with the metadata the query surface reports.

use serde::Serialize;

use crate::item::NewsItem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T = NewsItem> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `items` to `page` (1-based). A page outside `1..=total_pages` yields no
/// items but still reports correct totals. `page_size` 0 is treated as 1.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> PageResult<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);

    let slice = if page == 0 {
        &[][..]
    } else {
        let start = (page - 1).saturating_mul(page_size).min(total);
        let end = page.saturating_mul(page_size).min(total);
        &items[start..end]
    };

    PageResult {
        items: slice.to_vec(),
        total,
        page,
        page_size,
        total_pages,
        has_next: page.saturating_mul(page_size) < total,
        has_prev: page > 1,
    }
}

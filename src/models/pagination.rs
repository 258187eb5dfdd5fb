//! Pagination types shared by every listing

use serde::{Deserialize, Serialize};

/// Largest page size a listing will serve
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Whether this page exists for `total` items.
    ///
    /// Page 1 always exists, even when there is nothing to list.
    pub fn is_in_range(&self, total: i64) -> bool {
        self.page == 1 || self.offset() < total
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Total number of pages; an empty listing still has one page
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 1;
        }
        let total = u64::try_from(self.total).unwrap_or(0);
        let pages = total.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 0);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 1);

        let params = ListParams::new(3, 10);
        assert_eq!(params.offset(), 20);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_first_page_of_empty_listing_is_in_range() {
        assert!(ListParams::new(1, 10).is_in_range(0));
        assert!(!ListParams::new(2, 10).is_in_range(0));
    }

    #[test]
    fn test_page_boundaries() {
        assert!(ListParams::new(2, 10).is_in_range(11));
        assert!(!ListParams::new(2, 10).is_in_range(10));
    }

    #[test]
    fn test_total_pages() {
        let result: PagedResult<()> = PagedResult::new(vec![], 0, &ListParams::new(1, 10));
        assert_eq!(result.total_pages(), 1);
        assert!(!result.has_next());
        assert!(!result.has_prev());

        let result: PagedResult<()> = PagedResult::new(vec![], 21, &ListParams::new(2, 10));
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(result.has_prev());
    }

    proptest! {
        #[test]
        fn prop_in_range_pages_are_within_total_pages(
            total in 0i64..1_000,
            per_page in 1u32..50,
            page in 1u32..200,
        ) {
            let params = ListParams::new(page, per_page);
            let result: PagedResult<()> = PagedResult::new(vec![], total, &params);
            prop_assert_eq!(params.is_in_range(total), page <= result.total_pages());
        }
    }
}

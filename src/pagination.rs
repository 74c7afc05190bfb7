//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest number of items a single page may hold.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A page number and page size that have been checked against a [PaginationConfig].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub page: u64,
    /// The number of items per page.
    pub limit: u64,
}

impl Page {
    /// Normalise the requested page and limit.
    ///
    /// A missing or zero page falls back to the default page, a missing or
    /// zero limit falls back to the default page size, and a limit above the
    /// maximum page size is clamped to it.
    pub fn new(page: Option<i64>, limit: Option<i64>, config: &PaginationConfig) -> Self {
        let page = match page {
            Some(page) if page >= 1 => page as u64,
            _ => config.default_page,
        };

        let limit = match limit {
            Some(limit) if limit >= 1 => (limit as u64).min(config.max_page_size),
            _ => config.default_page_size,
        };

        Self { page, limit }
    }

    /// The number of items to skip to reach this page, or `None` if it does
    /// not fit in an SQLite integer.
    pub fn offset(&self) -> Option<i64> {
        (self.page - 1)
            .checked_mul(self.limit)
            .and_then(|offset| i64::try_from(offset).ok())
    }

    /// The number of pages needed to hold `total` items.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::{Page, PaginationConfig};

    #[test]
    fn missing_values_use_defaults() {
        let page = Page::new(None, None, &PaginationConfig::default());

        assert_eq!(page, Page { page: 1, limit: 20 });
        assert_eq!(page.offset(), Some(0));
    }

    #[test]
    fn out_of_range_values_are_normalised() {
        let config = PaginationConfig::default();

        assert_eq!(Page::new(Some(0), Some(0), &config), Page { page: 1, limit: 20 });
        assert_eq!(Page::new(Some(-3), Some(-1), &config), Page { page: 1, limit: 20 });
        assert_eq!(Page::new(Some(2), Some(500), &config), Page { page: 2, limit: 100 });
    }

    #[test]
    fn offset_skips_previous_pages() {
        let page = Page::new(Some(3), Some(10), &PaginationConfig::default());

        assert_eq!(page.offset(), Some(20));
    }

    #[test]
    fn huge_page_has_no_offset() {
        let config = PaginationConfig::default();

        let overflows = Page::new(Some(i64::MAX), Some(100), &config);
        let past_sqlite_range = Page::new(Some(100_000_000_000_000_000), Some(100), &config);

        assert_eq!(overflows.offset(), None);
        assert_eq!(past_sqlite_range.offset(), None);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(Some(1), Some(10), &PaginationConfig::default());

        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);
        assert_eq!(page.total_pages(25), 3);
    }
}

//! Paginated response envelope.

use serde::Serialize;

use crate::request::PageRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    /// The requested (clamped) limit, even when the last page is short.
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: &PageRequest, total_count: u64) -> Self {
        Self {
            current_page: page.page(),
            page_size: page.limit(),
            total_count,
            total_pages: total_pages(total_count, page.limit()),
        }
    }
}

/// `ceil(total_count / page_size)`; zero when `page_size` is zero.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partial_last_page_rounds_up() {
        assert_eq!(total_pages(101, 25), 5);
        assert_eq!(total_pages(100, 25), 4);
        assert_eq!(total_pages(0, 25), 0);
        assert_eq!(total_pages(1, 1000), 1);
    }

    #[test]
    fn meta_reports_requested_limit() {
        let meta = PaginationMeta::new(&PageRequest::new(5, 25), 101);
        assert_eq!(
            meta,
            PaginationMeta { current_page: 5, page_size: 25, total_count: 101, total_pages: 5 }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: total_pages is the smallest page count that covers every row.
        #[test]
        fn total_pages_is_ceiling_division(total in 0u64..10_000_000, size in 1u32..=1000) {
            let pages = total_pages(total, size);
            prop_assert!(pages * u64::from(size) >= total);
            if pages > 0 {
                prop_assert!((pages - 1) * u64::from(size) < total);
            }
        }
    }
}

use serde::{Deserialize, Serialize};

/// Page size requested by a caller.
///
/// `All` is the "no pagination" sentinel: the whole result set comes back as
/// a single page. Serialized as `-1` on the wire, matching the convention the
/// consuming layer already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum PageSize {
    All,
    Limit(u64),
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::All
    }
}

impl From<i64> for PageSize {
    fn from(value: i64) -> Self {
        if value < 1 {
            PageSize::All
        } else {
            PageSize::Limit(value as u64)
        }
    }
}

impl From<PageSize> for i64 {
    fn from(value: PageSize) -> Self {
        match value {
            PageSize::All => -1,
            PageSize::Limit(n) => n as i64,
        }
    }
}

/// One page of a search-and-paginate result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub values: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub page_size: PageSize,
}

impl<T> PageResult<T> {
    /// A page over an empty result set. `pages` is still 1: an empty listing
    /// is one empty page, never zero pages.
    pub fn empty(page_size: PageSize) -> Self {
        Self {
            values: Vec::new(),
            total: 0,
            page: 1,
            pages: 1,
            page_size,
        }
    }
}

/// Computes the pagination window for a filtered result set.
///
/// Returns `(pages, page, window)` where `window` is `Some((offset, limit))`
/// when a window applies and `None` for [`PageSize::All`].
///
/// `pages == ceil(total / size)` floored at 1, and the requested `page` is
/// clamped into `[1, pages]`. Page numbers are 1-based; a `page` of 0 is
/// treated as 1, and a `Limit(0)` as `Limit(1)` (the i64 conversion already
/// normalizes non-positive sizes to `All`, so the floor only matters for
/// directly constructed limits).
pub fn page_window(total: u64, page: u64, size: PageSize) -> (u64, u64, Option<(u64, u64)>) {
    match size {
        PageSize::All => (1, 1, None),
        PageSize::Limit(limit) => {
            let limit = limit.max(1);
            let pages = total.div_ceil(limit).max(1);
            let page = page.clamp(1, pages);
            let offset = (page - 1) * limit;
            (pages, page, Some((offset, limit)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_is_ceiling_of_total_over_size() {
        let (pages, _, _) = page_window(10, 1, PageSize::Limit(3));
        assert_eq!(pages, 4);

        let (pages, _, _) = page_window(9, 1, PageSize::Limit(3));
        assert_eq!(pages, 3);

        let (pages, _, _) = page_window(1, 1, PageSize::Limit(3));
        assert_eq!(pages, 1);
    }

    #[test]
    fn test_empty_result_still_has_one_page() {
        let (pages, page, window) = page_window(0, 5, PageSize::Limit(10));
        assert_eq!(pages, 1);
        assert_eq!(page, 1);
        assert_eq!(window, Some((0, 10)));
    }

    #[test]
    fn test_page_clamped_into_valid_range() {
        // Past the end -> last page
        let (pages, page, window) = page_window(25, 99, PageSize::Limit(10));
        assert_eq!(pages, 3);
        assert_eq!(page, 3);
        assert_eq!(window, Some((20, 10)));

        // Zero and below -> first page
        let (_, page, window) = page_window(25, 0, PageSize::Limit(10));
        assert_eq!(page, 1);
        assert_eq!(window, Some((0, 10)));
    }

    #[test]
    fn test_zero_limit_is_floored_to_one() {
        let (pages, page, window) = page_window(3, 2, PageSize::Limit(0));
        assert_eq!(pages, 3);
        assert_eq!(page, 2);
        assert_eq!(window, Some((1, 1)));
    }

    #[test]
    fn test_all_sentinel_returns_single_unbounded_page() {
        let (pages, page, window) = page_window(1234, 7, PageSize::All);
        assert_eq!(pages, 1);
        assert_eq!(page, 1);
        assert_eq!(window, None);
    }

    #[test]
    fn test_offset_advances_by_limit() {
        for page in 1..=4 {
            let (_, clamped, window) = page_window(40, page, PageSize::Limit(10));
            assert_eq!(clamped, page);
            assert_eq!(window, Some(((page - 1) * 10, 10)));
        }
    }

    #[test]
    fn test_page_size_serde_sentinel() {
        assert_eq!(PageSize::from(-1), PageSize::All);
        assert_eq!(PageSize::from(0), PageSize::All);
        assert_eq!(PageSize::from(20), PageSize::Limit(20));
        assert_eq!(i64::from(PageSize::All), -1);
        assert_eq!(i64::from(PageSize::Limit(20)), 20);
    }
}

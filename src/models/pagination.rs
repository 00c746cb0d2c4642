//! Pagination types shared by every list query

use serde::{Deserialize, Deserializer, Serialize};

/// Pagination parameters for list queries
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
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    /// Clamp the page into the range that actually holds results.
    ///
    /// Out-of-range pages resolve to the last page, and page 1 when there
    /// are no results at all.
    pub fn clamp_to(&self, total: i64) -> Self {
        let pages = total_pages(total, self.per_page).max(1);
        Self {
            page: self.page.min(pages),
            per_page: self.per_page,
        }
    }
}

fn total_pages(total: i64, per_page: u32) -> u32 {
    if per_page == 0 || total <= 0 {
        return 0;
    }
    ((total as u64 + per_page as u64 - 1) / per_page as u64) as u32
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
    /// Number of pages
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages: total_pages(total, params.per_page),
        }
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Transform every item, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
            total_pages: 0,
        }
    }
}

/// `page` as it arrives in a query string or JSON body
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPage {
    Number(i64),
    Text(String),
}

/// Deserialize a page number, treating anything unparsable (`?page=abc`,
/// `?page=`) as absent so listings fall back to the first page.
pub fn deserialize_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPage>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawPage::Number(n) => u32::try_from(n).ok(),
        RawPage::Text(text) => text.trim().parse().ok(),
    }))
}

/// Like [`deserialize_page`], defaulting to page 1
pub fn deserialize_page_or_first<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_page(deserializer)?.unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_list_params_bounds() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);

        let params = ListParams::new(3, 12);
        assert_eq!(params.offset(), 24);
        assert_eq!(params.limit(), 12);
    }

    #[test]
    fn test_clamp_to_last_page() {
        let params = ListParams::new(9, 10);
        assert_eq!(params.clamp_to(25).page, 3);
        assert_eq!(params.clamp_to(0).page, 1);
        assert_eq!(ListParams::new(2, 10).clamp_to(25).page, 2);
    }

    #[test]
    fn test_paged_result_navigation() {
        let params = ListParams::new(2, 10);
        let result = PagedResult::new(vec![1, 2, 3], 23, &params);
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next());
        assert!(result.has_prev());

        let doubled = result.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
        assert_eq!(doubled.total, 23);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_total(total in 0i64..10_000, per_page in 1u32..=100) {
            let params = ListParams::new(1, per_page);
            let result: PagedResult<()> = PagedResult::new(Vec::new(), total, &params);
            let capacity = result.total_pages as i64 * per_page as i64;
            prop_assert!(capacity >= total);
            prop_assert!(capacity - total < per_page as i64);
        }

        #[test]
        fn prop_clamped_page_in_range(page in 1u32..1000, total in 0i64..5000, per_page in 1u32..=100) {
            let params = ListParams::new(page, per_page).clamp_to(total);
            prop_assert!(params.page >= 1);
            prop_assert!(params.offset() <= total.max(0));
        }
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Listing {
        #[serde(deserialize_with = "deserialize_page")]
        page: Option<u32>,
    }

    #[test]
    fn test_lenient_page() {
        let page = |json: &str| serde_json::from_str::<Listing>(json).unwrap().page;
        assert_eq!(page(r#"{"page": 3}"#), Some(3));
        assert_eq!(page(r#"{"page": "4"}"#), Some(4));
        assert_eq!(page(r#"{"page": "abc"}"#), None);
        assert_eq!(page(r#"{"page": ""}"#), None);
        assert_eq!(page(r#"{"page": -2}"#), None);
        assert_eq!(page(r#"{"page": null}"#), None);
        assert_eq!(page("{}"), None);
    }
}

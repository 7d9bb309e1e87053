//! Page-based listing over any [`PagedStore`]
//!
//! A page is fetched with one extra row of look-ahead: if the store returns
//! more than `limit` rows there is a next page, and the extra row is dropped.
//! No `COUNT(*)` query is issued.

use serde::Serialize;

use super::error::DomainError;
use crate::db::repositories::PagedStore;
use crate::models::{FetchWindow, SortOption};

/// Largest page a caller may ask for
pub const MAX_PAGE_SIZE: i64 = 50;

/// Page size used when none is given
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A validated page request: `page >= 1`, `1 <= limit <= MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Clamp raw values into range
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// The store window: this page plus one look-ahead row
    pub fn window(&self) -> FetchWindow {
        FetchWindow {
            offset: self.offset(),
            limit: self.limit + 1,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// Build a page from a look-ahead fetch of up to `limit + 1` rows
    pub fn from_lookahead(mut rows: Vec<T>, limit: i64) -> Self {
        let limit = usize::try_from(limit).unwrap_or(0);
        let has_next_page = rows.len() > limit;
        rows.truncate(limit);
        Self {
            data: rows,
            has_next_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            has_next_page: self.has_next_page,
        }
    }
}

/// Fetch one page from a store
pub async fn fetch_page<S>(
    store: &S,
    filter: &S::Filter,
    sort: &[SortOption<S::Sort>],
    request: PageRequest,
) -> Result<Page<S::Item>, DomainError>
where
    S: PagedStore + ?Sized,
{
    let rows = store
        .find_many_with_pagination(filter, sort, request.window())
        .await?;

    Ok(Page::from_lookahead(rows, request.limit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagSortField;
    use async_trait::async_trait;
    use proptest::prelude::*;

    /// In-memory store over `0..total`
    struct Numbers {
        total: i64,
    }

    #[async_trait]
    impl PagedStore for Numbers {
        type Item = i64;
        type Filter = ();
        type Sort = TagSortField;

        async fn find_many_with_pagination(
            &self,
            _filter: &(),
            _sort: &[SortOption<TagSortField>],
            window: FetchWindow,
        ) -> anyhow::Result<Vec<i64>> {
            let end = (window.offset + window.limit).min(self.total);
            Ok((window.offset.min(end)..end).collect())
        }
    }

    #[test]
    fn test_request_clamps() {
        let req = PageRequest::new(0, 500);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), MAX_PAGE_SIZE);

        let req = PageRequest::new(-3, 0);
        assert_eq!((req.page(), req.limit()), (1, 1));
    }

    #[test]
    fn test_window_has_one_row_of_lookahead() {
        let req = PageRequest::new(3, 10);
        assert_eq!(req.window(), FetchWindow { offset: 20, limit: 11 });
    }

    #[test]
    fn test_offset_saturates() {
        let req = PageRequest::new(i64::MAX, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), i64::MAX);
    }

    #[tokio::test]
    async fn test_eleven_rows_limit_ten() {
        let store = Numbers { total: 11 };

        let first = fetch_page(&store, &(), &[], PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(first.data.len(), 10);
        assert!(first.has_next_page);

        let second = fetch_page(&store, &(), &[], PageRequest::new(2, 10)).await.unwrap();
        assert_eq!(second.data, vec![10]);
        assert!(!second.has_next_page);
    }

    #[tokio::test]
    async fn test_exact_fit_has_no_next_page() {
        let store = Numbers { total: 10 };
        let page = fetch_page(&store, &(), &[], PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.data.len(), 10);
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(Page {
            data: vec![1],
            has_next_page: true,
        })
        .unwrap();
        assert_eq!(json["hasNextPage"], true);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_pages_cover_every_row_once(total in 0i64..120, limit in 1i64..=MAX_PAGE_SIZE) {
            let store = Numbers { total };
            let mut seen = Vec::new();
            let mut page_no = 1;
            loop {
                let page = tokio_test::block_on(
                    fetch_page(&store, &(), &[], PageRequest::new(page_no, limit)),
                ).unwrap();
                prop_assert!(page.data.len() as i64 <= limit);
                seen.extend(page.data);
                if !page.has_next_page {
                    break;
                }
                page_no += 1;
            }
            prop_assert_eq!(seen, (0..total).collect::<Vec<_>>());
        }
    }
}

//! Common API utilities and shared types
//!
//! This module contains shared utilities used across the list endpoints.

use crate::models::{SortDirection, SortField, SortOption};
use crate::services::{PageRequest, MAX_PAGE_SIZE};

use super::error::ApiError;

// ============================================================================
// Pagination
// ============================================================================

/// Build the page request for a list endpoint.
///
/// A missing `limit` uses the configured default; anything above
/// `MAX_PAGE_SIZE` is cut down before it reaches the pagination engine.
pub fn page_request(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> PageRequest {
    let limit = limit.unwrap_or(default_limit).min(MAX_PAGE_SIZE);
    PageRequest::new(page.unwrap_or(1), limit)
}

// ============================================================================
// Sorting
// ============================================================================

/// Parse `field:dir,field:dir,...` into an ordered list of sort options.
///
/// Direction defaults to `asc`. Empty entries are skipped; unknown fields or
/// directions are a `BAD_REQUEST`.
pub fn parse_sort<F: SortField>(raw: Option<&str>) -> Result<Vec<SortOption<F>>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut sort = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, direction) = match entry.split_once(':') {
            Some((name, dir)) => (name.trim(), dir.trim()),
            None => (entry, "asc"),
        };

        let field = F::parse(name)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown sort field: {}", name)))?;
        let direction = direction
            .parse::<SortDirection>()
            .map_err(ApiError::bad_request)?;

        sort.push(SortOption { field, direction });
    }

    Ok(sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostSortField;

    #[test]
    fn test_page_request_defaults_and_caps() {
        let req = page_request(None, None, 10);
        assert_eq!((req.page(), req.limit()), (1, 10));

        let req = page_request(Some(3), Some(500), 10);
        assert_eq!((req.page(), req.limit()), (3, MAX_PAGE_SIZE));

        let req = page_request(Some(0), Some(-5), 10);
        assert_eq!((req.page(), req.limit()), (1, 1));
    }

    #[test]
    fn test_parse_sort_keeps_priority_order() {
        let sort: Vec<SortOption<PostSortField>> =
            parse_sort(Some("publishedAt:desc, title")).unwrap();

        assert_eq!(
            sort,
            vec![
                SortOption::desc(PostSortField::PublishedAt),
                SortOption::asc(PostSortField::Title),
            ]
        );
    }

    #[test]
    fn test_parse_sort_rejects_unknown_input() {
        assert!(parse_sort::<PostSortField>(Some("password:asc")).is_err());
        assert!(parse_sort::<PostSortField>(Some("title:up")).is_err());
        assert!(parse_sort::<PostSortField>(Some("title; DROP TABLE posts")).is_err());
    }

    #[test]
    fn test_parse_sort_empty() {
        assert!(parse_sort::<PostSortField>(None).unwrap().is_empty());
        assert!(parse_sort::<PostSortField>(Some(" , ")).unwrap().is_empty());
    }
}

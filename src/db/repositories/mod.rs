//! Database repositories
//!
//! One repository trait per entity plus its SQLite implementation. Every read
//! excludes soft-deleted rows; there is no way to ask for them.

pub mod category;
pub mod post;
pub mod tag;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use tag::{CounterUpdate, SqlxTagRepository, TagRepository, TagSlugTaken};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::{FetchWindow, SortField, SortOption};

/// A store that can serve one window of a filtered, sorted listing
#[async_trait]
pub trait PagedStore: Send + Sync {
    type Item: Send;
    type Filter: Send + Sync;
    type Sort: SortField;

    /// Fetch the rows of `window` matching `filter`, ordered by `sort`.
    ///
    /// An empty `sort` falls back to the store's default order. The primary
    /// key is always the final tie-break so identical inputs yield identical
    /// pages.
    async fn find_many_with_pagination(
        &self,
        filter: &Self::Filter,
        sort: &[SortOption<Self::Sort>],
        window: FetchWindow,
    ) -> Result<Vec<Self::Item>>;
}

/// Start a `SELECT` over the live rows of `table`
pub(crate) fn select_live<'a>(columns: &str, table: &str) -> QueryBuilder<'a, Sqlite> {
    QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE deleted_at IS NULL",
        columns, table
    ))
}

/// Append `AND <column> LIKE '%needle%'` with wildcards in the needle escaped
pub(crate) fn push_contains(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, needle: &str) {
    qb.push(" AND ")
        .push(column)
        .push(" LIKE ")
        .push_bind(crate::models::like_pattern(needle))
        .push(" ESCAPE '\\'");
}

pub(crate) fn push_order_by<F: SortField>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    sort: &[SortOption<F>],
    default: &[SortOption<F>],
) {
    let sort = if sort.is_empty() { default } else { sort };

    qb.push(" ORDER BY ");
    let mut has_id = false;
    for (i, opt) in sort.iter().enumerate() {
        let column = opt.field.column();
        has_id |= column == "id";
        if i > 0 {
            qb.push(", ");
        }
        qb.push(column).push(" ").push(opt.direction.as_sql());
    }
    if !has_id {
        if !sort.is_empty() {
            qb.push(", ");
        }
        qb.push("id ASC");
    }
}

pub(crate) fn push_window(qb: &mut QueryBuilder<'_, Sqlite>, window: FetchWindow) {
    qb.push(" LIMIT ")
        .push_bind(window.limit)
        .push(" OFFSET ")
        .push_bind(window.offset);
}

//! Tag repository
//!
//! Database operations for tags and the post/tag association.
//!
//! `usage_count` is only changed by server-side `usage_count ± 1` statements.
//! Association writes and the matching counter changes run in one
//! transaction, and only live posts (not deleted, active) are counted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

use super::{push_contains, push_order_by, push_window, select_live, PagedStore};
use crate::db::Database;
use crate::models::{
    FetchWindow, SortOption, Tag, TagFilter, TagRecord, TagSetChange, TagSortField,
};

const TAG_COLUMNS: &str =
    "id, name, slug, description, color, is_active, usage_count, created_at, updated_at, deleted_at";

/// Outcome of an atomic decrement
#[derive(Debug, Clone, PartialEq)]
pub enum CounterUpdate {
    /// The counter was decremented
    Applied(Tag),
    /// The counter was already zero and was left untouched
    AtZero(Tag),
    /// No live tag with that id
    Missing,
}

/// A tag insert found its slug held by a live tag with a different name
#[derive(Debug, thiserror::Error)]
#[error("Tag slug already taken: {slug}")]
pub struct TagSlugTaken {
    pub slug: String,
}

/// Tag repository trait
#[async_trait]
pub trait TagRepository:
    PagedStore<Item = Tag, Filter = TagFilter, Sort = TagSortField>
{
    async fn create(&self, tag: &TagRecord) -> Result<Tag>;

    /// Insert several tags in one transaction, in order.
    ///
    /// A slug already held by a live tag of the same name yields that tag;
    /// held under another name the whole batch fails with [`TagSlugTaken`].
    async fn create_many(&self, tags: &[TagRecord]) -> Result<Vec<Tag>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Live tags among `ids`; unknown or deleted ids are skipped
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>>;

    /// Live tags whose name exactly matches one of `names`
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Overwrite the editable columns. `None` when the tag is gone.
    async fn update(&self, id: i64, tag: &TagRecord) -> Result<Option<Tag>>;

    /// Soft delete. Returns false when there was no live tag to delete.
    async fn remove(&self, id: i64) -> Result<bool>;

    async fn increment_usage_count(&self, id: i64) -> Result<Option<Tag>>;

    async fn decrement_usage_count(&self, id: i64) -> Result<CounterUpdate>;

    /// Link tags to a post. Returns the ids that were newly linked.
    async fn attach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>>;

    /// Unlink tags from a post. Returns the ids that were actually linked.
    async fn detach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>>;

    /// Make the post's tag set exactly `tag_ids` (live tags only)
    async fn replace(&self, post_id: i64, tag_ids: &[i64]) -> Result<TagSetChange>;

    /// Live tags linked to a post, ordered by name
    async fn find_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>>;
}

/// SQLite tag repository
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl PagedStore for SqlxTagRepository {
    type Item = Tag;
    type Filter = TagFilter;
    type Sort = TagSortField;

    async fn find_many_with_pagination(
        &self,
        filter: &TagFilter,
        sort: &[SortOption<TagSortField>],
        window: FetchWindow,
    ) -> Result<Vec<Tag>> {
        let mut qb = select_live(TAG_COLUMNS, "tags");
        if let Some(name) = &filter.name {
            push_contains(&mut qb, "name", name);
        }
        if let Some(slug) = &filter.slug {
            qb.push(" AND slug = ").push_bind(slug.clone());
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        push_order_by(&mut qb, sort, &[SortOption::asc(TagSortField::Name)]);
        push_window(&mut qb, window);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tags")?;

        rows.iter().map(row_to_tag).collect()
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &TagRecord) -> Result<Tag> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO tags (name, slug, description, color, is_active, usage_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING {}
            "#,
            TAG_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(&tag.description)
            .bind(&tag.color)
            .bind(tag.is_active)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .context("Failed to create tag")?;

        row_to_tag(&row)
    }

    async fn create_many(&self, tags: &[TagRecord]) -> Result<Vec<Tag>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let created = insert_tags(&mut tx, tags).await?;
        tx.commit().await.context("Failed to commit tag batch")?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let sql = format!(
            "SELECT {} FROM tags WHERE id = ? AND deleted_at IS NULL",
            TAG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by ID")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let sql = format!(
            "SELECT {} FROM tags WHERE slug = ? AND deleted_at IS NULL",
            TAG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get tag by slug")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = select_live(TAG_COLUMNS, "tags");
        qb.push(" AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to get tags by IDs")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = select_live(TAG_COLUMNS, "tags");
        qb.push(" AND name IN (");
        let mut separated = qb.separated(", ");
        for name in names {
            separated.push_bind(name.clone());
        }
        separated.push_unseparated(") ORDER BY id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to get tags by names")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn update(&self, id: i64, tag: &TagRecord) -> Result<Option<Tag>> {
        let sql = format!(
            r#"
            UPDATE tags
            SET name = ?, slug = ?, description = ?, color = ?, is_active = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            RETURNING {}
            "#,
            TAG_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(&tag.description)
            .bind(&tag.color)
            .bind(tag.is_active)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update tag")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE tags SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete tag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_usage_count(&self, id: i64) -> Result<Option<Tag>> {
        let sql = format!(
            r#"
            UPDATE tags SET usage_count = usage_count + 1
            WHERE id = ? AND deleted_at IS NULL
            RETURNING {}
            "#,
            TAG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to increment tag usage count")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn decrement_usage_count(&self, id: i64) -> Result<CounterUpdate> {
        let sql = format!(
            r#"
            UPDATE tags SET usage_count = usage_count - 1
            WHERE id = ? AND deleted_at IS NULL AND usage_count > 0
            RETURNING {}
            "#,
            TAG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to decrement tag usage count")?;

        if let Some(row) = row {
            return Ok(CounterUpdate::Applied(row_to_tag(&row)?));
        }

        Ok(match self.find_by_id(id).await? {
            Some(tag) => CounterUpdate::AtZero(tag),
            None => CounterUpdate::Missing,
        })
    }

    async fn attach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let live = post_is_live(&mut tx, post_id).await?;
        let linked = link_tags(&mut tx, post_id, tag_ids, live).await?;

        tx.commit().await.context("Failed to commit tag attach")?;
        Ok(linked)
    }

    async fn detach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let live = post_is_live(&mut tx, post_id).await?;
        let unlinked = unlink_tags(&mut tx, post_id, tag_ids, live).await?;

        tx.commit().await.context("Failed to commit tag detach")?;
        Ok(unlinked)
    }

    async fn replace(&self, post_id: i64, tag_ids: &[i64]) -> Result<TagSetChange> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let live = post_is_live(&mut tx, post_id).await?;
        let change = replace_tags(&mut tx, post_id, tag_ids, live).await?;

        tx.commit().await.context("Failed to commit tag replace")?;
        Ok(change)
    }

    async fn find_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tags
            WHERE deleted_at IS NULL
              AND id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
            ORDER BY name ASC, id ASC
            "#,
            TAG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to get tags by post ID")?;

        rows.iter().map(row_to_tag).collect()
    }
}

// ============================================================================
// Association helpers shared with the post repository
// ============================================================================

/// Whether the post counts towards tag usage
pub(crate) async fn post_is_live(conn: &mut SqliteConnection, post_id: i64) -> Result<bool> {
    let live: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM posts WHERE id = ? AND deleted_at IS NULL AND is_active = 1",
    )
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to check post state")?;

    Ok(live.is_some())
}

/// Insert tags inside the caller's transaction.
///
/// The partial unique index on live slugs is the arbiter: a conflicting row
/// is skipped, then resolved against the live holder of the slug.
pub(crate) async fn insert_tags(
    conn: &mut SqliteConnection,
    tags: &[TagRecord],
) -> Result<Vec<Tag>> {
    let now = Utc::now();
    let insert = format!(
        r#"
        INSERT INTO tags (name, slug, description, color, is_active, usage_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        ON CONFLICT DO NOTHING
        RETURNING {}
        "#,
        TAG_COLUMNS
    );
    let holder = format!(
        "SELECT {} FROM tags WHERE slug = ? AND deleted_at IS NULL",
        TAG_COLUMNS
    );

    let mut created = Vec::with_capacity(tags.len());
    for tag in tags {
        let row = sqlx::query(&insert)
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(&tag.description)
            .bind(&tag.color)
            .bind(tag.is_active)
            .bind(now)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to create tag")?;

        if let Some(row) = row {
            created.push(row_to_tag(&row)?);
            continue;
        }

        let row = sqlx::query(&holder)
            .bind(&tag.slug)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to get tag by slug")?;

        match row.as_ref().map(row_to_tag).transpose()? {
            Some(existing) if existing.name == tag.name => {
                tracing::debug!(
                    tag_id = existing.id,
                    slug = %tag.slug,
                    "Tag created concurrently, reusing"
                );
                created.push(existing);
            }
            _ => {
                return Err(TagSlugTaken {
                    slug: tag.slug.clone(),
                }
                .into())
            }
        }
    }

    Ok(created)
}

/// Make the post's tag set exactly `tag_ids` inside the caller's transaction
pub(crate) async fn replace_tags(
    conn: &mut SqliteConnection,
    post_id: i64,
    tag_ids: &[i64],
    live: bool,
) -> Result<TagSetChange> {
    let current: Vec<i64> =
        sqlx::query_scalar("SELECT tag_id FROM post_tags WHERE post_id = ? ORDER BY tag_id")
            .bind(post_id)
            .fetch_all(&mut *conn)
            .await
            .context("Failed to read post tags")?;

    let stale: Vec<i64> = current
        .iter()
        .copied()
        .filter(|id| !tag_ids.contains(id))
        .collect();
    let fresh: Vec<i64> = tag_ids
        .iter()
        .copied()
        .filter(|id| !current.contains(id))
        .collect();

    let removed = unlink_tags(conn, post_id, &stale, live).await?;
    let added = link_tags(conn, post_id, &fresh, live).await?;
    Ok(TagSetChange { added, removed })
}

pub(crate) async fn link_tags(
    conn: &mut SqliteConnection,
    post_id: i64,
    tag_ids: &[i64],
    live: bool,
) -> Result<Vec<i64>> {
    let mut linked = Vec::new();

    for &tag_id in tag_ids {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO post_tags (post_id, tag_id)
            SELECT ?, id FROM tags WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await
        .context("Failed to link tag to post")?;

        if result.rows_affected() == 0 {
            continue;
        }

        if live {
            sqlx::query("UPDATE tags SET usage_count = usage_count + 1 WHERE id = ?")
                .bind(tag_id)
                .execute(&mut *conn)
                .await
                .context("Failed to increment tag usage count")?;
        }
        linked.push(tag_id);
    }

    Ok(linked)
}

async fn unlink_tags(
    conn: &mut SqliteConnection,
    post_id: i64,
    tag_ids: &[i64],
    live: bool,
) -> Result<Vec<i64>> {
    let mut unlinked = Vec::new();

    for &tag_id in tag_ids {
        let result = sqlx::query("DELETE FROM post_tags WHERE post_id = ? AND tag_id = ?")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .context("Failed to unlink tag from post")?;

        if result.rows_affected() == 0 {
            continue;
        }

        if live {
            let released = sqlx::query(
                "UPDATE tags SET usage_count = usage_count - 1 WHERE id = ? AND usage_count > 0",
            )
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .context("Failed to decrement tag usage count")?;

            if released.rows_affected() == 0 {
                tracing::error!(
                    tag_id,
                    post_id,
                    "Tag usage count already zero while unlinking a live post"
                );
            }
        }
        unlinked.push(tag_id);
    }

    Ok(unlinked)
}

/// Count the post towards every tag it links (post became live)
pub(crate) async fn acquire_usage_for_post(conn: &mut SqliteConnection, post_id: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE tags SET usage_count = usage_count + 1
        WHERE id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
        "#,
    )
    .bind(post_id)
    .execute(&mut *conn)
    .await
    .context("Failed to increment usage counts for post")?;

    Ok(result.rows_affected())
}

/// Stop counting the post towards its tags (post deleted or deactivated)
pub(crate) async fn release_usage_for_post(conn: &mut SqliteConnection, post_id: i64) -> Result<u64> {
    let floored: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM tags
        WHERE usage_count = 0
          AND id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
        "#,
    )
    .bind(post_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to inspect usage counts for post")?;

    if floored > 0 {
        tracing::error!(
            post_id,
            floored,
            "Tag usage counts already zero while releasing a live post"
        );
    }

    let result = sqlx::query(
        r#"
        UPDATE tags SET usage_count = usage_count - 1
        WHERE usage_count > 0
          AND id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
        "#,
    )
    .bind(post_id)
    .execute(&mut *conn)
    .await
    .context("Failed to decrement usage counts for post")?;

    Ok(result.rows_affected())
}

fn row_to_tag(row: &SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        color: row.try_get("color")?,
        is_active: row.try_get("is_active")?,
        usage_count: row.try_get("usage_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

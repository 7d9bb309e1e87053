//! Post repository
//!
//! Database operations for posts.
//!
//! A post's live state (not deleted, `is_active`) decides whether it counts
//! towards its tags' usage counters, so every write that can change it also
//! shifts those counters inside the same transaction. Tags created for a post
//! and the post's links are written in that transaction too.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

use super::tag::{
    acquire_usage_for_post, insert_tags, link_tags, post_is_live, release_usage_for_post,
    replace_tags,
};
use super::{push_contains, push_order_by, push_window, select_live, PagedStore};
use crate::db::Database;
use crate::models::{
    FetchWindow, Post, PostFilter, PostRecord, PostSortField, PostStatus, PostTagWrite,
    SortOption,
};

const POST_COLUMNS: &str = "id, title, slug, excerpt, content, status, is_active, \
     featured_image, featured_image_alt, meta_keywords, meta_description, view_count, \
     published_at, author_id, category_id, created_at, updated_at, deleted_at";

/// Post repository trait
#[async_trait]
pub trait PostRepository:
    PagedStore<Item = Post, Filter = PostFilter, Sort = PostSortField>
{
    /// Insert the post, create `tags.new_tags` and link every tag
    async fn create(&self, post: &PostRecord, tags: &PostTagWrite) -> Result<Post>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Live rows among `ids`, ordered by id; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>>;

    /// Overwrite the editable columns, adjusting tag counters when the
    /// post's active flag flips. With `tags`, the post's tag set becomes
    /// exactly those tags. `None` when the post is gone.
    async fn update(
        &self,
        id: i64,
        post: &PostRecord,
        tags: Option<&PostTagWrite>,
    ) -> Result<Option<Post>>;

    /// Soft delete, releasing the post's tag counters if it was active
    async fn remove(&self, id: i64) -> Result<bool>;

    /// Atomically add one view
    async fn increment_view_count(&self, id: i64) -> Result<Option<Post>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl PagedStore for SqlxPostRepository {
    type Item = Post;
    type Filter = PostFilter;
    type Sort = PostSortField;

    async fn find_many_with_pagination(
        &self,
        filter: &PostFilter,
        sort: &[SortOption<PostSortField>],
        window: FetchWindow,
    ) -> Result<Vec<Post>> {
        let mut qb = select_live(POST_COLUMNS, "posts");
        if let Some(title) = &filter.title {
            push_contains(&mut qb, "title", title);
        }
        if let Some(slug) = &filter.slug {
            qb.push(" AND slug = ").push_bind(slug.clone());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(author_id) = filter.author_id {
            qb.push(" AND author_id = ").push_bind(author_id);
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        push_order_by(&mut qb, sort, &[SortOption::desc(PostSortField::CreatedAt)]);
        push_window(&mut qb, window);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        rows.iter().map(row_to_post).collect()
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &PostRecord, tags: &PostTagWrite) -> Result<Post> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let tag_ids = write_new_tags(&mut tx, tags).await?;

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO posts (
                title, slug, excerpt, content, status, is_active,
                featured_image, featured_image_alt, meta_keywords, meta_description,
                view_count, published_at, author_id, category_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(post.status.as_str())
            .bind(post.is_active)
            .bind(&post.featured_image)
            .bind(&post.featured_image_alt)
            .bind(&post.meta_keywords)
            .bind(&post.meta_description)
            .bind(post.published_at)
            .bind(post.author_id)
            .bind(post.category_id)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to create post")?;
        let created = row_to_post(&row)?;

        link_tags(&mut tx, created.id, &tag_ids, created.is_live()).await?;

        tx.commit().await.context("Failed to commit post create")?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE id = ? AND deleted_at IS NULL",
            POST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by ID")?;

        row.as_ref().map(row_to_post).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE slug = ? AND deleted_at IS NULL",
            POST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by slug")?;

        row.as_ref().map(row_to_post).transpose()
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = select_live(POST_COLUMNS, "posts");
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
            .context("Failed to get posts by IDs")?;

        rows.iter().map(row_to_post).collect()
    }

    async fn update(
        &self,
        id: i64,
        post: &PostRecord,
        tags: Option<&PostTagWrite>,
    ) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let was_live = post_is_live(&mut tx, id).await?;
        let sql = format!(
            r#"
            UPDATE posts
            SET title = ?, slug = ?, excerpt = ?, content = ?, status = ?, is_active = ?,
                featured_image = ?, featured_image_alt = ?, meta_keywords = ?, meta_description = ?,
                published_at = ?, author_id = ?, category_id = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(post.status.as_str())
            .bind(post.is_active)
            .bind(&post.featured_image)
            .bind(&post.featured_image_alt)
            .bind(&post.meta_keywords)
            .bind(&post.meta_description)
            .bind(post.published_at)
            .bind(post.author_id)
            .bind(post.category_id)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to update post")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let updated = row_to_post(&row)?;

        match (was_live, updated.is_live()) {
            (false, true) => {
                acquire_usage_for_post(&mut tx, id).await?;
            }
            (true, false) => {
                release_usage_for_post(&mut tx, id).await?;
            }
            _ => {}
        }

        if let Some(tags) = tags {
            let tag_ids = write_new_tags(&mut tx, tags).await?;
            replace_tags(&mut tx, id, &tag_ids, updated.is_live()).await?;
        }

        tx.commit().await.context("Failed to commit post update")?;
        Ok(Some(updated))
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let was_live = post_is_live(&mut tx, id).await?;
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE posts SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete post")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        if was_live {
            release_usage_for_post(&mut tx, id).await?;
        }

        tx.commit().await.context("Failed to commit post delete")?;
        Ok(true)
    }

    async fn increment_view_count(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            UPDATE posts SET view_count = view_count + 1
            WHERE id = ? AND deleted_at IS NULL
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to increment post view count")?;

        row.as_ref().map(row_to_post).transpose()
    }
}

/// Insert the write's new tags; returns every tag id to link, deduplicated
async fn write_new_tags(conn: &mut SqliteConnection, tags: &PostTagWrite) -> Result<Vec<i64>> {
    let created = insert_tags(conn, &tags.new_tags).await?;

    let mut tag_ids = tags.tag_ids.clone();
    for tag in created {
        if !tag_ids.contains(&tag.id) {
            tag_ids.push(tag.id);
        }
    }
    Ok(tag_ids)
}

fn row_to_post(row: &SqliteRow) -> Result<Post> {
    let status: String = row.try_get("status")?;
    let status =
        PostStatus::parse(&status).ok_or_else(|| anyhow!("Unknown post status: {}", status))?;

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        status,
        is_active: row.try_get("is_active")?,
        featured_image: row.try_get("featured_image")?,
        featured_image_alt: row.try_get("featured_image_alt")?,
        meta_keywords: row.try_get("meta_keywords")?,
        meta_description: row.try_get("meta_description")?,
        view_count: row.try_get("view_count")?,
        published_at: row.try_get("published_at")?,
        author_id: row.try_get("author_id")?,
        category_id: row.try_get("category_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

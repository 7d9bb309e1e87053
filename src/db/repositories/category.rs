//! Category repository
//!
//! Database operations for categories.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

use super::{push_contains, push_order_by, push_window, select_live, PagedStore};
use crate::db::Database;
use crate::models::{
    Category, CategoryFilter, CategoryRecord, CategorySortField, FetchWindow, SortOption,
};

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, is_active, sort_order, parent_id, created_at, updated_at, deleted_at";

/// Category repository trait
#[async_trait]
pub trait CategoryRepository:
    PagedStore<Item = Category, Filter = CategoryFilter, Sort = CategorySortField>
{
    /// Create a new category
    async fn create(&self, category: &CategoryRecord) -> Result<Category>;

    /// Get category by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Live rows among `ids`, ordered by id; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>>;

    /// Overwrite the editable columns. `None` when the category is gone.
    async fn update(&self, id: i64, category: &CategoryRecord) -> Result<Option<Category>>;

    /// Soft delete
    async fn remove(&self, id: i64) -> Result<bool>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: SqlitePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(db: Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(db: Database) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(db))
    }
}

#[async_trait]
impl PagedStore for SqlxCategoryRepository {
    type Item = Category;
    type Filter = CategoryFilter;
    type Sort = CategorySortField;

    async fn find_many_with_pagination(
        &self,
        filter: &CategoryFilter,
        sort: &[SortOption<CategorySortField>],
        window: FetchWindow,
    ) -> Result<Vec<Category>> {
        let mut qb = select_live(CATEGORY_COLUMNS, "categories");
        if let Some(name) = &filter.name {
            push_contains(&mut qb, "name", name);
        }
        if let Some(slug) = &filter.slug {
            qb.push(" AND slug = ").push_bind(slug.clone());
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(parent_id) = filter.parent_id {
            qb.push(" AND parent_id = ").push_bind(parent_id);
        }
        push_order_by(
            &mut qb,
            sort,
            &[SortOption::asc(CategorySortField::SortOrder)],
        );
        push_window(&mut qb, window);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter().map(row_to_category).collect()
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &CategoryRecord) -> Result<Category> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO categories (name, slug, description, is_active, sort_order, parent_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.is_active)
            .bind(category.sort_order)
            .bind(category.parent_id)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .context("Failed to create category")?;

        row_to_category(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE id = ? AND deleted_at IS NULL",
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get category by ID")?;

        row.as_ref().map(row_to_category).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE slug = ? AND deleted_at IS NULL",
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get category by slug")?;

        row.as_ref().map(row_to_category).transpose()
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = select_live(CATEGORY_COLUMNS, "categories");
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
            .context("Failed to get categories by IDs")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn update(&self, id: i64, category: &CategoryRecord) -> Result<Option<Category>> {
        let sql = format!(
            r#"
            UPDATE categories
            SET name = ?, slug = ?, description = ?, is_active = ?, sort_order = ?, parent_id = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.is_active)
            .bind(category.sort_order)
            .bind(category.parent_id)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update category")?;

        row.as_ref().map(row_to_category).transpose()
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete category")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_category(row: &SqliteRow) -> Result<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        sort_order: row.try_get("sort_order")?,
        parent_id: row.try_get("parent_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

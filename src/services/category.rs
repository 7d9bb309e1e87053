//! Category service
//!
//! Implements business logic for category management:
//! - Slug derivation and uniqueness on create and update
//! - Parent reference validation
//! - Paginated listing and soft delete

use std::sync::Arc;

use super::error::{DomainError, EntityKind};
use super::pagination::{fetch_page, Page, PageRequest};
use super::slug::{ensure_unique, resolve_slug, slug_for_update, slug_write_error};
use crate::db::repositories::CategoryRepository;
use crate::models::{
    Category, CategoryFilter, CategoryRecord, CategorySortField, CreateCategoryInput, SortOption,
    UpdateCategoryInput,
};

/// Category service for managing blog categories
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a new category service
    ///
    /// # Arguments
    /// * `repo` - Category repository for database operations
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Create a new category
    ///
    /// The slug is taken from `input.slug` when given, otherwise derived from
    /// the name.
    ///
    /// # Errors
    /// - `Validation{name, required}` if the name is blank
    /// - `Validation{parentId, parentNotFound}` if the parent does not exist
    /// - `SlugConflict` if another live category has the slug
    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, DomainError> {
        let name = required(&input.name, "name")?;
        let slug = resolve_slug(input.slug.as_deref(), &name)?;
        ensure_unique(self.repo.as_ref(), &slug, None).await?;

        if let Some(parent_id) = input.parent_id {
            self.check_parent(parent_id, None).await?;
        }

        let record = CategoryRecord {
            name,
            slug: slug.clone(),
            description: input.description,
            is_active: input.is_active.unwrap_or(true),
            sort_order: input.sort_order.unwrap_or(0),
            parent_id: input.parent_id,
        };

        let category = self
            .repo
            .create(&record)
            .await
            .map_err(|e| slug_write_error(EntityKind::Category, &slug, e))?;

        tracing::info!(category_id = category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    /// List categories, one page at a time
    pub async fn list(
        &self,
        filter: &CategoryFilter,
        sort: &[SortOption<CategorySortField>],
        page: PageRequest,
    ) -> Result<Page<Category>, DomainError> {
        tracing::debug!(?filter, page = page.page(), limit = page.limit(), "Listing categories");
        fetch_page(self.repo.as_ref(), filter, sort, page).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DomainError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        Ok(self.repo.find_by_slug(slug).await?)
    }

    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, DomainError> {
        Ok(self.repo.find_by_ids(ids).await?)
    }

    /// Apply a partial update
    ///
    /// Renaming without an explicit slug regenerates the slug from the new
    /// name. Returns `None` if the category does not exist.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Option<Category>, DomainError> {
        let Some(current) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut changes = input;
        if let Some(name) = &changes.name {
            changes.name = Some(required(name, "name")?);
        }

        let slug = slug_for_update(
            changes.slug.as_deref(),
            changes.name.as_deref(),
            &current.slug,
        )?;
        if slug != current.slug {
            ensure_unique(self.repo.as_ref(), &slug, Some(id)).await?;
        }
        changes.slug = Some(slug.clone());

        if let Some(Some(parent_id)) = changes.parent_id {
            self.check_parent(parent_id, Some(id)).await?;
        }

        let updated = self
            .repo
            .update(id, &current.merged(&changes))
            .await
            .map_err(|e| slug_write_error(EntityKind::Category, &slug, e))?;

        if let Some(category) = &updated {
            tracing::info!(category_id = category.id, "Updated category");
        }
        Ok(updated)
    }

    /// Soft delete. Returns false if the category does not exist.
    pub async fn remove(&self, id: i64) -> Result<bool, DomainError> {
        let removed = self.repo.remove(id).await?;
        if removed {
            tracing::info!(category_id = id, "Deleted category");
        }
        Ok(removed)
    }

    async fn check_parent(&self, parent_id: i64, own_id: Option<i64>) -> Result<(), DomainError> {
        if Some(parent_id) == own_id || self.repo.find_by_id(parent_id).await?.is_none() {
            return Err(DomainError::validation("parentId", "parentNotFound"));
        }
        Ok(())
    }
}

/// Trim a required text field, rejecting blank input
pub(crate) fn required(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "required"));
    }
    Ok(trimmed.to_string())
}

//! Tag service
//!
//! Implements business logic for tag management:
//! - Slug derivation and uniqueness on create and update
//! - Color validation
//! - Paginated listing and soft delete
//!
//! `usage_count` is read-only here; it moves with post associations through
//! [`TagLifecycleManager`](super::tag_lifecycle::TagLifecycleManager).

use std::sync::Arc;

use super::category::required;
use super::error::{DomainError, EntityKind};
use super::pagination::{fetch_page, Page, PageRequest};
use super::slug::{ensure_unique, resolve_slug, slug_for_update, slug_write_error};
use crate::db::repositories::TagRepository;
use crate::models::{
    is_valid_color, CreateTagInput, SortOption, Tag, TagFilter, TagRecord, TagSortField,
    UpdateTagInput,
};

/// Tag service for managing blog tags
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Create a new tag with a zero usage count
    pub async fn create(&self, input: CreateTagInput) -> Result<Tag, DomainError> {
        let name = required(&input.name, "name")?;
        check_color(input.color.as_deref())?;
        let slug = resolve_slug(input.slug.as_deref(), &name)?;
        ensure_unique(self.repo.as_ref(), &slug, None).await?;

        let record = TagRecord {
            name,
            slug: slug.clone(),
            description: input.description,
            color: input.color,
            is_active: input.is_active.unwrap_or(true),
        };

        let tag = self
            .repo
            .create(&record)
            .await
            .map_err(|e| slug_write_error(EntityKind::Tag, &slug, e))?;

        tracing::info!(tag_id = tag.id, slug = %tag.slug, "Created tag");
        Ok(tag)
    }

    pub async fn list(
        &self,
        filter: &TagFilter,
        sort: &[SortOption<TagSortField>],
        page: PageRequest,
    ) -> Result<Page<Tag>, DomainError> {
        tracing::debug!(?filter, page = page.page(), limit = page.limit(), "Listing tags");
        fetch_page(self.repo.as_ref(), filter, sort, page).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Tag>, DomainError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, DomainError> {
        Ok(self.repo.find_by_slug(slug).await?)
    }

    /// Apply a partial update. Returns `None` if the tag does not exist.
    pub async fn update(&self, id: i64, input: UpdateTagInput) -> Result<Option<Tag>, DomainError> {
        let Some(current) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut changes = input;
        if let Some(name) = &changes.name {
            changes.name = Some(required(name, "name")?);
        }
        if let Some(color) = &changes.color {
            check_color(color.as_deref())?;
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

        let updated = self
            .repo
            .update(id, &current.merged(&changes))
            .await
            .map_err(|e| slug_write_error(EntityKind::Tag, &slug, e))?;

        if let Some(tag) = &updated {
            tracing::info!(tag_id = tag.id, "Updated tag");
        }
        Ok(updated)
    }

    /// Soft delete. Existing post associations are kept but the tag stops
    /// showing up on reads.
    pub async fn remove(&self, id: i64) -> Result<bool, DomainError> {
        let removed = self.repo.remove(id).await?;
        if removed {
            tracing::info!(tag_id = id, "Deleted tag");
        }
        Ok(removed)
    }
}

fn check_color(color: Option<&str>) -> Result<(), DomainError> {
    match color {
        Some(c) if !is_valid_color(c) => Err(DomainError::validation("color", "colorInvalid")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::test_support::StaleTagLookups;

    async fn setup() -> TagService {
        let db = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&db)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(db))
    }

    fn named(name: &str) -> CreateTagInput {
        CreateTagInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_tag() {
        let service = setup().await;

        let tag = service
            .create(CreateTagInput {
                color: Some("#3b82f6".to_string()),
                ..named("  Web Dev ")
            })
            .await
            .unwrap();

        assert_eq!(tag.name, "Web Dev");
        assert_eq!(tag.slug, "web-dev");
        assert_eq!(tag.usage_count, 0);
    }

    #[tokio::test]
    async fn test_unique_index_catches_slug_missed_by_lookup() {
        let db = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&db)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(db.clone()))
            .create(named("Rust"))
            .await
            .unwrap();

        let stale = TagService::new(StaleTagLookups::boxed(db));
        let err = stale.create(named("RUST")).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::SlugConflict { entity: EntityKind::Tag, ref slug } if slug == "rust"
        ));
    }

    #[tokio::test]
    async fn test_explicit_slug_is_normalized() {
        let service = setup().await;
        let tag = service
            .create(CreateTagInput {
                slug: Some("My Custom Slug".to_string()),
                ..named("Rust")
            })
            .await
            .unwrap();
        assert_eq!(tag.slug, "my-custom-slug");
    }

    #[tokio::test]
    async fn test_invalid_color_is_rejected() {
        let service = setup().await;
        let err = service
            .create(CreateTagInput {
                color: Some("blue".to_string()),
                ..named("Rust")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "color", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let service = setup().await;
        service.create(named("Rust")).await.unwrap();

        let err = service.create(named("RUST")).await.unwrap_err();
        assert!(matches!(err, DomainError::SlugConflict { entity: EntityKind::Tag, .. }));
    }

    #[tokio::test]
    async fn test_update_clears_color_and_keeps_counter() {
        let service = setup().await;
        let tag = service
            .create(CreateTagInput {
                color: Some("#fff".to_string()),
                ..named("Rust")
            })
            .await
            .unwrap();

        let updated = service
            .update(
                tag.id,
                UpdateTagInput {
                    color: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(updated.color.is_none());
        assert_eq!(updated.slug, "rust");
        assert_eq!(updated.usage_count, 0);
    }

    #[tokio::test]
    async fn test_remove_tag() {
        let service = setup().await;
        let tag = service.create(named("Rust")).await.unwrap();

        assert!(service.remove(tag.id).await.unwrap());
        assert!(service.find_by_id(tag.id).await.unwrap().is_none());
        assert!(!service.remove(tag.id).await.unwrap());
    }
}

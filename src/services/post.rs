//! Post service
//!
//! Implements business logic for post management:
//! - Slug derivation and uniqueness on create and update
//! - Category reference validation
//! - Tag resolution by id and by name, with usage counting
//! - Publication timestamp and view counter

use chrono::Utc;
use std::sync::Arc;

use super::category::required;
use super::error::{DomainError, EntityKind};
use super::pagination::{fetch_page, Page, PageRequest};
use super::slug::{ensure_unique, resolve_slug, slug_for_update, slug_write_error};
use super::tag_lifecycle::{NamedTag, TagLifecycleManager};
use crate::db::repositories::{CategoryRepository, PostRepository, TagSlugTaken};
use crate::models::{
    next_published_at, CreatePostInput, Post, PostFilter, PostRecord, PostSortField,
    PostTagWrite, PostWithTags, SortOption, UpdatePostInput,
};

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<TagLifecycleManager>,
}

impl PostService {
    /// Create a new post service
    ///
    /// # Arguments
    /// * `posts` - Post repository
    /// * `categories` - Category repository, for `categoryId` validation
    /// * `tags` - Tag lifecycle manager shared with other services
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<TagLifecycleManager>,
    ) -> Self {
        Self {
            posts,
            categories,
            tags,
        }
    }

    /// Create a post and link its tags
    ///
    /// `tagIds` are resolved leniently (unknown ids are skipped); `tagNames`
    /// are found or created. Linked tags are counted if the post is active.
    /// New tags, the post and its links are written in one transaction.
    ///
    /// # Errors
    /// - `Validation{title, required}` if the title is blank
    /// - `Validation{categoryId, categoryNotFound}` for an unknown category
    /// - `Validation{tagNames, ..}` if a new tag name has no usable slug or
    ///   its slug is taken
    /// - `SlugConflict` if another live post has the slug
    pub async fn create(&self, input: CreatePostInput) -> Result<PostWithTags, DomainError> {
        let title = required(&input.title, "title")?;
        let slug = resolve_slug(input.slug.as_deref(), &title)?;
        ensure_unique(self.posts.as_ref(), &slug, None).await?;

        if let Some(category_id) = input.category_id {
            self.check_category(category_id).await?;
        }

        let tags = self.plan_tags(&input.tag_ids, &input.tag_names).await?;

        let status = input.status.unwrap_or_default();
        let record = PostRecord {
            title,
            slug: slug.clone(),
            excerpt: input.excerpt,
            content: input.content.unwrap_or_default(),
            status,
            is_active: input.is_active.unwrap_or(true),
            featured_image: input.featured_image,
            featured_image_alt: input.featured_image_alt,
            meta_keywords: input.meta_keywords,
            meta_description: input.meta_description,
            published_at: next_published_at(None, status, Utc::now()),
            author_id: input.author_id,
            category_id: input.category_id,
        };

        let post = self
            .posts
            .create(&record, &tags)
            .await
            .map_err(|e| post_write_error(&slug, e))?;

        tracing::info!(
            post_id = post.id,
            slug = %post.slug,
            tags = tags.tag_ids.len() + tags.new_tags.len(),
            "Created post"
        );
        self.with_tags(post).await
    }

    /// List posts, one page at a time. Tags are not loaded for lists.
    pub async fn list(
        &self,
        filter: &PostFilter,
        sort: &[SortOption<PostSortField>],
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        tracing::debug!(?filter, page = page.page(), limit = page.limit(), "Listing posts");
        fetch_page(self.posts.as_ref(), filter, sort, page).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<PostWithTags>, DomainError> {
        match self.posts.find_by_id(id).await? {
            Some(post) => Ok(Some(self.with_tags(post).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<PostWithTags>, DomainError> {
        match self.posts.find_by_slug(slug).await? {
            Some(post) => Ok(Some(self.with_tags(post).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.find_by_ids(ids).await?)
    }

    /// Apply a partial update
    ///
    /// A new title without an explicit slug regenerates the slug. When
    /// `tagIds` or `tagNames` is present the tag set is replaced by their
    /// union. Returns `None` if the post does not exist.
    pub async fn update(
        &self,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<Option<PostWithTags>, DomainError> {
        let Some(current) = self.posts.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut changes = input;
        if let Some(title) = &changes.title {
            changes.title = Some(required(title, "title")?);
        }

        let slug = slug_for_update(
            changes.slug.as_deref(),
            changes.title.as_deref(),
            &current.slug,
        )?;
        if slug != current.slug {
            ensure_unique(self.posts.as_ref(), &slug, Some(id)).await?;
        }

        if let Some(Some(category_id)) = changes.category_id {
            self.check_category(category_id).await?;
        }

        let tags = if changes.touches_tags() {
            let ids = changes.tag_ids.take().unwrap_or_default();
            let names = changes.tag_names.take().unwrap_or_default();
            Some(self.plan_tags(&ids, &names).await?)
        } else {
            None
        };

        let record = current.merged(&changes, slug.clone(), Utc::now());
        let Some(updated) = self
            .posts
            .update(id, &record, tags.as_ref())
            .await
            .map_err(|e| post_write_error(&slug, e))?
        else {
            return Ok(None);
        };

        tracing::info!(post_id = id, "Updated post");
        Ok(Some(self.with_tags(updated).await?))
    }

    /// Soft delete. Releases tag usage if the post was active.
    pub async fn remove(&self, id: i64) -> Result<bool, DomainError> {
        let removed = self.posts.remove(id).await?;
        if removed {
            tracing::info!(post_id = id, "Deleted post");
        }
        Ok(removed)
    }

    /// Record one view. Returns `None` if the post does not exist.
    pub async fn increment_view_count(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.posts.increment_view_count(id).await?)
    }

    /// Resolve tag references without writing; nothing is created until the
    /// post itself is written.
    async fn plan_tags(&self, ids: &[i64], names: &[String]) -> Result<PostTagWrite, DomainError> {
        let mut tags = PostTagWrite {
            tag_ids: self
                .tags
                .resolve_by_ids(ids)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect(),
            new_tags: Vec::new(),
        };

        let planned = self.tags.plan_names(names).await.map_err(tag_names_error)?;
        for named in planned {
            match named {
                NamedTag::Existing(tag) => {
                    if !tags.tag_ids.contains(&tag.id) {
                        tags.tag_ids.push(tag.id);
                    }
                }
                NamedTag::New(record) => tags.new_tags.push(record),
            }
        }
        Ok(tags)
    }

    async fn check_category(&self, category_id: i64) -> Result<(), DomainError> {
        if self.categories.find_by_id(category_id).await?.is_none() {
            return Err(DomainError::validation("categoryId", "categoryNotFound"));
        }
        Ok(())
    }

    async fn with_tags(&self, post: Post) -> Result<PostWithTags, DomainError> {
        let tags = self.tags.tags_for_post(post.id).await?;
        Ok(PostWithTags { post, tags })
    }
}

/// Report a rejected tag name against the `tagNames` field
fn tag_names_error(err: DomainError) -> DomainError {
    match err {
        DomainError::SlugConflict {
            entity: EntityKind::Tag,
            ..
        } => DomainError::validation("tagNames", "slugAlreadyExists"),
        DomainError::Validation { code, .. } => DomainError::validation("tagNames", code),
        other => other,
    }
}

/// Map a failed post write; a tag slug taken after the check belongs to
/// `tagNames`, anything else goes through the post slug mapping
fn post_write_error(slug: &str, err: anyhow::Error) -> DomainError {
    if let Some(taken) = err.downcast_ref::<TagSlugTaken>() {
        tracing::warn!(slug = %taken.slug, "Tag slug taken between check and write");
        return DomainError::validation("tagNames", "slugAlreadyExists");
    }
    slug_write_error(EntityKind::Post, slug, err)
}

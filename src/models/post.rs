//! Post model
//!
//! This module provides:
//! - `Post` entity and its `PostStatus`
//! - `PostWithTags`, the shape returned by single-post reads
//! - Input types for creating and updating posts
//! - Filter and sort types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::{double_option, SortField};
use super::tag::Tag;

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub status: PostStatus,
    pub is_active: bool,
    pub featured_image: Option<String>,
    pub featured_image_alt: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_description: Option<String>,
    pub view_count: i64,
    /// Set the first time the post is published; never cleared
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Live posts count towards their tags' usage counters
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none() && self.is_active
    }
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Publication timestamp after a status change
pub fn next_published_at(
    current: Option<DateTime<Utc>>,
    status: PostStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current, status) {
        (None, PostStatus::Published) => Some(now),
        (current, _) => current,
    }
}

/// A post together with its live tags
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostWithTags {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub featured_image_alt: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    pub author_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Existing tags to link; unknown ids are skipped
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    /// Tags to link by name, created when missing
    #[serde(default)]
    pub tag_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub excerpt: Option<Option<String>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub featured_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub featured_image_alt: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_keywords: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_description: Option<Option<String>>,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    /// When either tag list is present the post's tag set is replaced
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub tag_names: Option<Vec<String>>,
}

impl UpdatePostInput {
    pub fn touches_tags(&self) -> bool {
        self.tag_ids.is_some() || self.tag_names.is_some()
    }
}

/// Column values written by an insert or a full-row update
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub status: PostStatus,
    pub is_active: bool,
    pub featured_image: Option<String>,
    pub featured_image_alt: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: i64,
    pub category_id: Option<i64>,
}

impl Post {
    /// Apply an update on top of this row.
    ///
    /// `slug` is the already-resolved slug; tag lists are handled separately.
    pub fn merged(&self, changes: &UpdatePostInput, slug: String, now: DateTime<Utc>) -> PostRecord {
        let status = changes.status.unwrap_or(self.status);
        PostRecord {
            title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            slug,
            excerpt: changes.excerpt.clone().unwrap_or_else(|| self.excerpt.clone()),
            content: changes.content.clone().unwrap_or_else(|| self.content.clone()),
            status,
            is_active: changes.is_active.unwrap_or(self.is_active),
            featured_image: changes
                .featured_image
                .clone()
                .unwrap_or_else(|| self.featured_image.clone()),
            featured_image_alt: changes
                .featured_image_alt
                .clone()
                .unwrap_or_else(|| self.featured_image_alt.clone()),
            meta_keywords: changes
                .meta_keywords
                .clone()
                .unwrap_or_else(|| self.meta_keywords.clone()),
            meta_description: changes
                .meta_description
                .clone()
                .unwrap_or_else(|| self.meta_description.clone()),
            published_at: next_published_at(self.published_at, status, now),
            author_id: changes.author_id.unwrap_or(self.author_id),
            category_id: changes.category_id.unwrap_or(self.category_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Substring match on title
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<PostStatus>,
    pub is_active: Option<bool>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortField {
    Id,
    Title,
    Slug,
    Status,
    ViewCount,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

impl SortField for PostSortField {
    fn column(self) -> &'static str {
        match self {
            PostSortField::Id => "id",
            PostSortField::Title => "title",
            PostSortField::Slug => "slug",
            PostSortField::Status => "status",
            PostSortField::ViewCount => "view_count",
            PostSortField::PublishedAt => "published_at",
            PostSortField::CreatedAt => "created_at",
            PostSortField::UpdatedAt => "updated_at",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(PostSortField::Id),
            "title" => Some(PostSortField::Title),
            "slug" => Some(PostSortField::Slug),
            "status" => Some(PostSortField::Status),
            "viewCount" => Some(PostSortField::ViewCount),
            "publishedAt" => Some(PostSortField::PublishedAt),
            "createdAt" => Some(PostSortField::CreatedAt),
            "updatedAt" => Some(PostSortField::UpdatedAt),
            _ => None,
        }
    }
}

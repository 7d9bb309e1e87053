//! Category model
//!
//! Categories carry an optional `parent_id` self-reference. The hierarchy is
//! not required to be a tree; only the parent's existence is checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::{double_option, SortField};

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// URL-friendly slug, unique among non-deleted categories
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Display position among siblings
    pub sort_order: i32,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Request body for creating a category
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    pub name: String,
    /// Derived from `name` when absent or blank
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Request body for a partial category update.
///
/// Nullable columns use `Option<Option<_>>`: absent leaves the value alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

/// Column values written by a category insert or full-row update
#[derive(Debug, Clone)]
pub struct CategoryRecord {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub parent_id: Option<i64>,
}

impl Category {
    /// Apply a validated update on top of this row
    pub fn merged(&self, changes: &UpdateCategoryInput) -> CategoryRecord {
        CategoryRecord {
            name: changes.name.clone().unwrap_or_else(|| self.name.clone()),
            slug: changes.slug.clone().unwrap_or_else(|| self.slug.clone()),
            description: changes
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            is_active: changes.is_active.unwrap_or(self.is_active),
            sort_order: changes.sort_order.unwrap_or(self.sort_order),
            parent_id: changes.parent_id.unwrap_or(self.parent_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Substring match on name
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySortField {
    Id,
    Name,
    Slug,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

impl SortField for CategorySortField {
    fn column(self) -> &'static str {
        match self {
            CategorySortField::Id => "id",
            CategorySortField::Name => "name",
            CategorySortField::Slug => "slug",
            CategorySortField::SortOrder => "sort_order",
            CategorySortField::CreatedAt => "created_at",
            CategorySortField::UpdatedAt => "updated_at",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(CategorySortField::Id),
            "name" => Some(CategorySortField::Name),
            "slug" => Some(CategorySortField::Slug),
            "sortOrder" => Some(CategorySortField::SortOrder),
            "createdAt" => Some(CategorySortField::CreatedAt),
            "updatedAt" => Some(CategorySortField::UpdatedAt),
            _ => None,
        }
    }
}

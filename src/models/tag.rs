//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::{double_option, SortField};

/// Tag entity.
///
/// `usage_count` mirrors the number of live posts linked to the tag and is
/// only ever changed by atomic counter statements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Hex color such as `#3b82f6`
    pub color: Option<String>,
    pub is_active: bool,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Column values written by a tag insert or full-row update.
///
/// New tags start with `usage_count = 0`; updates never write the counter.
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
}

impl TagRecord {
    /// A bare active tag, as created from a post's tag names
    pub fn named(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: None,
            color: None,
            is_active: true,
        }
    }
}

impl Tag {
    pub fn merged(&self, changes: &UpdateTagInput) -> TagRecord {
        TagRecord {
            name: changes.name.clone().unwrap_or_else(|| self.name.clone()),
            slug: changes.slug.clone().unwrap_or_else(|| self.slug.clone()),
            description: changes
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            color: changes.color.clone().unwrap_or_else(|| self.color.clone()),
            is_active: changes.is_active.unwrap_or(self.is_active),
        }
    }
}

/// Check a tag color: `#` followed by 3 or 6 hex digits
pub fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSortField {
    Id,
    Name,
    Slug,
    UsageCount,
    CreatedAt,
    UpdatedAt,
}

impl SortField for TagSortField {
    fn column(self) -> &'static str {
        match self {
            TagSortField::Id => "id",
            TagSortField::Name => "name",
            TagSortField::Slug => "slug",
            TagSortField::UsageCount => "usage_count",
            TagSortField::CreatedAt => "created_at",
            TagSortField::UpdatedAt => "updated_at",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(TagSortField::Id),
            "name" => Some(TagSortField::Name),
            "slug" => Some(TagSortField::Slug),
            "usageCount" => Some(TagSortField::UsageCount),
            "createdAt" => Some(TagSortField::CreatedAt),
            "updatedAt" => Some(TagSortField::UpdatedAt),
            _ => None,
        }
    }
}

/// Association changes applied by a tag-set replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSetChange {
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
}

/// Tag links for one post write.
///
/// `new_tags` are inserted in the same transaction as the post row, so a
/// failed write leaves none of them behind.
#[derive(Debug, Clone, Default)]
pub struct PostTagWrite {
    /// Live tags to link
    pub tag_ids: Vec<i64>,
    /// Tags to create and link
    pub new_tags: Vec<TagRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_validation() {
        assert!(is_valid_color("#fff"));
        assert!(is_valid_color("#3B82F6"));
        assert!(!is_valid_color("3b82f6"));
        assert!(!is_valid_color("#3b82f"));
        assert!(!is_valid_color("#ggg"));
    }

    #[test]
    fn test_named_tag_defaults() {
        let tag = TagRecord::named("Rust", "rust");
        assert!(tag.is_active);
        assert!(tag.color.is_none());
    }

    #[test]
    fn test_update_input_clears_color() {
        let input: UpdateTagInput = serde_json::from_str(r#"{"color":null}"#).unwrap();
        assert_eq!(input.color, Some(None));
        assert_eq!(input.description, None);
    }
}

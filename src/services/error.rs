//! Error type shared by the domain services

use std::fmt;

/// The entity a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Tag,
    Post,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Tag => "tag",
            EntityKind::Post => "post",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for domain service operations
///
/// A missing record on a plain read is `Ok(None)`, not an error. `NotFound`
/// is reserved for operations that cannot proceed without the record.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    /// Another live record already uses this slug
    #[error("{entity} slug already exists: {slug}")]
    SlugConflict { entity: EntityKind, slug: String },

    /// A field failed validation; `code` is the machine-readable reason
    #[error("Validation error on {field}: {code}")]
    Validation {
        field: &'static str,
        code: &'static str,
    },

    /// Decrement requested on a tag whose counter is already zero
    #[error("Usage count of tag {tag_id} is already zero")]
    UsageCountUnderflow { tag_id: i64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    pub fn not_found(entity: EntityKind, key: impl fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(field: &'static str, code: &'static str) -> Self {
        DomainError::Validation { field, code }
    }
}

//! Data models
//!
//! Entities (Category, Tag, Post), their create/update inputs, and the
//! filter and sort types used by list queries.

mod category;
mod post;
mod query;
mod tag;

pub use category::{
    Category, CategoryFilter, CategorySortField, CreateCategoryInput, CategoryRecord,
    UpdateCategoryInput,
};
pub use post::{
    next_published_at, CreatePostInput, Post, PostFilter, PostRecord, PostSortField, PostStatus,
    PostWithTags, UpdatePostInput,
};
pub use query::{double_option, like_pattern, FetchWindow, SortDirection, SortField, SortOption};
pub use tag::{
    is_valid_color, CreateTagInput, PostTagWrite, TagRecord, Tag, TagFilter, TagSetChange,
    TagSortField, UpdateTagInput,
};

//! Services layer - Business logic
//!
//! The domain core shared by every writable resource:
//! - `slug`: slug normalization and uniqueness
//! - `tag_lifecycle`: tag resolution and usage counting
//! - `pagination`: look-ahead paging over any store
//!
//! and the Category/Tag/Post services composed from them. Services depend on
//! repository traits only.

pub mod category;
pub mod error;
pub mod pagination;
pub mod post;
pub mod slug;
pub mod tag;
pub mod tag_lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

pub use category::CategoryService;
pub use error::{DomainError, EntityKind};
pub use pagination::{fetch_page, Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use post::PostService;
pub use slug::{ensure_unique, resolve_slug, slugify, SlugLookup};
pub use tag::TagService;
pub use tag_lifecycle::{NamedTag, TagLifecycleManager};

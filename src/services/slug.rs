//! Slug derivation and uniqueness checks
//!
//! A slug is normalized text: lowercase `[a-z0-9]` runs joined by single
//! hyphens. Uniqueness is checked against live records before every write,
//! and the partial unique indexes in the schema catch the races the
//! pre-check cannot. [`slug_write_error`] turns such a constraint violation
//! into the same `SlugConflict` the pre-check reports.

use async_trait::async_trait;

use super::error::{DomainError, EntityKind};
use crate::db::is_unique_violation;
use crate::db::repositories::{CategoryRepository, PostRepository, TagRepository};

/// Normalize text into a slug.
///
/// Every maximal run of characters outside `[a-z0-9]` (after lowercasing)
/// becomes a single hyphen; leading and trailing hyphens are dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Pick the slug for a write.
///
/// A non-blank `explicit` slug wins; otherwise the slug is derived from
/// `fallback` (the name or title). Input that normalizes to nothing is
/// rejected rather than stored as an empty slug.
pub fn resolve_slug(explicit: Option<&str>, fallback: &str) -> Result<String, DomainError> {
    let source = match explicit {
        Some(slug) if !slug.trim().is_empty() => slug,
        _ => fallback,
    };

    let slug = slugify(source);
    if slug.is_empty() {
        return Err(DomainError::validation("slug", "slugInvalid"));
    }
    Ok(slug)
}

/// Pick the slug for an update.
///
/// An explicit slug is normalized; a rename without one regenerates the slug
/// from the new name; otherwise the current slug is kept.
pub fn slug_for_update(
    explicit: Option<&str>,
    renamed_to: Option<&str>,
    current: &str,
) -> Result<String, DomainError> {
    match (explicit, renamed_to) {
        (Some(slug), _) if !slug.trim().is_empty() => resolve_slug(Some(slug), ""),
        (_, Some(name)) => resolve_slug(None, name),
        _ => Ok(current.to_string()),
    }
}

/// Slug lookup over one entity's store
#[async_trait]
pub trait SlugLookup: Send + Sync {
    fn entity(&self) -> EntityKind;

    /// Id of the live record holding `slug`, if any
    async fn id_for_slug(&self, slug: &str) -> anyhow::Result<Option<i64>>;
}

#[async_trait]
impl SlugLookup for dyn CategoryRepository {
    fn entity(&self) -> EntityKind {
        EntityKind::Category
    }

    async fn id_for_slug(&self, slug: &str) -> anyhow::Result<Option<i64>> {
        Ok(self.find_by_slug(slug).await?.map(|c| c.id))
    }
}

#[async_trait]
impl SlugLookup for dyn TagRepository {
    fn entity(&self) -> EntityKind {
        EntityKind::Tag
    }

    async fn id_for_slug(&self, slug: &str) -> anyhow::Result<Option<i64>> {
        Ok(self.find_by_slug(slug).await?.map(|t| t.id))
    }
}

#[async_trait]
impl SlugLookup for dyn PostRepository {
    fn entity(&self) -> EntityKind {
        EntityKind::Post
    }

    async fn id_for_slug(&self, slug: &str) -> anyhow::Result<Option<i64>> {
        Ok(self.find_by_slug(slug).await?.map(|p| p.id))
    }
}

/// Fail with `SlugConflict` when another live record already holds `slug`.
///
/// `exclude_id` is the record being updated, which may keep its own slug.
pub async fn ensure_unique<L>(
    lookup: &L,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<(), DomainError>
where
    L: SlugLookup + ?Sized,
{
    match lookup.id_for_slug(slug).await? {
        Some(id) if Some(id) != exclude_id => Err(DomainError::SlugConflict {
            entity: lookup.entity(),
            slug: slug.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Map a failed insert/update: a unique violation means a concurrent writer
/// took the slug after the pre-check.
pub fn slug_write_error(entity: EntityKind, slug: &str, err: anyhow::Error) -> DomainError {
    if is_unique_violation(&err) {
        tracing::warn!(%entity, slug, "Slug taken between check and write");
        DomainError::SlugConflict {
            entity,
            slug: slug.to_string(),
        }
    } else {
        DomainError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct FixedLookup(Option<i64>);

    #[async_trait]
    impl SlugLookup for FixedLookup {
        fn entity(&self) -> EntityKind {
            EntityKind::Post
        }

        async fn id_for_slug(&self, _slug: &str) -> anyhow::Result<Option<i64>> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Technology"), "technology");
        assert_eq!(slugify("Technology!!"), "technology");
        assert_eq!(slugify("  Hello,   World  "), "hello-world");
        assert_eq!(slugify("Rust_2024--edition"), "rust-2024-edition");
        assert_eq!(slugify("C++ & Go"), "c-go");
    }

    #[test]
    fn test_slugify_non_ascii_becomes_separator() {
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
        assert_eq!(slugify("技术"), "");
    }

    #[test]
    fn test_resolve_slug_prefers_explicit() {
        assert_eq!(resolve_slug(Some("My Slug"), "Title").unwrap(), "my-slug");
        assert_eq!(resolve_slug(None, "Hello World").unwrap(), "hello-world");
        assert_eq!(resolve_slug(Some("   "), "Hello").unwrap(), "hello");
    }

    #[test]
    fn test_resolve_slug_rejects_empty_result() {
        let err = resolve_slug(Some("!!!"), "Title").unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "slug",
                code: "slugInvalid"
            }
        ));
        assert!(resolve_slug(None, "???").is_err());
    }

    #[test]
    fn test_slug_for_update() {
        assert_eq!(slug_for_update(None, None, "old").unwrap(), "old");
        assert_eq!(slug_for_update(None, Some("New Name"), "old").unwrap(), "new-name");
        assert_eq!(
            slug_for_update(Some("Custom"), Some("New Name"), "old").unwrap(),
            "custom"
        );
        assert_eq!(slug_for_update(Some(""), None, "old").unwrap(), "old");
        assert!(slug_for_update(Some("%%"), None, "old").is_err());
    }

    #[tokio::test]
    async fn test_ensure_unique() {
        assert!(ensure_unique(&FixedLookup(None), "a", None).await.is_ok());
        assert!(ensure_unique(&FixedLookup(Some(3)), "a", Some(3)).await.is_ok());

        let err = ensure_unique(&FixedLookup(Some(3)), "a", Some(4))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::SlugConflict {
                entity: EntityKind::Post,
                ..
            }
        ));
        assert!(ensure_unique(&FixedLookup(Some(3)), "a", None).await.is_err());
    }

    #[test]
    fn test_slug_write_error_passes_other_errors_through() {
        let err = slug_write_error(EntityKind::Tag, "rust", anyhow::anyhow!("boom"));
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[tokio::test]
    async fn test_slug_write_error_maps_wrapped_unique_violation() {
        use anyhow::Context;

        let db = crate::db::create_test_pool().await.unwrap();
        crate::db::migrations::run_migrations(&db).await.unwrap();
        let insert = "INSERT INTO categories (name, slug) VALUES (?, 'technology')";
        sqlx::query(insert)
            .bind("Technology")
            .execute(db.pool())
            .await
            .unwrap();

        let err = sqlx::query(insert)
            .bind("Technology!!")
            .execute(db.pool())
            .await
            .context("Failed to create category")
            .unwrap_err();

        let mapped = slug_write_error(EntityKind::Category, "technology", err);
        assert!(matches!(
            mapped,
            DomainError::SlugConflict { entity: EntityKind::Category, ref slug } if slug == "technology"
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_slugify_is_idempotent(s in "\\PC{0,40}") {
            let once = slugify(&s);
            prop_assert_eq!(slugify(&once), once);
        }

        #[test]
        fn prop_slugify_charset(s in "\\PC{0,40}") {
            let slug = slugify(&s);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}

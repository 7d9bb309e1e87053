//! Tag lifecycle
//!
//! Resolves tag references given by id or by name, creates missing tags, and
//! keeps `usage_count` equal to the number of live posts linked to each tag.
//! Association writes and their counter updates are applied together by the
//! repository in one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{DomainError, EntityKind};
use super::slug::{ensure_unique, resolve_slug};
use crate::db::repositories::{CounterUpdate, TagRepository, TagSlugTaken};
use crate::models::{Tag, TagRecord, TagSetChange};

/// A requested tag name, matched against the store but not yet written
#[derive(Debug, Clone)]
pub enum NamedTag {
    /// A live tag already carries the name
    Existing(Tag),
    /// The tag to create, slug already checked
    New(TagRecord),
}

pub struct TagLifecycleManager {
    tags: Arc<dyn TagRepository>,
}

impl TagLifecycleManager {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    /// Fetch live tags for `ids`, in first-seen input order.
    ///
    /// Unknown or deleted ids are dropped silently. Callers that need strict
    /// validation compare the returned length with what they asked for.
    pub async fn resolve_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, DomainError> {
        let ids = dedupe(ids.iter().copied());
        let found = self.tags.find_by_ids(&ids).await?;

        let mut by_id: HashMap<i64, Tag> = found.into_iter().map(|t| (t.id, t)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Match tag names against the store without writing anything.
    ///
    /// Names are trimmed, blanks dropped and exact repeats collapsed. Every
    /// name without a live tag gets its slug derived and checked here, so a
    /// bad name fails the whole batch before any tag is created.
    ///
    /// # Errors
    /// - `Validation{slug, slugInvalid}` when a new name has no usable slug
    /// - `SlugConflict` when a new name's slug belongs to a differently named
    ///   tag, or to another new name in the same batch
    pub async fn plan_names(&self, names: &[String]) -> Result<Vec<NamedTag>, DomainError> {
        let names = dedupe(
            names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        );
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.tags.find_by_names(&names).await?;
        let mut by_name: HashMap<String, Tag> = HashMap::with_capacity(names.len());
        for tag in existing {
            // lowest id wins if two live tags share a name
            by_name.entry(tag.name.clone()).or_insert(tag);
        }

        let mut planned = Vec::with_capacity(names.len());
        let mut new_slugs: Vec<String> = Vec::new();
        for name in names {
            if let Some(tag) = by_name.remove(&name) {
                planned.push(NamedTag::Existing(tag));
                continue;
            }

            let slug = resolve_slug(None, &name)?;
            if new_slugs.contains(&slug) {
                return Err(DomainError::SlugConflict {
                    entity: EntityKind::Tag,
                    slug,
                });
            }
            ensure_unique(self.tags.as_ref(), &slug, None).await?;

            new_slugs.push(slug.clone());
            planned.push(NamedTag::New(TagRecord::named(name.as_str(), slug.as_str())));
        }

        Ok(planned)
    }

    /// Resolve tag names, creating the ones that do not exist yet.
    ///
    /// The result follows the de-duplicated input order. New tags are created
    /// together, after every name has been checked, and start with a zero
    /// usage count; linking them is up to the caller.
    ///
    /// # Errors
    /// Same as [`plan_names`](Self::plan_names); a slug taken between the
    /// check and the write is also a `SlugConflict`.
    pub async fn create_or_find_by_names(&self, names: &[String]) -> Result<Vec<Tag>, DomainError> {
        let planned = self.plan_names(names).await?;
        let records: Vec<TagRecord> = planned
            .iter()
            .filter_map(|named| match named {
                NamedTag::New(record) => Some(record.clone()),
                NamedTag::Existing(_) => None,
            })
            .collect();

        let mut created = self
            .tags
            .create_many(&records)
            .await
            .map_err(tag_write_error)?
            .into_iter();

        let mut resolved = Vec::with_capacity(planned.len());
        for named in planned {
            match named {
                NamedTag::Existing(tag) => resolved.push(tag),
                NamedTag::New(record) => {
                    let tag = created.next().ok_or_else(|| {
                        anyhow::anyhow!("Tag was not created: {}", record.name)
                    })?;
                    tracing::info!(tag_id = tag.id, name = %tag.name, "Created tag");
                    resolved.push(tag);
                }
            }
        }

        Ok(resolved)
    }

    /// Link tags to a post and count them. Returns the newly linked ids.
    pub async fn attach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, DomainError> {
        let tag_ids = dedupe(tag_ids.iter().copied());
        let linked = self.tags.attach(post_id, &tag_ids).await?;
        tracing::debug!(post_id, ?linked, "Attached tags");
        Ok(linked)
    }

    /// Unlink tags from a post and release their counts. Returns the ids
    /// that were actually linked.
    pub async fn detach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, DomainError> {
        let tag_ids = dedupe(tag_ids.iter().copied());
        let unlinked = self.tags.detach(post_id, &tag_ids).await?;
        tracing::debug!(post_id, ?unlinked, "Detached tags");
        Ok(unlinked)
    }

    /// Make the post's tag set exactly `tag_ids` in one transaction
    pub async fn replace(&self, post_id: i64, tag_ids: &[i64]) -> Result<TagSetChange, DomainError> {
        let tag_ids = dedupe(tag_ids.iter().copied());
        let change = self.tags.replace(post_id, &tag_ids).await?;
        tracing::debug!(post_id, added = ?change.added, removed = ?change.removed, "Replaced tags");
        Ok(change)
    }

    pub async fn increment_usage_count(&self, id: i64) -> Result<Tag, DomainError> {
        self.tags
            .increment_usage_count(id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Tag, id))
    }

    /// Decrement a tag's counter. A counter already at zero is left alone
    /// and reported as `UsageCountUnderflow`.
    pub async fn decrement_usage_count(&self, id: i64) -> Result<Tag, DomainError> {
        match self.tags.decrement_usage_count(id).await? {
            CounterUpdate::Applied(tag) => Ok(tag),
            CounterUpdate::AtZero(_) => {
                tracing::error!(tag_id = id, "Refused to decrement usage count below zero");
                Err(DomainError::UsageCountUnderflow { tag_id: id })
            }
            CounterUpdate::Missing => Err(DomainError::not_found(EntityKind::Tag, id)),
        }
    }

    /// Live tags linked to a post
    pub async fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, DomainError> {
        Ok(self.tags.find_by_post_id(post_id).await?)
    }
}

/// Map a failed tag batch: a slug taken after the check is a conflict
pub(crate) fn tag_write_error(err: anyhow::Error) -> DomainError {
    if let Some(taken) = err.downcast_ref::<TagSlugTaken>() {
        tracing::warn!(slug = %taken.slug, "Tag slug taken between check and write");
        return DomainError::SlugConflict {
            entity: EntityKind::Tag,
            slug: taken.slug.clone(),
        };
    }
    DomainError::Internal(err)
}

/// Drop repeats, keeping the first occurrence of each value
fn dedupe<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

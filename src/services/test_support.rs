//! Repository doubles for service tests

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::repositories::{CounterUpdate, PagedStore, SqlxTagRepository, TagRepository};
use crate::db::Database;
use crate::models::{
    FetchWindow, SortOption, Tag, TagFilter, TagRecord, TagSetChange, TagSortField,
};

/// Tag store whose slug and name lookups never see existing rows.
///
/// Stands in for a writer that commits between a service's uniqueness check
/// and its insert, leaving the unique index as the only guard.
pub struct StaleTagLookups {
    inner: SqlxTagRepository,
}

impl StaleTagLookups {
    pub fn boxed(db: Database) -> Arc<dyn TagRepository> {
        Arc::new(Self {
            inner: SqlxTagRepository::new(db),
        })
    }
}

#[async_trait]
impl PagedStore for StaleTagLookups {
    type Item = Tag;
    type Filter = TagFilter;
    type Sort = TagSortField;

    async fn find_many_with_pagination(
        &self,
        filter: &TagFilter,
        sort: &[SortOption<TagSortField>],
        window: FetchWindow,
    ) -> Result<Vec<Tag>> {
        self.inner.find_many_with_pagination(filter, sort, window).await
    }
}

#[async_trait]
impl TagRepository for StaleTagLookups {
    async fn create(&self, tag: &TagRecord) -> Result<Tag> {
        self.inner.create(tag).await
    }

    async fn create_many(&self, tags: &[TagRecord]) -> Result<Vec<Tag>> {
        self.inner.create_many(tags).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<Tag>> {
        Ok(None)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        self.inner.find_by_ids(ids).await
    }

    async fn find_by_names(&self, _names: &[String]) -> Result<Vec<Tag>> {
        Ok(Vec::new())
    }

    async fn update(&self, id: i64, tag: &TagRecord) -> Result<Option<Tag>> {
        self.inner.update(id, tag).await
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        self.inner.remove(id).await
    }

    async fn increment_usage_count(&self, id: i64) -> Result<Option<Tag>> {
        self.inner.increment_usage_count(id).await
    }

    async fn decrement_usage_count(&self, id: i64) -> Result<CounterUpdate> {
        self.inner.decrement_usage_count(id).await
    }

    async fn attach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>> {
        self.inner.attach(post_id, tag_ids).await
    }

    async fn detach(&self, post_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>> {
        self.inner.detach(post_id, tag_ids).await
    }

    async fn replace(&self, post_id: i64, tag_ids: &[i64]) -> Result<TagSetChange> {
        self.inner.replace(post_id, tag_ids).await
    }

    async fn find_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>> {
        self.inner.find_by_post_id(post_id).await
    }
}

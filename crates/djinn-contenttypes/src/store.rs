//! Object storage.
//!
//! The views reach content through the [`ObjectStore`] trait. [`InMemoryStore`]
//! keeps everything in a map behind a `tokio` lock; ids are assigned from a
//! single counter shared by all content types.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use djinn_core::{ContentError, ContentResult};

use crate::content::ContentObject;

/// Persistent storage for content objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches the object `id` of type `ctype`.
    ///
    /// Returns [`ContentError::DoesNotExist`] if there is none.
    async fn get(&self, ctype: &str, id: u64) -> ContentResult<ContentObject>;

    /// Inserts a new object, returning it with its assigned id.
    async fn create(&self, object: ContentObject) -> ContentResult<ContentObject> {
        let mut object = object;
        object.id = 0;
        self.save(&mut object).await?;
        Ok(object)
    }

    /// Saves an object; an unsaved one (id `0`) is inserted and gets an id.
    async fn save(&self, object: &mut ContentObject) -> ContentResult<()>;

    /// Deletes an object. The object carries its last change info.
    async fn delete(&self, object: &ContentObject) -> ContentResult<()>;

    /// Lists the objects of one type, ordered by id.
    async fn list(&self, ctype: &str) -> ContentResult<Vec<ContentObject>>;
}

/// An [`ObjectStore`] held in memory.
#[derive(Debug)]
pub struct InMemoryStore {
    objects: RwLock<BTreeMap<u64, ContentObject>>,
    next_id: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects of all types.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns `true` if the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

fn does_not_exist(ctype: &str, id: u64) -> ContentError {
    ContentError::DoesNotExist(format!("{ctype} with id {id}"))
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, ctype: &str, id: u64) -> ContentResult<ContentObject> {
        self.objects
            .read()
            .await
            .get(&id)
            .filter(|object| object.ctype == ctype)
            .cloned()
            .ok_or_else(|| does_not_exist(ctype, id))
    }

    async fn save(&self, object: &mut ContentObject) -> ContentResult<()> {
        let mut objects = self.objects.write().await;
        let now = Utc::now();
        if object.is_saved() {
            match objects.get(&object.id) {
                Some(existing) if existing.ctype == object.ctype => {}
                _ => return Err(does_not_exist(&object.ctype, object.id)),
            }
        } else {
            object.id = self.next_id.fetch_add(1, Ordering::Relaxed);
            object.created = now;
        }
        object.changed = now;
        objects.insert(object.id, object.clone());
        drop(objects);
        tracing::debug!(ctype = %object.ctype, id = object.id, is_tmp = object.is_tmp, "saved object");
        Ok(())
    }

    async fn delete(&self, object: &ContentObject) -> ContentResult<()> {
        let mut objects = self.objects.write().await;
        match objects.get(&object.id) {
            Some(existing) if existing.ctype == object.ctype => {
                objects.remove(&object.id);
            }
            _ => return Err(does_not_exist(&object.ctype, object.id)),
        }
        drop(objects);
        tracing::debug!(
            ctype = %object.ctype,
            id = object.id,
            changed_by = ?object.changed_by,
            "deleted object"
        );
        Ok(())
    }

    async fn list(&self, ctype: &str) -> ContentResult<Vec<ContentObject>> {
        Ok(self
            .objects
            .read()
            .await
            .values()
            .filter(|object| object.ctype == ctype)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let store = InMemoryStore::new();
        let first = store.create(ContentObject::new("news")).await.unwrap();
        let second = store.create(ContentObject::new("event")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_checks_type() {
        let store = InMemoryStore::new();
        let news = store.create(ContentObject::new("news")).await.unwrap();
        assert!(store.get("news", news.id).await.is_ok());
        let err = store.get("event", news.id).await.unwrap_err();
        assert!(matches!(err, ContentError::DoesNotExist(_)));
        assert!(store.get("news", 99).await.is_err());
    }

    #[tokio::test]
    async fn test_save_updates_existing() {
        let store = InMemoryStore::new();
        let mut news = store.create(ContentObject::new("news")).await.unwrap();
        news.is_tmp = true;
        store.save(&mut news).await.unwrap();
        assert!(store.get("news", news.id).await.unwrap().is_tmp);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_unknown_id_fails() {
        let store = InMemoryStore::new();
        let mut ghost = ContentObject::new("news");
        ghost.id = 42;
        assert!(store.save(&mut ghost).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        let news = store.create(ContentObject::new("news")).await.unwrap();
        store.delete(&news).await.unwrap();
        assert!(store.get("news", news.id).await.is_err());
        assert!(store.delete(&news).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_by_type() {
        let store = InMemoryStore::new();
        store.create(ContentObject::new("news")).await.unwrap();
        store.create(ContentObject::new("event")).await.unwrap();
        store.create(ContentObject::new("news")).await.unwrap();
        let news = store.list("news").await.unwrap();
        assert_eq!(news.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}

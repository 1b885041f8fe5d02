//! In-memory [`DocumentStore`] for tests and dry experiments.
//!
//! Collections are `BTreeMap`s behind a `RwLock`, so listing ids is
//! deterministic. Appends get UUID v4 ids.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::DocumentStore;

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

pub struct InMemoryStore {
    collections: RwLock<Collections>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Document at `collection/id`, if any.
    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let guard = self.collections.read().unwrap_or_else(|e| e.into_inner());
        guard.get(collection).and_then(|c| c.get(id)).cloned()
    }

    /// Sorted ids of every document in `collection`.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        let guard = self.collections.read().unwrap_or_else(|e| e.into_inner());
        guard
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &str) -> usize {
        let guard = self.collections.read().unwrap_or_else(|e| e.into_inner());
        guard.get(collection).map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Total upserts and appends accepted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn insert(&self, collection: &str, id: String, document: &Value) -> Result<()> {
        if !document.is_object() {
            bail!("document for {}/{} must be a JSON object", collection, id);
        }
        let mut guard = self
            .collections
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(id, document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn describe(&self) -> String {
        "in-memory".to_string()
    }

    async fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        if id.is_empty() {
            bail!("document id must not be empty");
        }
        self.insert(collection, id.to_string(), document)
    }

    async fn append(&self, collection: &str, document: &Value) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.insert(collection, id.clone(), document)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn upsert_replaces_whole_document() {
        let store = InMemoryStore::new();
        store
            .upsert("foods", "tofu", &json!({"name": "Tofu", "fat": 3.1}))
            .await
            .unwrap();
        store
            .upsert("foods", "tofu", &json!({"name": "Tofu"}))
            .await
            .unwrap();

        assert_eq!(store.len("foods"), 1);
        assert_eq!(store.get("foods", "tofu"), Some(json!({"name": "Tofu"})));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn append_assigns_fresh_ids() {
        let store = InMemoryStore::new();
        let a = store.append("foods", &json!({"name": "Rice"})).await.unwrap();
        let b = store.append("foods", &json!({"name": "Rice"})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len("foods"), 2);
    }

    #[tokio::test]
    async fn rejects_non_object_and_empty_id() {
        let store = InMemoryStore::new();
        assert!(store.upsert("foods", "x", &json!(1)).await.is_err());
        assert!(store.upsert("foods", "", &json!({})).await.is_err());
        assert!(store.is_empty("foods"));
    }

    #[test]
    fn collections_are_independent() {
        let store = InMemoryStore::new();
        store
            .insert("a", "1".to_string(), &json!({"k": 1}))
            .unwrap();
        assert!(store.ids("b").is_empty());
        assert_eq!(store.ids("a"), vec!["1".to_string()]);
    }
}

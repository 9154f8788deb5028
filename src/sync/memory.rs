use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{DocumentStore, RemoteCollection, RemoteDocument, SyncError};

#[derive(Default)]
struct UserBucket {
    document: Option<Map<String, Value>>,
    collections: HashMap<RemoteCollection, Vec<RemoteDocument>>,
}

/// Document store held in process memory. Listing order is insertion order.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    users: Mutex<HashMap<String, UserBucket>>,
    unavailable: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `SyncError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn document_count(&self, user_id: &str, collection: RemoteCollection) -> usize {
        self.users
            .lock()
            .ok()
            .and_then(|users| {
                users
                    .get(user_id)
                    .and_then(|u| u.collections.get(&collection))
                    .map(Vec::len)
            })
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, UserBucket>>, SyncError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("in-memory store switched off".into()));
        }
        self.users
            .lock()
            .map_err(|_| SyncError::Unavailable("in-memory store lock poisoned".into()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn add_document(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        data: &Map<String, Value>,
    ) -> Result<String, SyncError> {
        let mut users = self.lock()?;
        let id = Uuid::new_v4().to_string();
        users
            .entry(user_id.to_string())
            .or_default()
            .collections
            .entry(collection)
            .or_default()
            .push(RemoteDocument {
                id: id.clone(),
                data: data.clone(),
            });
        Ok(id)
    }

    fn set_document(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        doc_id: &str,
        data: &Map<String, Value>,
    ) -> Result<(), SyncError> {
        let mut users = self.lock()?;
        let docs = users
            .entry(user_id.to_string())
            .or_default()
            .collections
            .entry(collection)
            .or_default();
        match docs.iter_mut().find(|d| d.id == doc_id) {
            Some(existing) => existing.data = data.clone(),
            None => docs.push(RemoteDocument {
                id: doc_id.to_string(),
                data: data.clone(),
            }),
        }
        Ok(())
    }

    fn merge_user_document(&self, user_id: &str, data: &Map<String, Value>) -> Result<(), SyncError> {
        let mut users = self.lock()?;
        let document = users
            .entry(user_id.to_string())
            .or_default()
            .document
            .get_or_insert_with(Map::new);
        for (key, value) in data {
            document.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn get_user_document(&self, user_id: &str) -> Result<Option<Map<String, Value>>, SyncError> {
        let users = self.lock()?;
        Ok(users.get(user_id).and_then(|u| u.document.clone()))
    }

    fn list_documents(
        &self,
        user_id: &str,
        collection: RemoteCollection,
    ) -> Result<Vec<RemoteDocument>, SyncError> {
        let users = self.lock()?;
        Ok(users
            .get(user_id)
            .and_then(|u| u.collections.get(&collection))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn add_assigns_distinct_ids() {
        let store = InMemoryDocumentStore::new();
        let a = store.add_document("u", RemoteCollection::Medications, &doc(json!({"n": 1}))).unwrap();
        let b = store.add_document("u", RemoteCollection::Medications, &doc(json!({"n": 1}))).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.document_count("u", RemoteCollection::Medications), 2);
    }

    #[test]
    fn set_replaces_by_id() {
        let store = InMemoryDocumentStore::new();
        store.set_document("u", RemoteCollection::Caregivers, "c1", &doc(json!({"v": 1}))).unwrap();
        store.set_document("u", RemoteCollection::Caregivers, "c1", &doc(json!({"v": 2}))).unwrap();
        let docs = store.list_documents("u", RemoteCollection::Caregivers).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["v"], json!(2));
    }

    #[test]
    fn merge_preserves_untouched_fields() {
        let store = InMemoryDocumentStore::new();
        store.merge_user_document("u", &doc(json!({"a": 1, "b": 2}))).unwrap();
        store.merge_user_document("u", &doc(json!({"b": 3}))).unwrap();
        let user = store.get_user_document("u").unwrap().unwrap();
        assert_eq!(user["a"], json!(1));
        assert_eq!(user["b"], json!(3));
    }

    #[test]
    fn users_are_isolated() {
        let store = InMemoryDocumentStore::new();
        store.add_document("u1", RemoteCollection::Deliveries, &Map::new()).unwrap();
        assert!(store.list_documents("u2", RemoteCollection::Deliveries).unwrap().is_empty());
        assert!(store.get_user_document("u2").unwrap().is_none());
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let store = InMemoryDocumentStore::new();
        store.set_unavailable(true);
        assert!(store.get_user_document("u").is_err());
        assert!(store.add_document("u", RemoteCollection::Medications, &Map::new()).is_err());
        store.set_unavailable(false);
        assert!(store.get_user_document("u").is_ok());
    }
}

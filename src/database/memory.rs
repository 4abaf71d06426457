use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::database::{Collection, CollectionProvider, Database, DatabaseProvider};
use crate::document::Document;
use crate::errors::{ErrorKind, LineageError, LineageResult};

/// In-memory implementation of the database boundary.
///
/// # Purpose
/// `InMemoryDatabase` provides a complete in-memory database adapter
/// suitable for testing, temporary data, and scenarios where persistence is
/// not required. All data is stored in memory using concurrent data
/// structures for thread-safe access.
///
/// # Characteristics
/// - **Thread-Safe**: Fully concurrent with safe data sharing across threads
/// - **Schema-less**: Collections appear when a handle is opened
/// - **Index Bookkeeping**: Index definitions are recorded but not enforced;
///   the migration engine never inspects index contents
/// - **No Persistence**: All data is lost when the adapter is dropped
///
/// # Usage
/// ```text
/// let database = Database::new(InMemoryDatabase::new());
/// let users = database.collection("users").unwrap();
/// users.put("u1", doc!{"name": "Alice"}).unwrap();
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<InMemoryDatabaseInner>,
}

impl InMemoryDatabase {
    /// Creates a new empty in-memory database.
    pub fn new() -> Self {
        InMemoryDatabase {
            inner: Arc::new(InMemoryDatabaseInner::default()),
        }
    }

    /// Wraps this adapter in a [Database] handle.
    pub fn into_handle(self) -> Database {
        Database::new(self)
    }
}

#[derive(Default)]
struct InMemoryDatabaseInner {
    collections: DashMap<String, InMemoryCollection>,
}

impl DatabaseProvider for InMemoryDatabase {
    fn collection_names(&self) -> LineageResult<HashSet<String>> {
        Ok(self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn has_collection(&self, name: &str) -> LineageResult<bool> {
        Ok(self.inner.collections.contains_key(name))
    }

    fn create_collection(&self, name: &str) -> LineageResult<()> {
        if name.is_empty() {
            return Err(LineageError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| InMemoryCollection::new(name));
        Ok(())
    }

    fn drop_collection(&self, name: &str) -> LineageResult<()> {
        if self.inner.collections.remove(name).is_some() {
            log::debug!("dropped collection {}", name);
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> LineageResult<Collection> {
        self.create_collection(name)?;
        let handle = self
            .inner
            .collections
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                LineageError::new(
                    &format!("Collection {} disappeared during open", name),
                    ErrorKind::BackendError,
                )
            })?;
        Ok(Collection::new(handle))
    }
}

/// A single in-memory collection: an ordered map of keyed documents plus
/// index metadata.
#[derive(Clone)]
struct InMemoryCollection {
    inner: Arc<InMemoryCollectionInner>,
}

struct InMemoryCollectionInner {
    name: String,
    documents: RwLock<BTreeMap<String, Document>>,
    indexes: RwLock<HashMap<String, IndexDescriptor>>,
}

/// Index metadata recorded by the in-memory adapter.
struct IndexDescriptor {
    unique: bool,
}

impl InMemoryCollection {
    fn new(name: &str) -> Self {
        InMemoryCollection {
            inner: Arc::new(InMemoryCollectionInner {
                name: name.to_string(),
                documents: RwLock::new(BTreeMap::new()),
                indexes: RwLock::new(HashMap::new()),
            }),
        }
    }
}

impl CollectionProvider for InMemoryCollection {
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    fn get(&self, key: &str) -> LineageResult<Option<Document>> {
        Ok(self.inner.documents.read().get(key).cloned())
    }

    fn put(&self, key: &str, document: Document) -> LineageResult<()> {
        if key.is_empty() {
            return Err(LineageError::new(
                "Document key cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner
            .documents
            .write()
            .insert(key.to_string(), document);
        Ok(())
    }

    fn remove(&self, key: &str) -> LineageResult<Option<Document>> {
        Ok(self.inner.documents.write().remove(key))
    }

    fn keys(&self) -> LineageResult<Vec<String>> {
        Ok(self.inner.documents.read().keys().cloned().collect())
    }

    fn size(&self) -> LineageResult<usize> {
        Ok(self.inner.documents.read().len())
    }

    fn create_index(&self, field: &str, unique: bool) -> LineageResult<()> {
        if field.is_empty() {
            return Err(LineageError::new(
                "Index field cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner
            .indexes
            .write()
            .insert(field.to_string(), IndexDescriptor { unique });
        log::debug!(
            "created {} index on {}.{}",
            if unique { "unique" } else { "non-unique" },
            self.inner.name,
            field
        );
        Ok(())
    }

    fn drop_index(&self, field: &str) -> LineageResult<()> {
        if self.inner.indexes.write().remove(field).is_none() {
            return Err(LineageError::new(
                &format!("Index on field {} not found", field),
                ErrorKind::IndexNotFound,
            ));
        }
        Ok(())
    }

    fn has_index(&self, field: &str) -> LineageResult<bool> {
        Ok(self.inner.indexes.read().contains_key(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn open_database() -> Database {
        InMemoryDatabase::new().into_handle()
    }

    // ==================== Collection Management Tests ====================

    #[test]
    fn test_new_database_has_no_collections() {
        let database = open_database();
        assert!(database.collection_names().unwrap().is_empty());
    }

    #[test]
    fn test_create_collection() {
        let database = open_database();
        database.create_collection("users").unwrap();

        assert!(database.has_collection("users").unwrap());
        assert!(database
            .collection_names()
            .unwrap()
            .contains("users"));
    }

    #[test]
    fn test_create_collection_twice_is_noop() {
        let database = open_database();
        database.create_collection("users").unwrap();

        let users = database.collection("users").unwrap();
        users.put("u1", doc! {"name": "Alice"}).unwrap();

        // creating again must not wipe existing documents
        database.create_collection("users").unwrap();
        assert_eq!(database.collection("users").unwrap().size().unwrap(), 1);
    }

    #[test]
    fn test_create_collection_empty_name_fails() {
        let database = open_database();
        let result = database.create_collection("");
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_collection() {
        let database = open_database();
        database.create_collection("users").unwrap();
        database.drop_collection("users").unwrap();

        assert!(!database.has_collection("users").unwrap());
    }

    #[test]
    fn test_drop_absent_collection_is_noop() {
        let database = open_database();
        assert!(database.drop_collection("missing").is_ok());
    }

    #[test]
    fn test_collection_handle_creates_lazily() {
        let database = open_database();
        assert!(!database.has_collection("users").unwrap());

        let _users = database.collection("users").unwrap();
        assert!(database.has_collection("users").unwrap());
    }

    // ==================== Document Tests ====================

    #[test]
    fn test_put_get_remove_document() {
        let database = open_database();
        let users = database.collection("users").unwrap();

        users.put("u1", doc! {"name": "Alice", "age": 30}).unwrap();

        let doc = users.get("u1").unwrap().unwrap();
        assert_eq!(doc.get_str("name"), Some("Alice"));

        let removed = users.remove("u1").unwrap();
        assert!(removed.is_some());
        assert!(users.get("u1").unwrap().is_none());
    }

    #[test]
    fn test_put_upserts() {
        let database = open_database();
        let users = database.collection("users").unwrap();

        users.put("u1", doc! {"name": "Alice"}).unwrap();
        users.put("u1", doc! {"name": "Bob"}).unwrap();

        assert_eq!(users.size().unwrap(), 1);
        let doc = users.get("u1").unwrap().unwrap();
        assert_eq!(doc.get_str("name"), Some("Bob"));
    }

    #[test]
    fn test_put_empty_key_fails() {
        let database = open_database();
        let users = database.collection("users").unwrap();
        assert!(users.put("", doc! {"name": "Alice"}).is_err());
    }

    #[test]
    fn test_keys_are_ordered() {
        let database = open_database();
        let users = database.collection("users").unwrap();
        users.put("b", doc! {}).unwrap();
        users.put("a", doc! {}).unwrap();
        users.put("c", doc! {}).unwrap();

        assert_eq!(users.keys().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_handles_share_state() {
        let database = open_database();
        let first = database.collection("users").unwrap();
        let second = database.collection("users").unwrap();

        first.put("u1", doc! {"name": "Alice"}).unwrap();
        assert_eq!(second.size().unwrap(), 1);
    }

    // ==================== Index Tests ====================

    #[test]
    fn test_create_and_drop_index() {
        let database = open_database();
        let users = database.collection("users").unwrap();

        users.create_index("email", true).unwrap();
        assert!(users.has_index("email").unwrap());

        users.drop_index("email").unwrap();
        assert!(!users.has_index("email").unwrap());
    }

    #[test]
    fn test_drop_missing_index_fails() {
        let database = open_database();
        let users = database.collection("users").unwrap();

        let result = users.drop_index("email");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::IndexNotFound);
    }

    #[test]
    fn test_concurrent_puts() {
        use std::thread;

        let database = open_database();
        let mut handles = vec![];

        for worker in 0..4 {
            let database = database.clone();
            handles.push(thread::spawn(move || {
                let events = database.collection("events").unwrap();
                for i in 0..50 {
                    events
                        .put(&format!("{}-{}", worker, i), doc! {"worker": worker})
                        .unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let events = database.collection("events").unwrap();
        assert_eq!(events.size().unwrap(), 200);
    }
}

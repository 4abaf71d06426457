//! Database boundary abstractions.
//!
//! This module defines the contract between the migration engine and the
//! target document database. The engine never talks to a driver directly;
//! it goes through [DatabaseProvider] and [CollectionProvider] trait
//! objects wrapped in cheap cloneable handles.
//!
//! # Providers
//!
//! Providers are implemented by database adapters. The crate bundles one:
//! - **In-memory database**: [memory::InMemoryDatabase] for testing and
//!   temporary use
//!
//! Real drivers (a remote document store, an embedded engine) implement the
//! same traits outside this crate. Connection management, timeouts and
//! retries are the driver's responsibility; the engine issues plain
//! sequential calls.
//!
//! # Key-Value Document Abstraction
//!
//! A collection is a keyed map of [Document](crate::document::Document)s:
//! - Basic operations: get, put (upsert), remove
//! - Enumeration: keys, size
//! - Index management: create, drop, existence

pub mod memory;

use std::collections::HashSet;
use std::sync::Arc;

use crate::document::Document;
use crate::errors::LineageResult;

/// Low-level interface to a target document database.
///
/// # Purpose
/// Defines the contract that all database adapters must follow. An adapter
/// exposes collection management and hands out collection handles; all
/// document and index operations go through [CollectionProvider].
///
/// # Thread Safety
/// Implementers must be `Send + Sync` for safe use in concurrent contexts.
pub trait DatabaseProvider: Send + Sync {
    /// Retrieves all collection names in the database.
    fn collection_names(&self) -> LineageResult<HashSet<String>>;

    /// Checks if a collection with the given name exists.
    fn has_collection(&self, name: &str) -> LineageResult<bool>;

    /// Creates a collection if it does not already exist.
    ///
    /// Creating an existing collection is a no-op.
    fn create_collection(&self, name: &str) -> LineageResult<()>;

    /// Drops a collection and all its documents.
    ///
    /// Dropping an absent collection is a no-op, matching schema-less
    /// database semantics.
    fn drop_collection(&self, name: &str) -> LineageResult<()>;

    /// Opens a handle to the named collection, creating the collection if it
    /// does not exist.
    fn collection(&self, name: &str) -> LineageResult<Collection>;
}

/// Interface to a single collection of documents.
///
/// Documents are addressed by an opaque string key. `put` has upsert
/// semantics. Index operations record index definitions; whether and how an
/// index is enforced is the adapter's concern.
pub trait CollectionProvider: Send + Sync {
    /// The collection name.
    fn name(&self) -> String;

    /// Returns the document stored under the given key, if any.
    fn get(&self, key: &str) -> LineageResult<Option<Document>>;

    /// Inserts or replaces the document stored under the given key.
    fn put(&self, key: &str, document: Document) -> LineageResult<()>;

    /// Removes the document stored under the given key, returning it.
    fn remove(&self, key: &str) -> LineageResult<Option<Document>>;

    /// Returns all document keys in the collection.
    fn keys(&self) -> LineageResult<Vec<String>>;

    /// Returns the number of documents in the collection.
    fn size(&self) -> LineageResult<usize>;

    /// Creates an index on the given field.
    fn create_index(&self, field: &str, unique: bool) -> LineageResult<()>;

    /// Drops the index on the given field.
    fn drop_index(&self, field: &str) -> LineageResult<()>;

    /// Checks if an index exists on the given field.
    fn has_index(&self, field: &str) -> LineageResult<bool>;
}

/// A cheap cloneable handle to a database adapter.
///
/// Wraps an `Arc<dyn DatabaseProvider>` and delegates every call, so the
/// engine, tracker and environment context can share one adapter without
/// knowing its concrete type.
#[derive(Clone)]
pub struct Database {
    inner: Arc<dyn DatabaseProvider>,
}

impl Database {
    /// Wraps the given adapter in a handle.
    pub fn new(provider: impl DatabaseProvider + 'static) -> Self {
        Database {
            inner: Arc::new(provider),
        }
    }

    pub fn collection_names(&self) -> LineageResult<HashSet<String>> {
        self.inner.collection_names()
    }

    pub fn has_collection(&self, name: &str) -> LineageResult<bool> {
        self.inner.has_collection(name)
    }

    pub fn create_collection(&self, name: &str) -> LineageResult<()> {
        self.inner.create_collection(name)
    }

    pub fn drop_collection(&self, name: &str) -> LineageResult<()> {
        self.inner.drop_collection(name)
    }

    pub fn collection(&self, name: &str) -> LineageResult<Collection> {
        self.inner.collection(name)
    }
}

/// A cheap cloneable handle to a single collection.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<dyn CollectionProvider>,
}

impl Collection {
    /// Wraps the given collection provider in a handle.
    pub fn new(provider: impl CollectionProvider + 'static) -> Self {
        Collection {
            inner: Arc::new(provider),
        }
    }

    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn get(&self, key: &str) -> LineageResult<Option<Document>> {
        self.inner.get(key)
    }

    pub fn put(&self, key: &str, document: Document) -> LineageResult<()> {
        self.inner.put(key, document)
    }

    pub fn remove(&self, key: &str) -> LineageResult<Option<Document>> {
        self.inner.remove(key)
    }

    pub fn keys(&self) -> LineageResult<Vec<String>> {
        self.inner.keys()
    }

    pub fn size(&self) -> LineageResult<usize> {
        self.inner.size()
    }

    pub fn create_index(&self, field: &str, unique: bool) -> LineageResult<()> {
        self.inner.create_index(field, unique)
    }

    pub fn drop_index(&self, field: &str) -> LineageResult<()> {
        self.inner.drop_index(field)
    }

    pub fn has_index(&self, field: &str) -> LineageResult<bool> {
        self.inner.has_index(field)
    }
}

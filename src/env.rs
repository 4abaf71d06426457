//! Environment context: the capability surface handed to revision code.

use crate::database::{Collection, Database};
use crate::errors::{ErrorKind, LineageError, LineageResult};

/// The bounded set of database operations available to a revision's code.
///
/// # Purpose
/// A `MigrationEnv` is constructed fresh for each executed operation and
/// never persisted. It binds a database handle plus helper operations:
/// collection existence/create/drop, index create/drop, and an unrestricted
/// document read/write handle for ad-hoc data changes.
///
/// The control collection is off-limits: any access naming it fails with
/// [ErrorKind::InvalidOperation], since the state tracker owns it
/// exclusively.
///
/// The context performs no journaling; durability is delegated entirely to
/// the underlying database's own write guarantees.
pub struct MigrationEnv {
    database: Database,
    control_collection: String,
}

impl MigrationEnv {
    pub(crate) fn new(database: Database, control_collection: &str) -> Self {
        MigrationEnv {
            database,
            control_collection: control_collection.to_string(),
        }
    }

    /// Checks if a collection with the given name exists.
    pub fn has_collection(&self, name: &str) -> LineageResult<bool> {
        self.guard(name)?;
        self.database.has_collection(name)
    }

    /// Creates a collection if it doesn't exist.
    pub fn create_collection(&self, name: &str) -> LineageResult<()> {
        self.guard(name)?;
        self.database.create_collection(name)?;
        log::info!("created collection {}", name);
        Ok(())
    }

    /// Drops a collection if it exists.
    pub fn drop_collection(&self, name: &str) -> LineageResult<()> {
        self.guard(name)?;
        self.database.drop_collection(name)?;
        log::info!("dropped collection {}", name);
        Ok(())
    }

    /// Creates an index on a field of an existing collection.
    ///
    /// # Errors
    /// [ErrorKind::CollectionNotFound] if the collection does not exist.
    pub fn create_index(&self, collection: &str, field: &str, unique: bool) -> LineageResult<()> {
        self.guard(collection)?;
        if !self.database.has_collection(collection)? {
            return Err(LineageError::new(
                &format!("Collection {} not found", collection),
                ErrorKind::CollectionNotFound,
            ));
        }
        self.database.collection(collection)?.create_index(field, unique)
    }

    /// Drops an index from an existing collection.
    ///
    /// # Errors
    /// [ErrorKind::CollectionNotFound] if the collection does not exist.
    pub fn drop_index(&self, collection: &str, field: &str) -> LineageResult<()> {
        self.guard(collection)?;
        if !self.database.has_collection(collection)? {
            return Err(LineageError::new(
                &format!("Collection {} not found", collection),
                ErrorKind::CollectionNotFound,
            ));
        }
        self.database.collection(collection)?.drop_index(field)
    }

    /// Opens an unrestricted document read/write handle, creating the
    /// collection if it does not exist.
    pub fn collection(&self, name: &str) -> LineageResult<Collection> {
        self.guard(name)?;
        self.database.collection(name)
    }

    // the tracker owns the control collection exclusively
    fn guard(&self, name: &str) -> LineageResult<()> {
        if name == self.control_collection {
            log::warn!(
                "revision operation attempted to access control collection {}",
                name
            );
            return Err(LineageError::new(
                &format!("Collection {} is reserved", name),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

//! State tracker: the persisted applied-revision marker.

use crate::common::{current_time_millis, FIELD_APPLIED_AT, FIELD_REVISION, MARKER_KEY};
use crate::database::Database;
use crate::document::Document;
use crate::errors::{ErrorKind, LineageError, LineageResult};
use crate::revision::RevisionId;

/// Persists and retrieves the currently-applied revision marker inside the
/// target database.
///
/// # Purpose
/// The tracker is the single owner of the applied-state marker: one control
/// collection holding one fixed-key document whose payload is the current
/// revision id. The marker is written only as the final action of a
/// successful step, which is what makes partial-failure recovery
/// well-defined - an interrupted run leaves the marker consistent with
/// exactly the steps that completed.
///
/// The tracker never attempts to infer or repair idempotence of
/// user-authored operations; that responsibility belongs to the revision
/// author.
#[derive(Clone)]
pub struct StateTracker {
    database: Database,
    collection_name: String,
}

impl StateTracker {
    pub fn new(database: Database, collection_name: &str) -> Self {
        StateTracker {
            database,
            collection_name: collection_name.to_string(),
        }
    }

    /// Reads the applied-state marker.
    ///
    /// An absent control collection or marker document means "unmigrated"
    /// and returns `None` - this is not an error.
    pub fn get_current(&self) -> LineageResult<Option<RevisionId>> {
        if !self.database.has_collection(&self.collection_name)? {
            return Ok(None);
        }
        let collection = self.database.collection(&self.collection_name)?;
        let marker = match collection.get(MARKER_KEY)? {
            Some(marker) => marker,
            None => return Ok(None),
        };
        let revision = marker.get_str(FIELD_REVISION).ok_or_else(|| {
            LineageError::new(
                &format!(
                    "Control document in {} is malformed: missing {} field",
                    self.collection_name, FIELD_REVISION
                ),
                ErrorKind::ValidationError,
            )
        })?;
        Ok(Some(RevisionId::from(revision)))
    }

    /// Upserts the applied-state marker.
    ///
    /// Must be called only after the corresponding revision operation has
    /// returned without error. Creates the control collection on first
    /// write.
    pub fn set_current(&self, id: &RevisionId) -> LineageResult<()> {
        if !self.database.has_collection(&self.collection_name)? {
            log::info!("creating control collection {}", self.collection_name);
            self.database.create_collection(&self.collection_name)?;
        }
        let mut marker = Document::new();
        marker.put(FIELD_REVISION, id.as_str())?;
        marker.put(FIELD_APPLIED_AT, current_time_millis())?;

        let collection = self.database.collection(&self.collection_name)?;
        collection.put(MARKER_KEY, marker)?;
        log::debug!("applied state marker set to {}", id);
        Ok(())
    }

    /// Removes the applied-state marker, returning the database to the
    /// "unmigrated" state. Used when the root revision is reverted.
    pub fn clear(&self) -> LineageResult<()> {
        if !self.database.has_collection(&self.collection_name)? {
            return Ok(());
        }
        let collection = self.database.collection(&self.collection_name)?;
        collection.remove(MARKER_KEY)?;
        log::debug!("applied state marker cleared");
        Ok(())
    }

    /// The epoch-millis timestamp recorded with the marker, if present.
    pub fn applied_at(&self) -> LineageResult<Option<i64>> {
        if !self.database.has_collection(&self.collection_name)? {
            return Ok(None);
        }
        let collection = self.database.collection(&self.collection_name)?;
        Ok(collection
            .get(MARKER_KEY)?
            .and_then(|marker| marker.get_i64(FIELD_APPLIED_AT)))
    }
}

//! Revision store: loads authored revisions into a validated linear chain.

use std::collections::{HashMap, HashSet};

use crate::errors::{ErrorKind, LineageError, LineageResult};
use crate::revision::{Registry, RevisionId, RevisionRecord};

/// Loads and validates the set of authored revisions into a single linear
/// chain.
///
/// # Purpose
/// The store owns chain integrity: every load re-enumerates the registry,
/// validates the full record set, and produces the root-to-head total order.
/// Validation always completes before any execution begins, so a malformed
/// chain has zero side effects.
///
/// # Validation
/// A load fails with [ErrorKind::ValidationError] on any of:
/// - duplicate revision id (including colliding time-derived ids)
/// - zero or multiple roots
/// - a revision whose parent is referenced by more than one child (a branch)
/// - a `parent_id` referencing a nonexistent revision
/// - a cycle, detected via a bounded walk that aborts if a node is revisited
/// - disconnected revisions (chain length != record count)
#[derive(Clone)]
pub struct RevisionStore {
    registry: Registry,
}

impl RevisionStore {
    pub fn new(registry: Registry) -> Self {
        RevisionStore { registry }
    }

    /// Loads every authored revision and validates the set into a chain.
    ///
    /// Revisions are reloaded fresh on every call; there is no cross-run
    /// caching.
    pub fn load(&self) -> LineageResult<RevisionChain> {
        let records = self.registry.revisions()?;
        RevisionChain::build(records)
    }

    /// Returns the root-to-head ordered chain.
    ///
    /// Equivalent to [load](RevisionStore::load); the name mirrors what the
    /// caller wants from it.
    pub fn resolve_chain(&self) -> LineageResult<RevisionChain> {
        self.load()
    }

    /// Returns the chain's last element.
    ///
    /// # Errors
    /// [ErrorKind::EmptyHistory] if the store has zero records, or a
    /// validation error if the chain is malformed.
    pub fn head(&self) -> LineageResult<RevisionRecord> {
        let chain = self.load()?;
        chain.head().cloned()
    }

    /// Returns a single revision and its chain position.
    ///
    /// # Errors
    /// [ErrorKind::ValidationError] if the id is not part of the history.
    pub fn find(&self, id: &RevisionId) -> LineageResult<(RevisionRecord, usize)> {
        let chain = self.load()?;
        let position = chain.position(id).ok_or_else(|| {
            LineageError::new(
                &format!("Revision {} not found in history", id),
                ErrorKind::ValidationError,
            )
        })?;
        Ok((chain.records()[position].clone(), position))
    }
}

/// The validated, root-to-head ordered revision chain.
///
/// Chain length always equals record count: no orphans, no disconnected
/// components.
#[derive(Clone, Debug)]
pub struct RevisionChain {
    records: Vec<RevisionRecord>,
    positions: HashMap<RevisionId, usize>,
}

impl RevisionChain {
    /// Validates a raw record set and orders it from root to head.
    fn build(records: Vec<RevisionRecord>) -> LineageResult<RevisionChain> {
        let mut by_id: HashMap<RevisionId, RevisionRecord> = HashMap::new();
        for record in records {
            if by_id.insert(record.id().clone(), record.clone()).is_some() {
                log::error!("duplicate revision id {}", record.id());
                return Err(LineageError::new(
                    &format!("Duplicate revision id {}", record.id()),
                    ErrorKind::ValidationError,
                ));
            }
        }

        if by_id.is_empty() {
            return Ok(RevisionChain {
                records: Vec::new(),
                positions: HashMap::new(),
            });
        }

        let roots: Vec<RevisionId> = by_id
            .values()
            .filter(|record| record.parent_id().is_none())
            .map(|record| record.id().clone())
            .collect();
        if roots.is_empty() {
            return Err(LineageError::new(
                "History has no root revision",
                ErrorKind::ValidationError,
            ));
        }
        if roots.len() > 1 {
            return Err(LineageError::new(
                &format!("History has {} root revisions, expected 1", roots.len()),
                ErrorKind::ValidationError,
            ));
        }

        // parent -> child index; a parent referenced twice is a branch
        let mut children: HashMap<RevisionId, RevisionId> = HashMap::new();
        for record in by_id.values() {
            if let Some(parent_id) = record.parent_id() {
                if !by_id.contains_key(parent_id) {
                    return Err(LineageError::new(
                        &format!(
                            "Parent {} of revision {} does not exist",
                            parent_id,
                            record.id()
                        ),
                        ErrorKind::ValidationError,
                    ));
                }
                if children
                    .insert(parent_id.clone(), record.id().clone())
                    .is_some()
                {
                    return Err(LineageError::new(
                        &format!("Revision {} has multiple children", parent_id),
                        ErrorKind::ValidationError,
                    ));
                }
            }
        }

        let referenced_parents: HashSet<&RevisionId> = children.keys().collect();
        let heads = by_id.len() - referenced_parents.len();
        if heads != 1 {
            return Err(LineageError::new(
                &format!("History has {} head revisions, expected 1", heads),
                ErrorKind::ValidationError,
            ));
        }

        // bounded walk from the root; a revisit means a cycle
        let mut ordered: Vec<RevisionRecord> = Vec::with_capacity(by_id.len());
        let mut visited: HashSet<RevisionId> = HashSet::new();
        let mut cursor = Some(roots[0].clone());
        while let Some(id) = cursor {
            if !visited.insert(id.clone()) {
                return Err(LineageError::new(
                    &format!("Cycle detected at revision {}", id),
                    ErrorKind::ValidationError,
                ));
            }
            let record = by_id.get(&id).ok_or_else(|| {
                LineageError::new(
                    &format!("Revision {} vanished during chain walk", id),
                    ErrorKind::ValidationError,
                )
            })?;
            ordered.push(record.clone());
            cursor = children.get(&id).cloned();
        }

        if ordered.len() != by_id.len() {
            return Err(LineageError::new(
                &format!(
                    "History is disconnected: {} of {} revisions reachable from root",
                    ordered.len(),
                    by_id.len()
                ),
                ErrorKind::ValidationError,
            ));
        }

        let positions = ordered
            .iter()
            .enumerate()
            .map(|(index, record)| (record.id().clone(), index))
            .collect();

        Ok(RevisionChain {
            records: ordered,
            positions,
        })
    }

    /// Number of revisions in the chain.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records in root-to-head order.
    pub fn records(&self) -> &[RevisionRecord] {
        &self.records
    }

    /// The record at the given position, if any.
    pub fn get(&self, position: usize) -> Option<&RevisionRecord> {
        self.records.get(position)
    }

    /// The position of the given id in the chain.
    pub fn position(&self, id: &RevisionId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// The chain's last element.
    pub fn head(&self) -> LineageResult<&RevisionRecord> {
        self.records.last().ok_or_else(|| {
            LineageError::new("History is empty", ErrorKind::EmptyHistory)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::StaticRegistry;

    fn record(id: &str, parent: Option<&str>) -> RevisionRecord {
        RevisionRecord::new(
            RevisionId::from(id),
            parent.map(RevisionId::from),
            &format!("revision {}", id),
        )
    }

    fn store_of(records: Vec<RevisionRecord>) -> RevisionStore {
        let registry = StaticRegistry::new();
        for item in records {
            registry.register(item);
        }
        RevisionStore::new(Registry::new(registry))
    }

    // ==================== Chain Resolution Tests ====================

    #[test]
    fn test_empty_store_yields_empty_chain() {
        let store = store_of(vec![]);
        let chain = store.resolve_chain().unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_single_root_chain() {
        let store = store_of(vec![record("01", None)]);
        let chain = store.resolve_chain().unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.head().unwrap().id(), &RevisionId::from("01"));
    }

    #[test]
    fn test_chain_orders_parent_to_child() {
        // registered out of order on purpose: chain order comes from
        // parent links, not enumeration order
        let store = store_of(vec![
            record("03", Some("02")),
            record("01", None),
            record("02", Some("01")),
        ]);

        let chain = store.resolve_chain().unwrap();
        assert_eq!(chain.len(), 3);
        let ids: Vec<&str> = chain.records().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["01", "02", "03"]);
    }

    #[test]
    fn test_position_lookup() {
        let store = store_of(vec![
            record("01", None),
            record("02", Some("01")),
            record("03", Some("02")),
        ]);

        let chain = store.resolve_chain().unwrap();
        assert_eq!(chain.position(&RevisionId::from("01")), Some(0));
        assert_eq!(chain.position(&RevisionId::from("03")), Some(2));
        assert_eq!(chain.position(&RevisionId::from("99")), None);
    }

    #[test]
    fn test_head_of_chain() {
        let store = store_of(vec![record("01", None), record("02", Some("01"))]);
        assert_eq!(store.head().unwrap().id(), &RevisionId::from("02"));
    }

    #[test]
    fn test_head_of_empty_store_fails() {
        let store = store_of(vec![]);
        let result = store.head();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::EmptyHistory);
    }

    #[test]
    fn test_find_returns_record_and_position() {
        let store = store_of(vec![record("01", None), record("02", Some("01"))]);
        let (found, position) = store.find(&RevisionId::from("02")).unwrap();
        assert_eq!(found.id(), &RevisionId::from("02"));
        assert_eq!(position, 1);
    }

    #[test]
    fn test_find_unknown_id_fails() {
        let store = store_of(vec![record("01", None)]);
        let result = store.find(&RevisionId::from("99"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_duplicate_id_fails() {
        let store = store_of(vec![record("01", None), record("01", None)]);
        let result = store.resolve_chain();
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::ValidationError);
        assert!(error.message().contains("Duplicate"));
    }

    #[test]
    fn test_no_root_fails() {
        // both revisions claim a parent; nothing is the root
        let store = store_of(vec![record("01", Some("02")), record("02", Some("01"))]);
        let result = store.resolve_chain();
        assert!(result.is_err());
        assert!(result.unwrap_err().message().contains("no root"));
    }

    #[test]
    fn test_multiple_roots_fail() {
        let store = store_of(vec![record("01", None), record("02", None)]);
        let result = store.resolve_chain();
        assert!(result.is_err());
        assert!(result.unwrap_err().message().contains("root revisions"));
    }

    #[test]
    fn test_branch_fails() {
        // two children of the same parent: a tree, not a chain
        let store = store_of(vec![
            record("01", None),
            record("02", Some("01")),
            record("03", Some("01")),
        ]);
        let result = store.resolve_chain();
        assert!(result.is_err());
        assert!(result.unwrap_err().message().contains("multiple children"));
    }

    #[test]
    fn test_dangling_parent_fails() {
        let store = store_of(vec![record("01", None), record("02", Some("99"))]);
        let result = store.resolve_chain();
        assert!(result.is_err());
        assert!(result.unwrap_err().message().contains("does not exist"));
    }

    #[test]
    fn test_disconnected_cycle_fails() {
        // a valid root plus a two-node cycle unreachable from it
        let store = store_of(vec![
            record("01", None),
            record("02", Some("03")),
            record("03", Some("02")),
        ]);
        let result = store.resolve_chain();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_long_chain_resolves_in_order() {
        let mut records = vec![record("000", None)];
        for i in 1..50 {
            records.push(record(
                &format!("{:03}", i),
                Some(&format!("{:03}", i - 1)),
            ));
        }
        let store = store_of(records);
        let chain = store.resolve_chain().unwrap();
        assert_eq!(chain.len(), 50);
        assert_eq!(chain.head().unwrap().id(), &RevisionId::from("049"));
    }
}

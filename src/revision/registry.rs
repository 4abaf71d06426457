use parking_lot::RwLock;
use std::sync::Arc;

use crate::errors::LineageResult;
use crate::revision::RevisionRecord;

/// Source of authored revisions.
///
/// # Purpose
/// Defines the contract for enumerating the authored revision set. This is
/// a deliberate replacement for filename/timestamp discovery: a registry
/// yields records in an implementation-defined order, and the chain order is
/// determined by `parent_id` links alone, never by enumeration order.
///
/// # Key Responsibilities
/// - **Deterministic enumeration**: the same registry state yields the same
///   record set on every call
/// - **Fresh snapshots**: the engine re-enumerates on every invocation; a
///   registry must not serve stale cross-run caches
///
/// # Thread Safety
/// Implementers must be `Send + Sync` for safe use in concurrent contexts.
pub trait RevisionRegistry: Send + Sync {
    /// Returns a snapshot of all authored revisions.
    fn revisions(&self) -> LineageResult<Vec<RevisionRecord>>;
}

/// A cheap cloneable handle to a revision registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<dyn RevisionRegistry>,
}

impl Registry {
    /// Wraps the given registry in a handle.
    pub fn new(registry: impl RevisionRegistry + 'static) -> Self {
        Registry {
            inner: Arc::new(registry),
        }
    }

    pub fn revisions(&self) -> LineageResult<Vec<RevisionRecord>> {
        self.inner.revisions()
    }
}

/// In-process, insertion-ordered revision registry.
///
/// The embedding application registers its revisions at startup; clones
/// share the same underlying list. Insertion order is preserved for
/// deterministic enumeration, but has no bearing on chain order.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    records: Arc<RwLock<Vec<RevisionRecord>>>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        StaticRegistry {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Adds a revision to the registry.
    pub fn register(&self, record: RevisionRecord) {
        log::debug!("registered revision {}", record.id());
        self.records.write().push(record);
    }

    /// Returns the number of registered revisions.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Checks if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RevisionRegistry for StaticRegistry {
    fn revisions(&self) -> LineageResult<Vec<RevisionRecord>> {
        Ok(self.records.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::RevisionId;

    #[test]
    fn test_empty_registry() {
        let registry = StaticRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.revisions().unwrap().is_empty());
    }

    #[test]
    fn test_register_preserves_insertion_order() {
        let registry = StaticRegistry::new();
        registry.register(RevisionRecord::new(RevisionId::from("02"), None, "second"));
        registry.register(RevisionRecord::new(RevisionId::from("01"), None, "first"));

        let revisions = registry.revisions().unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].id(), &RevisionId::from("02"));
        assert_eq!(revisions[1].id(), &RevisionId::from("01"));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = StaticRegistry::new();
        let clone = registry.clone();
        clone.register(RevisionRecord::new(RevisionId::from("01"), None, "initial"));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_handle_delegates() {
        let registry = StaticRegistry::new();
        registry.register(RevisionRecord::new(RevisionId::from("01"), None, "initial"));

        let handle = Registry::new(registry);
        assert_eq!(handle.revisions().unwrap().len(), 1);
    }
}

use std::sync::Arc;

use crate::common::ROOT_LABEL;
use crate::database::Database;
use crate::engine::{
    CurrentState, EngineState, HistoryEntry, MigrationEngine, MigrationReport, RevisionDetail,
    Target,
};
use crate::errors::LineageResult;
use crate::history::RevisionStore;
use crate::lineage_builder::LineageBuilder;
use crate::lineage_config::LineageConfig;
use crate::revision::{Registry, RevisionId, RevisionRecord};
use crate::tracker::StateTracker;

/// The command surface of the migration engine.
///
/// `Lineage` is the entry point for all migration operations. It provides
/// thin commands over the engine:
/// - Creating revision scaffolds
/// - Upgrading and downgrading to a target
/// - Reporting the current revision and the full history
///
/// `Lineage` uses the PIMPL (Pointer to Implementation) design pattern
/// internally; instances are thread-safe and cheap to clone, with all
/// clones sharing the same underlying state through `Arc`.
///
/// Every command logs the resulting current state regardless of outcome, so
/// an operator reading the log always knows where the database ended up.
///
/// # Examples
///
/// ```rust,ignore
/// use lineage::engine::Target;
/// use lineage::lineage::Lineage;
/// use lineage::revision::StaticRegistry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = StaticRegistry::new();
/// let lineage = Lineage::builder().registry(registry.clone()).open()?;
///
/// // author the first revision
/// let scaffold = lineage.revision("create users")?;
/// registry.register(
///     scaffold
///         .with_upgrade(|env| env.create_collection("users"))
///         .with_downgrade(|env| env.drop_collection("users")),
/// );
///
/// // migrate to head
/// let report = lineage.upgrade(Target::Head)?;
/// assert_eq!(report.applied.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Lineage {
    inner: Arc<LineageInner>,
}

struct LineageInner {
    config: LineageConfig,
    store: RevisionStore,
    tracker: StateTracker,
    engine: MigrationEngine,
}

impl std::fmt::Debug for Lineage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lineage").finish_non_exhaustive()
    }
}

impl Lineage {
    /// Creates a new [LineageBuilder] for configuring an instance.
    pub fn builder() -> LineageBuilder {
        LineageBuilder::new()
    }

    pub(crate) fn new(config: LineageConfig, database: Database, registry: Registry) -> Self {
        let store = RevisionStore::new(registry);
        let tracker = StateTracker::new(database.clone(), config.control_collection());
        let engine = MigrationEngine::new(
            store.clone(),
            tracker.clone(),
            database,
            config.control_collection(),
        );
        Lineage {
            inner: Arc::new(LineageInner {
                config,
                store,
                tracker,
                engine,
            }),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &LineageConfig {
        &self.inner.config
    }

    /// The engine's lifecycle state.
    pub fn state(&self) -> EngineState {
        self.inner.engine.state()
    }

    /// Creates a new revision scaffold: a fresh time-derived id, the current
    /// head as parent (`None` if the history is empty), and no-op template
    /// operations.
    ///
    /// The caller attaches real operations and registers the record; the
    /// registry boundary stays enumeration-only.
    ///
    /// # Errors
    /// A validation error if the existing revision set is already invalid
    /// (branched, cyclic, colliding ids) - a scaffold must extend a healthy
    /// chain.
    pub fn revision(&self, message: &str) -> LineageResult<RevisionRecord> {
        let chain = self.inner.store.resolve_chain()?;
        let parent = if chain.is_empty() {
            None
        } else {
            Some(chain.head()?.id().clone())
        };

        let id = RevisionId::fresh();
        log::info!(
            "created revision scaffold {} (parent: {})",
            id,
            parent
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| ROOT_LABEL.to_string())
        );
        Ok(RevisionRecord::new(id, parent, message))
    }

    /// Runs the engine's upgrade path, reporting each applied id in order.
    ///
    /// On partial failure the error carries the first failing id and its
    /// cause; the applied state remains at the last success.
    pub fn upgrade(&self, target: Target) -> LineageResult<MigrationReport> {
        let outcome = self.inner.engine.upgrade(target);
        self.report_state();
        outcome
    }

    /// Runs the engine's downgrade path. The target is always explicit - a
    /// revision id or [Target::Base] - to prevent accidental full reverts.
    pub fn downgrade(&self, target: Target) -> LineageResult<MigrationReport> {
        let outcome = self.inner.engine.downgrade(target);
        self.report_state();
        outcome
    }

    /// Reports the current revision and its chain position.
    pub fn current(&self) -> LineageResult<CurrentState> {
        let outcome = self.inner.engine.current();
        self.report_state();
        outcome
    }

    /// Reports the ordered chain with applied/pending markers.
    pub fn history(&self) -> LineageResult<Vec<HistoryEntry>> {
        let outcome = self.inner.engine.history();
        self.report_state();
        outcome
    }

    /// Reports the head revision id.
    pub fn head(&self) -> LineageResult<RevisionId> {
        let outcome = self.inner.engine.head();
        self.report_state();
        outcome
    }

    /// Reports the detail view of a single revision.
    pub fn show(&self, id: &RevisionId) -> LineageResult<RevisionDetail> {
        let outcome = self.inner.engine.show(id);
        self.report_state();
        outcome
    }

    // every command surfaces the resulting state, success or not
    fn report_state(&self) {
        match self.inner.tracker.get_current() {
            Ok(Some(id)) => log::info!("current revision: {}", id),
            Ok(None) => log::info!("current revision: {}", ROOT_LABEL),
            Err(err) => log::warn!("current revision unavailable: {}", err),
        }
    }
}

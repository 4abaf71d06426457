use std::fmt::Debug;
use std::sync::Arc;

use crate::common::current_time_millis;
use crate::env::MigrationEnv;
use crate::errors::{ErrorKind, LineageError, LineageResult};
use crate::revision::RevisionId;

/// A revision's upgrade or downgrade operation.
///
/// Operations are capability-bound function values invoked through a fixed
/// signature: environment context in, success or error out. The engine never
/// inspects what an operation does; it only observes the result.
pub type OperationFn = Arc<dyn Fn(&MigrationEnv) -> LineageResult<()> + Send + Sync>;

/// A single authored change unit in the revision chain.
///
/// # Purpose
/// Pairs a forward (upgrade) and reverse (downgrade) operation with the
/// chain metadata that orders it: its own id and its parent's id
/// (`None` marks the root). Records are authored externally, registered on a
/// [RevisionRegistry](crate::revision::RevisionRegistry), and reloaded fresh
/// on every engine invocation.
///
/// # Characteristics
/// - Clone-able: operations are shared via `Arc`, not copied
/// - Template operations are no-ops; attach real ones with
///   [with_upgrade](RevisionRecord::with_upgrade) /
///   [with_downgrade](RevisionRecord::with_downgrade)
/// - Chain order is determined by `parent_id` links, never by registration
///   order
///
/// # Usage
/// ```ignore
/// let record = RevisionRecord::new(RevisionId::fresh(), None, "create users")
///     .with_upgrade(|env| env.create_collection("users"))
///     .with_downgrade(|env| env.drop_collection("users"));
/// ```
#[derive(Clone)]
pub struct RevisionRecord {
    id: RevisionId,
    parent_id: Option<RevisionId>,
    message: String,
    created_at: i64,
    upgrade_op: OperationFn,
    downgrade_op: OperationFn,
}

impl RevisionRecord {
    /// Creates a revision scaffold with no-op template operations.
    ///
    /// # Arguments
    /// * `id` - Fresh time-derived revision id
    /// * `parent_id` - Id of the chain head this revision extends, or `None`
    ///   for the root
    /// * `message` - Human-readable description of the change
    pub fn new(id: RevisionId, parent_id: Option<RevisionId>, message: &str) -> Self {
        RevisionRecord {
            id,
            parent_id,
            message: message.to_string(),
            created_at: current_time_millis(),
            upgrade_op: noop_operation(),
            downgrade_op: noop_operation(),
        }
    }

    /// Attaches the forward operation.
    pub fn with_upgrade(
        mut self,
        operation: impl Fn(&MigrationEnv) -> LineageResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.upgrade_op = Arc::new(operation);
        self
    }

    /// Attaches the reverse operation.
    pub fn with_downgrade(
        mut self,
        operation: impl Fn(&MigrationEnv) -> LineageResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.downgrade_op = Arc::new(operation);
        self
    }

    pub fn id(&self) -> &RevisionId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&RevisionId> {
        self.parent_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Runs the forward operation against the given environment.
    pub(crate) fn run_upgrade(&self, env: &MigrationEnv) -> LineageResult<()> {
        (self.upgrade_op)(env)
    }

    /// Runs the reverse operation against the given environment.
    pub(crate) fn run_downgrade(&self, env: &MigrationEnv) -> LineageResult<()> {
        (self.downgrade_op)(env)
    }
}

impl Debug for RevisionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionRecord")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("message", &self.message)
            .field("created_at", &self.created_at)
            .field("operations", &"<operations>")
            .finish()
    }
}

fn noop_operation() -> OperationFn {
    Arc::new(|_env| Ok(()))
}

/// The canonical downgrade operation for a baseline revision.
///
/// A baseline revision's upgrade verifies pre-existing state read-only; its
/// downgrade must unconditionally fail, encoding non-revertibility. The
/// engine needs no special-casing for baselines - the failure aborts the
/// run before the applied marker moves, like any other failing operation.
///
/// Pass it directly: `record.with_downgrade(baseline_guard)`.
pub fn baseline_guard(_env: &MigrationEnv) -> LineageResult<()> {
    Err(LineageError::new(
        "Baseline revision cannot be reverted",
        ErrorKind::InvalidOperation,
    ))
}

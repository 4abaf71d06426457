//! Migration engine: resolves targets and executes revisions in order.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::common::{atomic, Atomic, ROOT_LABEL};
use crate::database::Database;
use crate::env::MigrationEnv;
use crate::errors::{ErrorKind, LineageError, LineageResult};
use crate::history::{RevisionChain, RevisionStore};
use crate::revision::RevisionId;
use crate::tracker::StateTracker;

/// Observable engine lifecycle state.
///
/// An invocation moves `Idle → Resolving → Executing` and terminates in
/// `Committed` or `Failed`. Read-only queries (`current`, `history`) do not
/// transition the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Resolving,
    Executing,
    Committed,
    Failed,
}

impl Display for EngineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Resolving => write!(f, "resolving"),
            EngineState::Executing => write!(f, "executing"),
            EngineState::Committed => write!(f, "committed"),
            EngineState::Failed => write!(f, "failed"),
        }
    }
}

/// A migration target.
///
/// `Head` and `Forward` are upgrade-only; `Base` is downgrade-only. A
/// downgrade never has an implicit default target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The latest revision in the chain.
    Head,
    /// Before the root revision: everything reverted.
    Base,
    /// A specific revision.
    Id(RevisionId),
    /// A relative forward offset from the current revision.
    Forward(usize),
}

/// Direction of a migration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
}

/// Outcome of a completed migration run.
#[derive(Clone, Debug)]
pub struct MigrationReport {
    pub direction: Direction,
    /// Revision ids in the order their operations ran.
    pub applied: Vec<RevisionId>,
    /// The applied state after the run.
    pub current: Option<RevisionId>,
}

/// The applied state plus its chain position, for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentState {
    pub id: Option<RevisionId>,
    /// Zero-based position of the applied revision in the chain.
    pub position: Option<usize>,
    pub chain_length: usize,
}

impl Display for CurrentState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.id, self.position) {
            (Some(id), Some(position)) => {
                write!(f, "{} ({} of {})", id, position + 1, self.chain_length)
            }
            _ => write!(f, "{}", ROOT_LABEL),
        }
    }
}

/// One revision in the rendered history.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub id: RevisionId,
    pub parent_id: Option<RevisionId>,
    pub message: String,
    pub created_at: i64,
    pub applied: bool,
}

/// Detail view of a single revision.
#[derive(Clone, Debug)]
pub struct RevisionDetail {
    pub id: RevisionId,
    pub parent_id: Option<RevisionId>,
    pub message: String,
    pub created_at: i64,
    pub position: usize,
    pub applied: bool,
}

/// Resolves a requested target against current state and executes the
/// needed revisions in order.
///
/// # Purpose
/// The engine owns run semantics: direction checking, slice selection,
/// strictly sequential execution against a fresh [MigrationEnv] per step,
/// and the marker ordering that makes partial failure recoverable - the
/// applied marker advances only after an operation succeeds, one step at a
/// time, never batched.
///
/// The first failing operation aborts the run with
/// [ErrorKind::OperationError]; the applied state remains at the last
/// success and no compensating rollback is attempted. The operator either
/// fixes forward with a new revision or explicitly downgrades.
///
/// Direct jumps to any target id are engine-legal even when they skip
/// intermediate revisions; warning about skips is presentation-layer
/// policy.
#[derive(Clone)]
pub struct MigrationEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: RevisionStore,
    tracker: StateTracker,
    database: Database,
    control_collection: String,
    state: Atomic<EngineState>,
}

impl MigrationEngine {
    pub fn new(
        store: RevisionStore,
        tracker: StateTracker,
        database: Database,
        control_collection: &str,
    ) -> Self {
        MigrationEngine {
            inner: Arc::new(EngineInner {
                store,
                tracker,
                database,
                control_collection: control_collection.to_string(),
                state: atomic(EngineState::Idle),
            }),
        }
    }

    /// The engine's lifecycle state.
    pub fn state(&self) -> EngineState {
        *self.inner.state.read()
    }

    /// Migrates forward to the target revision.
    ///
    /// Re-invoking with an already-reached target is a no-op. See the type
    /// docs for failure semantics.
    pub fn upgrade(&self, target: Target) -> LineageResult<MigrationReport> {
        self.transition(EngineState::Resolving);
        let outcome = self.run_upgrade(target);
        self.finish(&outcome);
        outcome
    }

    /// Migrates backward to the target revision, running downgrade
    /// operations in descending order.
    pub fn downgrade(&self, target: Target) -> LineageResult<MigrationReport> {
        self.transition(EngineState::Resolving);
        let outcome = self.run_downgrade(target);
        self.finish(&outcome);
        outcome
    }

    /// Returns the applied state and its chain position.
    pub fn current(&self) -> LineageResult<CurrentState> {
        let chain = self.inner.store.resolve_chain()?;
        let id = self.inner.tracker.get_current()?;
        let position = locate(&chain, id.as_ref())?;
        Ok(CurrentState {
            id,
            position,
            chain_length: chain.len(),
        })
    }

    /// Returns the full ordered chain annotated with applied/pending flags
    /// relative to the applied state.
    pub fn history(&self) -> LineageResult<Vec<HistoryEntry>> {
        let chain = self.inner.store.resolve_chain()?;
        let current = self.inner.tracker.get_current()?;
        let current_index = locate(&chain, current.as_ref())?;

        Ok(chain
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| HistoryEntry {
                id: record.id().clone(),
                parent_id: record.parent_id().cloned(),
                message: record.message().to_string(),
                created_at: record.created_at(),
                applied: current_index.map(|c| index <= c).unwrap_or(false),
            })
            .collect())
    }

    /// Returns the head revision id.
    pub fn head(&self) -> LineageResult<RevisionId> {
        self.inner.store.head().map(|record| record.id().clone())
    }

    /// Returns the detail view of a single revision.
    pub fn show(&self, id: &RevisionId) -> LineageResult<RevisionDetail> {
        let chain = self.inner.store.resolve_chain()?;
        let position = chain.position(id).ok_or_else(|| {
            LineageError::new(
                &format!("Revision {} not found in history", id),
                ErrorKind::ValidationError,
            )
        })?;
        let current_index = locate(&chain, self.inner.tracker.get_current()?.as_ref())?;
        let record = &chain.records()[position];

        Ok(RevisionDetail {
            id: record.id().clone(),
            parent_id: record.parent_id().cloned(),
            message: record.message().to_string(),
            created_at: record.created_at(),
            position,
            applied: current_index.map(|c| position <= c).unwrap_or(false),
        })
    }

    fn run_upgrade(&self, target: Target) -> LineageResult<MigrationReport> {
        let inner = &self.inner;
        let chain = inner.store.resolve_chain()?;
        let current_id = inner.tracker.get_current()?;
        let current_pos = signed(locate(&chain, current_id.as_ref())?);

        let target_pos = match target {
            Target::Head => {
                chain.head()?;
                chain.len() as i64 - 1
            }
            Target::Id(ref id) => signed(Some(chain.position(id).ok_or_else(|| {
                LineageError::new(
                    &format!("Target revision {} not found in history", id),
                    ErrorKind::ValidationError,
                )
            })?)),
            Target::Forward(offset) => {
                let candidate = current_pos + offset as i64;
                if candidate >= chain.len() as i64 {
                    return Err(LineageError::new(
                        &format!("Forward offset {} goes past the head", offset),
                        ErrorKind::ValidationError,
                    ));
                }
                candidate
            }
            Target::Base => {
                return Err(LineageError::new(
                    "Base is a downgrade target; use downgrade instead",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if target_pos < current_pos {
            return Err(LineageError::new(
                &format!(
                    "Upgrade target {} is behind current revision {}; use downgrade",
                    render(&chain, target_pos),
                    render(&chain, current_pos)
                ),
                ErrorKind::InvalidDirection,
            ));
        }
        if target_pos == current_pos {
            log::info!("already at {}", render(&chain, current_pos));
            return Ok(MigrationReport {
                direction: Direction::Upgrade,
                applied: Vec::new(),
                current: current_id,
            });
        }

        self.transition(EngineState::Executing);
        log::info!(
            "upgrading from {} to {}",
            render(&chain, current_pos),
            render(&chain, target_pos)
        );

        let mut applied = Vec::new();
        for index in ((current_pos + 1) as usize)..=(target_pos as usize) {
            let record = &chain.records()[index];
            log::info!("applying revision {}: {}", record.id(), record.message());

            let env = MigrationEnv::new(inner.database.clone(), &inner.control_collection);
            if let Err(cause) = record.run_upgrade(&env) {
                log::error!("upgrade failed at revision {}: {}", record.id(), cause);
                return Err(LineageError::new_with_cause(
                    &format!("Upgrade failed at revision {}", record.id()),
                    ErrorKind::OperationError,
                    cause,
                ));
            }
            inner.tracker.set_current(record.id())?;
            applied.push(record.id().clone());
        }

        log::info!("upgrade complete: {} revision(s) applied", applied.len());
        Ok(MigrationReport {
            direction: Direction::Upgrade,
            applied,
            current: chain.get(target_pos as usize).map(|r| r.id().clone()),
        })
    }

    fn run_downgrade(&self, target: Target) -> LineageResult<MigrationReport> {
        let inner = &self.inner;
        let chain = inner.store.resolve_chain()?;
        let current_id = inner.tracker.get_current()?;
        let current_pos = signed(locate(&chain, current_id.as_ref())?);

        let target_pos = match target {
            Target::Base => -1,
            Target::Id(ref id) => signed(Some(chain.position(id).ok_or_else(|| {
                LineageError::new(
                    &format!("Target revision {} not found in history", id),
                    ErrorKind::ValidationError,
                )
            })?)),
            Target::Head | Target::Forward(_) => {
                return Err(LineageError::new(
                    "Downgrade requires an explicit revision id or Base",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if target_pos > current_pos {
            return Err(LineageError::new(
                &format!(
                    "Downgrade target {} is ahead of current revision {}; use upgrade",
                    render(&chain, target_pos),
                    render(&chain, current_pos)
                ),
                ErrorKind::InvalidDirection,
            ));
        }
        if target_pos == current_pos {
            log::info!("already at {}", render(&chain, current_pos));
            return Ok(MigrationReport {
                direction: Direction::Downgrade,
                applied: Vec::new(),
                current: current_id,
            });
        }

        self.transition(EngineState::Executing);
        log::info!(
            "downgrading from {} to {}",
            render(&chain, current_pos),
            render(&chain, target_pos)
        );

        let mut applied = Vec::new();
        for index in (((target_pos + 1) as usize)..=(current_pos as usize)).rev() {
            let record = &chain.records()[index];
            log::info!("reverting revision {}: {}", record.id(), record.message());

            let env = MigrationEnv::new(inner.database.clone(), &inner.control_collection);
            if let Err(cause) = record.run_downgrade(&env) {
                log::error!("downgrade failed at revision {}: {}", record.id(), cause);
                return Err(LineageError::new_with_cause(
                    &format!("Downgrade failed at revision {}", record.id()),
                    ErrorKind::OperationError,
                    cause,
                ));
            }
            if index == 0 {
                inner.tracker.clear()?;
            } else {
                inner.tracker.set_current(chain.records()[index - 1].id())?;
            }
            applied.push(record.id().clone());
        }

        log::info!("downgrade complete: {} revision(s) reverted", applied.len());
        Ok(MigrationReport {
            direction: Direction::Downgrade,
            applied,
            current: if target_pos < 0 {
                None
            } else {
                chain.get(target_pos as usize).map(|r| r.id().clone())
            },
        })
    }

    fn finish(&self, outcome: &LineageResult<MigrationReport>) {
        match outcome {
            Ok(_) => self.transition(EngineState::Committed),
            Err(_) => self.transition(EngineState::Failed),
        }
    }

    fn transition(&self, next: EngineState) {
        let mut state = self.inner.state.write();
        log::debug!("engine state: {} -> {}", *state, next);
        *state = next;
    }
}

/// Maps the tracked id to its chain position, failing if the marker names a
/// revision that is not part of the history.
fn locate(chain: &RevisionChain, id: Option<&RevisionId>) -> LineageResult<Option<usize>> {
    match id {
        None => Ok(None),
        Some(id) => chain.position(id).map(Some).ok_or_else(|| {
            LineageError::new(
                &format!("Tracked revision {} is not part of the history", id),
                ErrorKind::ValidationError,
            )
        }),
    }
}

fn signed(position: Option<usize>) -> i64 {
    position.map(|p| p as i64).unwrap_or(-1)
}

fn render(chain: &RevisionChain, position: i64) -> String {
    if position < 0 {
        ROOT_LABEL.to_string()
    } else {
        chain
            .get(position as usize)
            .map(|record| record.id().to_string())
            .unwrap_or_else(|| ROOT_LABEL.to_string())
    }
}

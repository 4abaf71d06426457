use crate::database::memory::InMemoryDatabase;
use crate::database::{Database, DatabaseProvider};
use crate::errors::{ErrorKind, LineageError, LineageResult};
use crate::lineage::Lineage;
use crate::lineage_config::LineageConfig;
use crate::revision::{Registry, RevisionRegistry, StaticRegistry};

/// Fluent builder for [Lineage] instances.
///
/// Wires a database adapter and a revision registry into the engine. Both
/// have in-process defaults (an empty [InMemoryDatabase] and an empty
/// [StaticRegistry]), which is what tests and demos want; production
/// embeddings pass their own.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = StaticRegistry::new();
/// registry.register(initial_revision());
///
/// let lineage = Lineage::builder()
///     .registry(registry)
///     .database(my_driver)
///     .open()?;
/// lineage.upgrade(Target::Head)?;
/// ```
pub struct LineageBuilder {
    config: LineageConfig,
    database: Option<Database>,
    registry: Option<Registry>,
}

impl LineageBuilder {
    pub fn new() -> Self {
        LineageBuilder {
            config: LineageConfig::new(),
            database: None,
            registry: None,
        }
    }

    /// Overrides the control collection name.
    pub fn control_collection(mut self, name: &str) -> Self {
        self.config.set_control_collection(name);
        self
    }

    /// Sets the database adapter the engine migrates.
    pub fn database(mut self, provider: impl DatabaseProvider + 'static) -> Self {
        self.database = Some(Database::new(provider));
        self
    }

    /// Sets the registry supplying authored revisions.
    pub fn registry(mut self, registry: impl RevisionRegistry + 'static) -> Self {
        self.registry = Some(Registry::new(registry));
        self
    }

    /// Builds the [Lineage] instance.
    ///
    /// # Errors
    /// [ErrorKind::ValidationError] if the control collection name is empty.
    pub fn open(self) -> LineageResult<Lineage> {
        if self.config.control_collection().is_empty() {
            return Err(LineageError::new(
                "Control collection name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        let database = self
            .database
            .unwrap_or_else(|| Database::new(InMemoryDatabase::new()));
        let registry = self
            .registry
            .unwrap_or_else(|| Registry::new(StaticRegistry::new()));

        log::info!(
            "lineage {} opened; control collection: {}",
            crate::common::LINEAGE_VERSION,
            self.config.control_collection()
        );
        Ok(Lineage::new(self.config, database, registry))
    }
}

impl Default for LineageBuilder {
    fn default() -> Self {
        LineageBuilder::new()
    }
}

#![allow(dead_code)]
//! # Lineage - Linear-History Migration Engine
//!
//! Lineage is a versioned, linear-history schema/data migration engine for
//! schema-less document databases. It resolves authored revisions into a
//! single parent-linked chain, executes their forward or reverse operations
//! in order, and tracks which revision a target database currently reflects
//! with crash-consistent, one-step-at-a-time marker updates.
//!
//! ## Key Features
//!
//! - **Linear history**: revisions form a single chain, never a DAG;
//!   branches, multiple roots and cycles are rejected before anything runs
//! - **Symmetric rollback**: every revision pairs an upgrade with a
//!   downgrade operation, invoked through one fixed signature
//! - **Crash consistency**: the applied marker advances only after an
//!   operation succeeds, so an interrupted run leaves state matching
//!   exactly the steps that completed
//! - **Bounded capability surface**: revision code sees only the
//!   environment context, never the engine or the control collection
//! - **Pluggable boundary**: database drivers and revision registries are
//!   trait objects; an in-memory reference backend ships in the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lineage::engine::Target;
//! use lineage::lineage::Lineage;
//! use lineage::revision::StaticRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = StaticRegistry::new();
//! let lineage = Lineage::builder().registry(registry.clone()).open()?;
//!
//! let scaffold = lineage.revision("create users")?;
//! registry.register(
//!     scaffold
//!         .with_upgrade(|env| {
//!             env.create_collection("users")?;
//!             env.create_index("users", "email", true)
//!         })
//!         .with_downgrade(|env| env.drop_collection("users")),
//! );
//!
//! lineage.upgrade(Target::Head)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Constants and small shared utilities
//! - [`database`] - Database boundary traits and the in-memory backend
//! - [`document`] - Ordered-field document model and the `doc!` macro
//! - [`engine`] - The migration engine state machine
//! - [`env`] - Environment context handed to revision operations
//! - [`errors`] - Error types and result definitions
//! - [`history`] - Revision store and chain validation
//! - [`lineage`] - Command surface facade
//! - [`lineage_builder`] - Builder for wiring database and registry
//! - [`lineage_config`] - Configuration
//! - [`revision`] - Revision ids, records and the registry boundary
//! - [`tracker`] - Persisted applied-state marker

use crate::revision::RevisionIdGenerator;
use std::sync::LazyLock;

pub mod common;
pub mod database;
pub mod document;
pub mod engine;
pub mod env;
pub mod errors;
pub mod history;
pub mod lineage;
pub mod lineage_builder;
pub mod lineage_config;
pub mod revision;
pub mod tracker;

// re-exported for the doc! macro
pub use serde_json::json;

pub(crate) static ID_GENERATOR: LazyLock<RevisionIdGenerator> =
    LazyLock::new(RevisionIdGenerator::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_initializes() {
        let first = ID_GENERATOR.next_token();
        let second = ID_GENERATOR.next_token();
        assert!(second > first);
    }
}

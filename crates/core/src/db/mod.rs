//! Catalog storage: schema, records, and the operations on them.
//!
//! This module wraps a SQLite database storing:
//! - Unique instructions and their reference test cases
//! - Unique ordered instruction sequences
//! - The application-category taxonomy (a forest)
//! - Cataloged projects and their analysis status
//! - The occurrence ledger tying sequences to (project, file) locations
//!
//! Submodules:
//! - `config`: serializable catalog configuration (`.census/catalog.json`).
//! - `layout`: computed paths for catalog directories/files.
//! - `models`: the record types stored in (and read out of) the database.
//! - `catalog_db`: the SQLite wrapper with schema migrations and operations.
//! - `integrity`: the batch consistency pass over the ledger.
//! - `util` / `context`: helpers to load config and open the database.

pub mod catalog_db;
pub mod config;
pub mod context;
pub mod integrity;
pub mod layout;
pub mod models;
pub mod util;

pub use catalog_db::{CatalogDb, CatalogError, CatalogResult, CURRENT_SCHEMA_VERSION};
pub use config::{CatalogConfig, DbConfig};
pub use context::CatalogContext;
pub use integrity::IntegrityViolation;
pub use layout::CatalogLayout;
pub use models::{
    AnalysisStatus, CatalogCounts, CategoryRecord, InstructionRecord, OccurrenceRecord,
    ProjectMetrics, ProjectRecord, SequenceRecord,
};
pub use util::{load_catalog_config, open_catalog};

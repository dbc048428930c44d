use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::db::{open_catalog, CatalogConfig, CatalogDb, CatalogLayout};

/// Convenience wrapper bundling layout, config, db path, and an open CatalogDb.
///
/// This is the explicit storage handle passed around a batch of operations;
/// there is no module-level connection state anywhere in the crate.
#[derive(Debug)]
pub struct CatalogContext {
    pub layout: CatalogLayout,
    pub config: CatalogConfig,
    pub db_path: PathBuf,
    pub db: CatalogDb,
}

impl CatalogContext {
    /// Load catalog config and open the database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = CatalogLayout::new(root);
        let (config, db_path, db) = open_catalog(&layout)?;
        Ok(Self { layout, config, db_path, db })
    }
}

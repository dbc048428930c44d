use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::{CatalogConfig, CatalogDb, CatalogLayout};

/// Load the catalog config JSON from disk for a given layout.
pub fn load_catalog_config(layout: &CatalogLayout) -> Result<CatalogConfig> {
    let config_json = std::fs::read_to_string(&layout.catalog_config_path).with_context(|| {
        format!("Failed to read catalog config at {}", layout.catalog_config_path.display())
    })?;
    let config: CatalogConfig =
        serde_json::from_str(&config_json).context("Failed to parse catalog config JSON")?;
    Ok(config)
}

/// Resolve the DB path (respecting relative/absolute config) and open a CatalogDb.
pub fn open_catalog(layout: &CatalogLayout) -> Result<(CatalogConfig, PathBuf, CatalogDb)> {
    let config = load_catalog_config(layout)?;
    let config_db_path = std::path::Path::new(&config.db.path);
    let db_path = if config_db_path.is_absolute() {
        config_db_path.to_path_buf()
    } else {
        layout.root.join(config_db_path)
    };
    let db = CatalogDb::open(&db_path)
        .with_context(|| format!("Failed to open catalog database at {}", db_path.display()))?;
    Ok((config, db_path, db))
}

use anyhow::Result;
use census_core::db::CatalogContext;

use crate::canonicalize_or_current;

/// Resolve the root argument and open the catalog living there.
pub fn open_catalog_context(root: &str) -> Result<CatalogContext> {
    let root_path = canonicalize_or_current(root)?;
    CatalogContext::from_root(root_path)
}

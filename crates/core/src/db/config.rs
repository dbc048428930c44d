use serde::{Deserialize, Serialize};

/// Database configuration stored inside the catalog config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the catalog database file (typically relative to the catalog root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Serializable configuration describing a census catalog.
///
/// This lives at `.census/catalog.json` in the catalog root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Human-friendly catalog name, e.g. the name of the study.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version. This is about the config file, not the schema.
    pub config_version: String,
    /// Database configuration (path is typically relative to the catalog root).
    pub db: DbConfig,
}

impl CatalogConfig {
    /// Create a new catalog configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
        }
    }
}

use std::path::{Path, PathBuf};

/// Logical layout of a catalog on disk.
///
/// This is derived from a chosen root path. It does not perform any IO
/// itself; the CLI or other frontends are responsible for actually creating
/// directories and files based on this layout.
///
/// The `projects/` directory is where the clone collaborator checks out
/// repositories; `reports/` and `plots/` are where external formatters put
/// rendered tables and plot data. The core never writes into any of them.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    /// Root directory of the catalog.
    pub root: PathBuf,
    /// Directory for internal metadata (.census).
    pub meta_dir: PathBuf,
    /// Path to the catalog config file (JSON).
    pub catalog_config_path: PathBuf,
    /// Path to the catalog database file.
    pub db_path: PathBuf,
    /// Directory where repository working copies are checked out.
    pub projects_dir: PathBuf,
    /// Directory for rendered report artifacts.
    pub reports_dir: PathBuf,
    /// Directory for plot/CSV data derived from the statistics.
    pub plots_dir: PathBuf,
}

impl CatalogLayout {
    /// Compute the default layout for a catalog rooted at `root`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".census");
        let catalog_config_path = meta_dir.join("catalog.json");
        let db_path = meta_dir.join("catalog.db");
        let projects_dir = root.join("projects");
        let reports_dir = root.join("reports");
        let plots_dir = root.join("plots");

        Self { root, meta_dir, catalog_config_path, db_path, projects_dir, reports_dir, plots_dir }
    }

    /// Compute a database path string suitable for storing in
    /// [`super::CatalogConfig`], typically as a path relative to `root`.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }

    /// Directory a project's working copy is expected under, named
    /// `<organization>-<name>` as the clone collaborator lays them out.
    pub fn project_checkout_dir(&self, organization: &str, name: &str) -> PathBuf {
        self.projects_dir.join(format!("{organization}-{name}"))
    }
}

use std::fs;

use anyhow::{Context, Result};
use census_core::db::{AnalysisStatus, CatalogConfig, CatalogDb, CatalogLayout};
use serde::Serialize;

use crate::commands::open_catalog_context;
use crate::{canonicalize_or_current, infer_catalog_name};

#[derive(Serialize)]
pub struct InfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub counts: census_core::db::CatalogCounts,
    pub status_breakdown: StatusBreakdown,
}

#[derive(Serialize)]
pub struct StatusBreakdown {
    pub unanalyzed: i64,
    pub presence_only: i64,
    pub fully_analyzed: i64,
}

/// Initialize a new catalog at `root`.
pub fn init_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = CatalogLayout::new(&root_path);

    // Derive catalog name if not provided.
    let catalog_name = match name {
        Some(n) => n,
        None => infer_catalog_name(&root_path),
    };

    // Ensure directories exist.
    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.projects_dir).with_context(|| {
        format!("Failed to create projects dir: {}", layout.projects_dir.display())
    })?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;
    fs::create_dir_all(&layout.plots_dir)
        .with_context(|| format!("Failed to create plots dir: {}", layout.plots_dir.display()))?;

    // Build catalog config.
    let db_path_rel = layout.db_path_relative_string();
    let config = CatalogConfig::new(&catalog_name, db_path_rel);

    // Serialize and write config JSON.
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.catalog_config_path, json).with_context(|| {
        format!("Failed to write catalog config: {}", layout.catalog_config_path.display())
    })?;

    // Create the catalog database immediately so follow-on commands (and
    // tests) can rely on its presence.
    CatalogDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize catalog database at {}", layout.db_path.display())
    })?;

    println!("Initialized catalog:");
    println!("  Name: {}", catalog_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.catalog_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Projects dir: {}", layout.projects_dir.display());
    println!("  Reports dir: {}", layout.reports_dir.display());
    println!("  Plots dir: {}", layout.plots_dir.display());

    Ok(())
}

/// Show basic information about an existing catalog.
pub fn info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_catalog_context(root)?;

    let counts = ctx.db.counts().context("Failed to count catalog records")?;
    let projects = ctx.db.list_projects().context("Failed to list projects")?;
    let mut breakdown = StatusBreakdown { unanalyzed: 0, presence_only: 0, fully_analyzed: 0 };
    for project in &projects {
        match project.status {
            AnalysisStatus::Unanalyzed => breakdown.unanalyzed += 1,
            AnalysisStatus::PresenceOnly => breakdown.presence_only += 1,
            AnalysisStatus::FullyAnalyzed => breakdown.fully_analyzed += 1,
        }
    }

    let snapshot = InfoSnapshot {
        name: ctx.config.name.clone(),
        root: ctx.layout.root.display().to_string(),
        config_file: ctx.layout.catalog_config_path.display().to_string(),
        config_version: ctx.config.config_version.clone(),
        db_path: ctx.db_path.display().to_string(),
        counts,
        status_breakdown: breakdown,
    };

    if json {
        let serialized = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize catalog info to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Catalog: {}", snapshot.name);
    println!("  Root: {}", snapshot.root);
    println!("  Config: {}", snapshot.config_file);
    println!("  DB: {}", snapshot.db_path);
    println!("  Projects: {}", snapshot.counts.projects);
    println!("    unanalyzed: {}", snapshot.status_breakdown.unanalyzed);
    println!("    presence-only: {}", snapshot.status_breakdown.presence_only);
    println!("    fully-analyzed: {}", snapshot.status_breakdown.fully_analyzed);
    println!("  Instructions: {}", snapshot.counts.instructions);
    println!("  Sequences: {}", snapshot.counts.sequences);
    println!("  Occurrences: {}", snapshot.counts.occurrences);
    println!("  Categories: {}", snapshot.counts.categories);

    Ok(())
}

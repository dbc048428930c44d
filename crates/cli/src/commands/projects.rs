use std::fs;

use anyhow::{Context, Result};
use census_core::db::ProjectMetrics;

use crate::commands::open_catalog_context;
use crate::{parse_repo_url, split_category_list};

/// Ingest an externally gathered project record.
///
/// The metrics file is the JSON handed over by the clone/API/line-counter
/// collaborators; this command never fetches anything itself. Submitting a
/// URL that is already cataloged is an error, not a merge.
pub fn add_project_command(
    root: &str,
    url: &str,
    metrics_path: &str,
    categories: Option<String>,
) -> Result<()> {
    let (organization, name) = parse_repo_url(url)?;

    let metrics_json = fs::read_to_string(metrics_path)
        .with_context(|| format!("Failed to read metrics file {metrics_path}"))?;
    let mut metrics: ProjectMetrics =
        serde_json::from_str(&metrics_json).context("Failed to parse metrics JSON")?;

    // The URL is authoritative for identity; fill name/organization from it
    // when the metrics file leaves them out.
    if metrics.name.is_empty() {
        metrics.name = name;
    }
    if metrics.organization.is_empty() {
        metrics.organization = organization;
    }

    let ctx = open_catalog_context(root)?;
    ctx.db.insert_project(url, &metrics).context("Failed to insert project record")?;

    if let Some(raw) = categories {
        let names = split_category_list(&raw);
        if !names.is_empty() {
            ctx.db
                .attach_categories(url, &names)
                .context("Failed to attach categories")?;
        }
    }

    println!("Added project:");
    println!("  Url: {}", url);
    println!("  Name: {}", metrics.name);
    println!("  Organization: {}", metrics.organization);
    println!("  Stars: {}", metrics.stars);
    println!("  Status: unanalyzed");

    Ok(())
}

/// Associate further categories with an existing project.
pub fn attach_categories_command(root: &str, url: &str, categories: &str) -> Result<()> {
    let names = split_category_list(categories);
    if names.is_empty() {
        println!("No categories given; nothing to attach.");
        return Ok(());
    }

    let ctx = open_catalog_context(root)?;
    ctx.db.attach_categories(url, &names).context("Failed to attach categories")?;

    let attached = ctx.db.project_categories(url).context("Failed to list project categories")?;
    println!("Categories of {}:", url);
    for category in attached {
        println!("  - {}", category.name);
    }
    Ok(())
}

/// List all cataloged projects.
pub fn list_projects_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_catalog_context(root)?;
    let projects = ctx.db.list_projects().context("Failed to list projects")?;

    if json {
        let serialized = serde_json::to_string_pretty(&projects)?;
        println!("{}", serialized);
        return Ok(());
    }

    if projects.is_empty() {
        println!("Projects:");
        println!("(none)");
        return Ok(());
    }

    println!("Projects:");
    for project in projects {
        let language = project.metrics.language.as_deref().unwrap_or("(unknown)");
        println!(
            "- {} [{}] (stars: {}, language: {})",
            project.url, project.status, project.metrics.stars, language
        );
    }

    Ok(())
}

use anyhow::{anyhow, Context, Result};
use census_core::db::AnalysisStatus;

use crate::commands::open_catalog_context;

pub fn parse_status_arg(status: &str) -> Result<AnalysisStatus> {
    match status {
        "unanalyzed" => Ok(AnalysisStatus::Unanalyzed),
        "presence-only" => Ok(AnalysisStatus::PresenceOnly),
        "fully-analyzed" => Ok(AnalysisStatus::FullyAnalyzed),
        other => Err(anyhow!(
            "Invalid status '{}'. Allowed: unanalyzed, presence-only, fully-analyzed",
            other
        )),
    }
}

/// Advance a project's analysis status. Backward moves are rejected by the core.
pub fn set_status_command(root: &str, url: &str, status: &str) -> Result<()> {
    let new_status = parse_status_arg(status)?;

    let ctx = open_catalog_context(root)?;
    ctx.db
        .advance_project_status(url, new_status)
        .context("Failed to advance project status")?;

    println!("Advanced {} to {}", url, new_status);
    Ok(())
}

use anyhow::{anyhow, Context, Result};

use crate::commands::open_catalog_context;

/// Run the batch integrity pass and report every violation.
///
/// All violations are printed before the command fails, so one run surfaces
/// the full damage instead of stopping at the first inconsistency.
pub fn check_command(root: &str) -> Result<()> {
    let ctx = open_catalog_context(root)?;

    let violations = ctx.db.integrity_check().context("Failed to run integrity check")?;
    if violations.is_empty() {
        println!("Integrity check passed; no violations.");
        return Ok(());
    }

    println!("Integrity check found {} violation(s):", violations.len());
    for violation in &violations {
        println!("  - {}", violation);
    }
    Err(anyhow!("integrity check failed with {} violation(s)", violations.len()))
}

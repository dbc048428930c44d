use anyhow::{Context, Result};

use crate::commands::open_catalog_context;

/// Record that a sequence appears in a file of a project.
///
/// The sequence is resolved (or registered) from its raw text first, so one
/// command suffices while walking a project's sources. `raw_bytes` marks
/// occurrences spelled with `.byte` directives instead of mnemonics.
pub fn record_occurrence_command(
    root: &str,
    url: &str,
    file_path: &str,
    instr: &str,
    count: i64,
    raw_bytes: bool,
) -> Result<()> {
    let ctx = open_catalog_context(root)?;

    let (sequence_id, created) = ctx
        .db
        .get_or_create_sequence(instr, None, "")
        .context("Failed to resolve sequence")?;
    if created {
        println!("Registered new sequence {}", sequence_id);
    }

    let occurrence_id = ctx
        .db
        .record_occurrence(sequence_id, url, file_path, count, !raw_bytes)
        .context("Failed to record occurrence")?;

    println!("Recorded occurrence:");
    println!("  Id: {}", occurrence_id);
    println!("  Sequence: {}", sequence_id);
    println!("  Project: {}", url);
    println!("  File: {}", file_path);
    println!("  Count: {}", count);
    println!("  Encoding: {}", if raw_bytes { "raw .byte directives" } else { "mnemonics" });

    Ok(())
}

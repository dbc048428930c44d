use std::fs;

use anyhow::{Context, Result};

use crate::commands::open_catalog_context;

/// Register an ordered instruction sequence.
///
/// Re-submitting an already cataloged source text is reported and skipped,
/// never an error: deduplication keys on the exact text.
pub fn add_sequence_command(
    root: &str,
    instr: &str,
    testcase_path: Option<String>,
    note: &str,
) -> Result<()> {
    let test_case = match testcase_path {
        Some(path) => Some(
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read test case file {path}"))?,
        ),
        None => None,
    };

    let ctx = open_catalog_context(root)?;
    let (id, created) = ctx
        .db
        .get_or_create_sequence(instr, test_case.as_deref(), note)
        .context("Failed to register sequence")?;

    if !created {
        println!("Sequence already exists (id {}); skipping insertion", id);
        return Ok(());
    }

    let instructions = ctx.db.sequence_instructions(id)?;
    println!("Added sequence {} with {} instruction(s):", id, instructions.len());
    for instruction in instructions {
        if instruction.instruction.is_empty() {
            println!("  - (compiler/memory barrier)");
        } else {
            println!("  - {}", instruction.instruction);
        }
    }
    Ok(())
}

/// List all cataloged sequences.
pub fn list_sequences_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_catalog_context(root)?;
    let sequences = ctx.db.list_sequences().context("Failed to list sequences")?;

    if json {
        let serialized = serde_json::to_string_pretty(&sequences)?;
        println!("{}", serialized);
        return Ok(());
    }

    if sequences.is_empty() {
        println!("Sequences:");
        println!("(none)");
        return Ok(());
    }

    println!("Sequences:");
    for sequence in sequences {
        let note = if sequence.note.is_empty() {
            String::new()
        } else {
            format!(" - {}", sequence.note)
        };
        println!("- {} {:?}{}", sequence.id, sequence.source_text, note);
    }

    Ok(())
}

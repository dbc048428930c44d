use std::fs;

use anyhow::{Context, Result};
use census_core::normalize::{normalize, Caution};

use crate::commands::open_catalog_context;

/// Register an instruction with a reference test case.
///
/// If the instruction already carries a test case, the old one is printed
/// before being overwritten so the operator sees what was lost.
pub fn add_instruction_command(
    root: &str,
    instr: &str,
    testcase_path: Option<String>,
) -> Result<()> {
    let test_case = match testcase_path {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read test case file {path}"))?,
        None => String::new(),
    };

    let normalized = normalize(instr)?;
    if let Some(Caution::BareXchg) = normalized.caution {
        println!("note: bare \"xchg\" is discouraged; prefer \"lock xchg\" for atomicity");
    }

    let ctx = open_catalog_context(root)?;
    match ctx
        .db
        .set_instruction_test_case(instr, &test_case)
        .context("Failed to store instruction test case")?
    {
        Some(old) => {
            println!("update existing test case:");
            println!("{}", old);
            println!("with new one:");
            println!("{}", test_case);
        }
        None => {
            println!("Added instruction {:?}", instr);
        }
    }
    Ok(())
}

/// List all cataloged instructions.
pub fn list_instructions_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_catalog_context(root)?;
    let instructions = ctx.db.list_instructions().context("Failed to list instructions")?;

    if json {
        let serialized = serde_json::to_string_pretty(&instructions)?;
        println!("{}", serialized);
        return Ok(());
    }

    if instructions.is_empty() {
        println!("Instructions:");
        println!("(none)");
        return Ok(());
    }

    println!("Instructions:");
    for instruction in instructions {
        let label = if instruction.instruction.is_empty() {
            "(compiler/memory barrier)"
        } else {
            instruction.instruction.as_str()
        };
        let flags = if instruction.control_flow { " [control-flow]" } else { "" };
        let test_case = if instruction.test_case.is_empty() { " (no test case)" } else { "" };
        println!("- {}{}{}", label, flags, test_case);
    }

    Ok(())
}

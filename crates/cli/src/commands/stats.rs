use anyhow::{Context, Result};
use census_core::stats::{self, InstructionPredicate, ProjectScope};

use crate::commands::open_catalog_context;

/// Print the derived statistics as plain aligned rows.
///
/// Percentages over instruction usage are claims about *checked* projects
/// (presence-only plus fully-analyzed); anything fancier than these rows is
/// the report formatter's job.
pub fn stats_command(
    root: &str,
    min_instruction_count: i64,
    min_category_count: i64,
) -> Result<()> {
    let ctx = open_catalog_context(root)?;
    let db = &ctx.db;

    let summary = stats::summary(db).context("Failed to compute summary statistics")?;
    println!("Projects:");
    println!("  total: {}", summary.projects_total);
    println!("  checked: {}", summary.projects_checked);
    println!("  fully analyzed: {}", summary.projects_fully_analyzed);
    println!("  with inline assembly: {}", summary.projects_with_inline_assembly);
    println!("  total C/header LOC: {}", summary.loc_c_and_header);
    println!();
    println!("Snippets (over fully analyzed projects):");
    println!("  unique instructions: {}", summary.unique_instructions);
    println!("  unique sequences: {}", summary.unique_sequences);
    println!("  total recorded: {}", summary.snippets_total);
    println!("  unique recorded: {}", summary.snippets_unique);
    println!("  avg per project: {:.1}", summary.avg_snippets_per_project);
    println!("  median per project: {}", summary.median_snippets_per_project);
    println!("  max in one project: {}", summary.max_snippets_in_project);
    println!("  longest sequence: {} instruction(s)", summary.max_sequence_length);
    println!(
        "  single-instruction share: {:.1}%",
        summary.single_instruction_snippet_percentage
    );

    println!();
    println!(
        "Instruction frequencies (>= {} projects, % of checked projects):",
        min_instruction_count
    );
    let frequencies = stats::instruction_frequencies(db, ProjectScope::Checked)
        .context("Failed to compute instruction frequencies")?;
    for row in frequencies.iter().filter(|row| row.project_count >= min_instruction_count) {
        let label = if row.instruction.is_empty() {
            "(compiler/memory barrier)"
        } else {
            row.instruction.as_str()
        };
        println!("  {:<26} {:<6} {:.1}%", label, row.project_count, row.percentage);
    }

    println!();
    println!("Instruction groups (% of checked projects):");
    for (label, predicates) in instruction_groups() {
        let share = stats::instruction_group_share(db, &predicates, ProjectScope::Checked)
            .context("Failed to compute instruction group share")?;
        println!("  {:<26} {:<6} {:.1}%", label, share.project_count, share.percentage);
    }

    println!();
    println!("Sequences with raw-byte encodings (>= 1 project):");
    let raw_byte_rows =
        stats::non_mnemonic_usage(db, 1).context("Failed to compute non-mnemonic usage")?;
    if raw_byte_rows.is_empty() {
        println!("  (none)");
    }
    for row in raw_byte_rows {
        println!("  {:<26} {}", row.source_text, row.project_count);
    }

    println!();
    println!(
        "Project domains (>= {} projects, % of checked projects):",
        min_category_count
    );
    let domains = stats::category_distribution(db, ProjectScope::Checked, min_category_count)
        .context("Failed to compute category distribution")?;
    if domains.is_empty() {
        println!("  (none)");
    }
    for row in domains {
        println!("  {:<26} {:<6} {:.1}%", row.category, row.project_count, row.percentage);
    }

    println!();
    println!("Snippets per project (cumulative %):");
    for point in stats::snippets_per_project_curve(db)? {
        println!("  <= {:<5} {:.1}%", point.value, point.cumulative_percentage);
    }

    println!();
    println!("Instructions per snippet (cumulative %):");
    for point in stats::instructions_per_snippet_curve(db)? {
        println!("  <= {:<5} {:.1}%", point.value, point.cumulative_percentage);
    }

    Ok(())
}

/// The instruction groups reported by the study, expressed as data.
fn instruction_groups() -> Vec<(&'static str, Vec<InstructionPredicate>)> {
    let one_of = |texts: &[&str]| {
        InstructionPredicate::OneOf(texts.iter().map(|t| t.to_string()).collect())
    };
    vec![
        ("atomics (lock prefix)", vec![InstructionPredicate::Prefix("lock".to_string())]),
        ("fences", vec![one_of(&["mfence", "lfence", "sfence"])]),
        (
            "control flow",
            vec![InstructionPredicate::Prefix("j".to_string()), one_of(&["cmp", "test"])],
        ),
        ("set-on-condition", vec![InstructionPredicate::Prefix("set".to_string())]),
        (
            "string operations",
            vec![
                InstructionPredicate::Prefix("rep".to_string()),
                InstructionPredicate::Exact("cld".to_string()),
            ],
        ),
        (
            "timing/feature detection",
            vec![one_of(&["cpuid", "rdtsc", "rdtscp", "xgetbv"])],
        ),
        ("compiler barriers", vec![InstructionPredicate::Exact(String::new())]),
    ]
}

//! Read-side statistics over the catalog.
//!
//! Everything here is a deterministic aggregate query; nothing mutates the
//! database. The catalog is only ever partially analyzed (some projects are
//! fully cataloged, some only known to contain inline assembly, some not yet
//! looked at), so every percentage-producing function takes the denominator
//! as an explicit [`ProjectScope`] instead of inferring one. Picking the
//! wrong population for a claim is the classic way these numbers go subtly
//! wrong.
//!
//! Output shapes are plain rows of names, counts, and percentages; rendering
//! them into report tables is an external formatter's job.

use std::collections::{BTreeMap, HashMap, HashSet};

use rusqlite::params;
use serde::Serialize;

use crate::db::{AnalysisStatus, CatalogDb, CatalogResult};

/// Which projects a percentage claim is made over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Every cataloged project, including unanalyzed ones.
    All,
    /// Projects whose inline-assembly usage has been checked at all:
    /// presence-only plus fully-analyzed.
    Checked,
    /// Only projects where every occurrence has been recorded.
    FullyAnalyzed,
}

impl ProjectScope {
    /// Whether a project with the given status belongs to this scope.
    pub fn includes(self, status: AnalysisStatus) -> bool {
        match self {
            ProjectScope::All => true,
            ProjectScope::Checked => status != AnalysisStatus::Unanalyzed,
            ProjectScope::FullyAnalyzed => status == AnalysisStatus::FullyAnalyzed,
        }
    }
}

/// Number of projects in a scope.
pub fn project_count(db: &CatalogDb, scope: ProjectScope) -> CatalogResult<i64> {
    let conn = db.connection();
    let count = match scope {
        ProjectScope::All => {
            conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?
        }
        ProjectScope::Checked => conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE status >= ?1",
            params![AnalysisStatus::PresenceOnly.to_i32()],
            |row| row.get(0),
        )?,
        ProjectScope::FullyAnalyzed => conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE status = ?1",
            params![AnalysisStatus::FullyAnalyzed.to_i32()],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

/// How widely one instruction is used across projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionFrequency {
    pub instruction: String,
    /// Distinct fully-analyzed projects with at least one occurrence of a
    /// sequence containing the instruction.
    pub project_count: i64,
    /// `project_count` over the chosen denominator scope.
    pub percentage: f64,
}

/// Instruction frequency across projects, most common first.
///
/// Counting is always over fully-analyzed projects (only they have a
/// complete occurrence ledger); `denominator` decides which population the
/// percentage speaks about. Instructions that never occur in a
/// fully-analyzed project are not listed.
pub fn instruction_frequencies(
    db: &CatalogDb,
    denominator: ProjectScope,
) -> CatalogResult<Vec<InstructionFrequency>> {
    let denom = project_count(db, denominator)?;

    let mut stmt = db.connection().prepare(
        r#"
        SELECT i.instruction, COUNT(DISTINCT o.project_id) AS project_count
        FROM instructions i
        JOIN sequence_instructions si ON si.instruction_id = i.id
        JOIN occurrences o ON o.sequence_id = si.sequence_id
        JOIN projects p ON p.id = o.project_id
        WHERE p.status = ?1
        GROUP BY i.id, i.instruction
        ORDER BY project_count DESC, i.instruction
        "#,
    )?;
    let rows = stmt.query_map(params![AnalysisStatus::FullyAnalyzed.to_i32()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (instruction, count) = row?;
        out.push(InstructionFrequency {
            instruction,
            project_count: count,
            percentage: percentage(count, denom),
        });
    }
    Ok(out)
}

/// A sequence that at least one project spelled with raw `.byte` directives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonMnemonicUsage {
    pub source_text: String,
    /// Distinct projects with at least one raw-byte occurrence of the sequence.
    pub project_count: i64,
}

/// Sequences with raw-byte (non-mnemonic) occurrences, grouped by sequence,
/// most widely used first. Sequences below `min_projects` distinct projects
/// are omitted.
pub fn non_mnemonic_usage(
    db: &CatalogDb,
    min_projects: i64,
) -> CatalogResult<Vec<NonMnemonicUsage>> {
    let mut stmt = db.connection().prepare(
        r#"
        SELECT s.source_text, COUNT(DISTINCT o.project_id) AS project_count
        FROM occurrences o
        JOIN sequences s ON s.id = o.sequence_id
        WHERE o.used_mnemonics = 0
        GROUP BY s.id, s.source_text
        HAVING COUNT(DISTINCT o.project_id) >= ?1
        ORDER BY project_count DESC, s.source_text
        "#,
    )?;
    let rows = stmt.query_map(params![min_projects], |row| {
        Ok(NonMnemonicUsage { source_text: row.get(0)?, project_count: row.get(1)? })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// How many projects fall under one top-level category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub project_count: i64,
    pub percentage: f64,
}

/// Project distribution over top-level categories.
///
/// Each project/category association is attributed to the category's
/// top-level ancestor; a project tagged in two different subtrees counts in
/// both. Only projects inside `denominator` are counted, and the same scope
/// is the percentage denominator. Categories with fewer than `min_projects`
/// projects are folded into a trailing `misc` bucket (projects deduplicated
/// across the folded categories).
pub fn category_distribution(
    db: &CatalogDb,
    denominator: ProjectScope,
    min_projects: i64,
) -> CatalogResult<Vec<CategoryShare>> {
    let denom = project_count(db, denominator)?;

    let mut stmt = db.connection().prepare(
        r#"
        SELECT pc.project_id, pc.category_id, p.status
        FROM project_categories pc
        JOIN projects p ON p.id = pc.project_id
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i32>(2)?))
    })?;

    let mut root_names: HashMap<i64, String> = HashMap::new();
    let mut projects_per_root: BTreeMap<String, HashSet<i64>> = BTreeMap::new();
    for row in rows {
        let (project_id, category_id, status) = row?;
        if !denominator.includes(AnalysisStatus::from_i32(status)) {
            continue;
        }
        let root = match root_names.get(&category_id) {
            Some(name) => name.clone(),
            None => {
                let name = db.category_root(category_id)?.name;
                root_names.insert(category_id, name.clone());
                name
            }
        };
        projects_per_root.entry(root).or_default().insert(project_id);
    }

    let mut kept: Vec<CategoryShare> = Vec::new();
    let mut misc_projects: HashSet<i64> = HashSet::new();
    for (category, projects) in &projects_per_root {
        let count = projects.len() as i64;
        if count >= min_projects {
            kept.push(CategoryShare {
                category: category.clone(),
                project_count: count,
                percentage: percentage(count, denom),
            });
        } else {
            misc_projects.extend(projects);
        }
    }
    kept.sort_by(|a, b| {
        b.project_count.cmp(&a.project_count).then_with(|| a.category.cmp(&b.category))
    });

    if !misc_projects.is_empty() {
        let count = misc_projects.len() as i64;
        kept.push(CategoryShare {
            category: "misc".to_string(),
            project_count: count,
            percentage: percentage(count, denom),
        });
    }
    Ok(kept)
}

/// One step of a cumulative distribution curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub value: i64,
    /// Share of the population at or below `value`, in percent.
    pub cumulative_percentage: f64,
}

/// Cumulative curve of occurrences per fully-analyzed project, over the
/// enumerated domain `1..=max`.
///
/// Each point answers "what share of projects has at most N recorded
/// snippets". Empty when no fully-analyzed project has occurrences.
pub fn snippets_per_project_curve(db: &CatalogDb) -> CatalogResult<Vec<CumulativePoint>> {
    let totals = snippet_totals_per_project(db)?;
    if totals.is_empty() {
        return Ok(Vec::new());
    }
    let max = *totals.iter().max().unwrap_or(&0);
    let population = totals.len() as i64;

    let mut out = Vec::with_capacity(max as usize);
    for n in 1..=max {
        let at_or_below = totals.iter().filter(|total| **total <= n).count() as i64;
        out.push(CumulativePoint {
            value: n,
            cumulative_percentage: percentage(at_or_below, population),
        });
    }
    Ok(out)
}

/// Cumulative curve of instruction count per snippet, occurrence-weighted,
/// over the enumerated domain `1..=max`.
///
/// Each point answers "what share of recorded snippets has at most N
/// instructions"; a sequence occurring five times contributes five snippets.
pub fn instructions_per_snippet_curve(db: &CatalogDb) -> CatalogResult<Vec<CumulativePoint>> {
    let weights = snippet_weights_per_length(db)?;
    let total: i64 = weights.values().sum();
    if total == 0 {
        return Ok(Vec::new());
    }
    let max = *weights.keys().max().unwrap_or(&0);

    let mut out = Vec::with_capacity(max as usize);
    let mut cumulative = 0;
    let mut next_length = weights.iter();
    let mut pending = next_length.next();
    for n in 1..=max {
        while let Some((length, weight)) = pending {
            if *length > n {
                break;
            }
            cumulative += weight;
            pending = next_length.next();
        }
        out.push(CumulativePoint { value: n, cumulative_percentage: percentage(cumulative, total) });
    }
    Ok(out)
}

/// A filter over instruction texts, used to aggregate instruction groups.
///
/// Predicates are data, not SQL fragments: group queries fetch the distinct
/// (project, instruction) pairs once and evaluate these in Rust, so filter
/// lists never get formatted into query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionPredicate {
    /// Exact instruction text (the empty string matches the barrier sentinel).
    Exact(String),
    /// Instruction text starting with the given prefix.
    Prefix(String),
    /// Any of the given exact texts.
    OneOf(Vec<String>),
}

impl InstructionPredicate {
    pub fn matches(&self, instruction: &str) -> bool {
        match self {
            InstructionPredicate::Exact(text) => instruction == text,
            InstructionPredicate::Prefix(prefix) => instruction.starts_with(prefix.as_str()),
            InstructionPredicate::OneOf(texts) => texts.iter().any(|t| t == instruction),
        }
    }
}

/// Share of projects using at least one instruction from a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupShare {
    pub project_count: i64,
    pub percentage: f64,
}

/// Count distinct fully-analyzed projects containing at least one
/// instruction matching any of `predicates`, as a share of `denominator`.
pub fn instruction_group_share(
    db: &CatalogDb,
    predicates: &[InstructionPredicate],
    denominator: ProjectScope,
) -> CatalogResult<GroupShare> {
    let denom = project_count(db, denominator)?;

    let mut stmt = db.connection().prepare(
        r#"
        SELECT DISTINCT o.project_id, i.instruction
        FROM occurrences o
        JOIN sequence_instructions si ON si.sequence_id = o.sequence_id
        JOIN instructions i ON i.id = si.instruction_id
        JOIN projects p ON p.id = o.project_id
        WHERE p.status = ?1
        "#,
    )?;
    let rows = stmt.query_map(params![AnalysisStatus::FullyAnalyzed.to_i32()], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut matching_projects: HashSet<i64> = HashSet::new();
    for row in rows {
        let (project_id, instruction) = row?;
        if predicates.iter().any(|p| p.matches(&instruction)) {
            matching_projects.insert(project_id);
        }
    }

    let count = matching_projects.len() as i64;
    Ok(GroupShare { project_count: count, percentage: percentage(count, denom) })
}

/// Headline aggregates over the whole catalog.
///
/// Snippet figures are computed over fully-analyzed projects only; those are
/// the only ones with a complete occurrence ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub projects_total: i64,
    pub projects_checked: i64,
    pub projects_fully_analyzed: i64,
    /// Presence-only projects plus any project with a recorded occurrence.
    pub projects_with_inline_assembly: i64,
    pub unique_instructions: i64,
    pub unique_sequences: i64,
    /// Total recorded snippets (occurrence counts summed).
    pub snippets_total: i64,
    /// Distinct sequences with at least one recorded occurrence.
    pub snippets_unique: i64,
    pub avg_snippets_per_project: f64,
    /// Upper median of snippets per project with occurrences.
    pub median_snippets_per_project: i64,
    pub max_snippets_in_project: i64,
    /// Instruction count of the longest cataloged sequence.
    pub max_sequence_length: i64,
    /// Occurrence-weighted share of snippets with exactly one instruction.
    pub single_instruction_snippet_percentage: f64,
    /// Total C plus header lines of code across all cataloged projects.
    pub loc_c_and_header: i64,
}

/// Compute the headline aggregates.
pub fn summary(db: &CatalogDb) -> CatalogResult<CatalogSummary> {
    let conn = db.connection();

    let projects_total = project_count(db, ProjectScope::All)?;
    let projects_checked = project_count(db, ProjectScope::Checked)?;
    let projects_fully_analyzed = project_count(db, ProjectScope::FullyAnalyzed)?;

    let projects_with_inline_assembly: i64 = conn.query_row(
        r#"
        SELECT COUNT(*) FROM projects p
        WHERE p.status = ?1
           OR EXISTS (SELECT 1 FROM occurrences o WHERE o.project_id = p.id)
        "#,
        params![AnalysisStatus::PresenceOnly.to_i32()],
        |row| row.get(0),
    )?;

    let unique_instructions: i64 =
        conn.query_row("SELECT COUNT(*) FROM instructions", [], |row| row.get(0))?;
    let unique_sequences: i64 =
        conn.query_row("SELECT COUNT(*) FROM sequences", [], |row| row.get(0))?;

    let snippets_unique: i64 = conn.query_row(
        r#"
        SELECT COUNT(DISTINCT o.sequence_id)
        FROM occurrences o
        JOIN projects p ON p.id = o.project_id
        WHERE p.status = ?1
        "#,
        params![AnalysisStatus::FullyAnalyzed.to_i32()],
        |row| row.get(0),
    )?;

    let mut totals = snippet_totals_per_project(db)?;
    totals.sort_unstable();
    let snippets_total: i64 = totals.iter().sum();
    let avg_snippets_per_project = if totals.is_empty() {
        0.0
    } else {
        snippets_total as f64 / totals.len() as f64
    };
    let median_snippets_per_project =
        if totals.is_empty() { 0 } else { totals[totals.len() / 2] };
    let max_snippets_in_project = totals.last().copied().unwrap_or(0);

    let max_sequence_length: i64 = conn
        .query_row(
            r#"
            SELECT MAX(length) FROM (
                SELECT COUNT(*) AS length FROM sequence_instructions GROUP BY sequence_id
            )
            "#,
            [],
            |row| row.get::<_, Option<i64>>(0),
        )?
        .unwrap_or(0);

    let weights = snippet_weights_per_length(db)?;
    let weighted_total: i64 = weights.values().sum();
    let single_instruction_snippet_percentage =
        percentage(weights.get(&1).copied().unwrap_or(0), weighted_total);

    let loc_c_and_header: i64 = conn.query_row(
        "SELECT COALESCE(SUM(loc_c + loc_header), 0) FROM projects",
        [],
        |row| row.get(0),
    )?;

    Ok(CatalogSummary {
        projects_total,
        projects_checked,
        projects_fully_analyzed,
        projects_with_inline_assembly,
        unique_instructions,
        unique_sequences,
        snippets_total,
        snippets_unique,
        avg_snippets_per_project,
        median_snippets_per_project,
        max_snippets_in_project,
        max_sequence_length,
        single_instruction_snippet_percentage,
        loc_c_and_header,
    })
}

/// Recorded snippets (occurrence counts summed) per fully-analyzed project.
fn snippet_totals_per_project(db: &CatalogDb) -> CatalogResult<Vec<i64>> {
    let mut stmt = db.connection().prepare(
        r#"
        SELECT SUM(o.count)
        FROM occurrences o
        JOIN projects p ON p.id = o.project_id
        WHERE p.status = ?1
        GROUP BY o.project_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![AnalysisStatus::FullyAnalyzed.to_i32()], |row| row.get::<_, i64>(0))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Occurrence-weighted snippet counts keyed by sequence length, over
/// fully-analyzed projects.
fn snippet_weights_per_length(db: &CatalogDb) -> CatalogResult<BTreeMap<i64, i64>> {
    let mut stmt = db.connection().prepare(
        r#"
        SELECT
            (SELECT COUNT(*) FROM sequence_instructions si
             WHERE si.sequence_id = o.sequence_id) AS length,
            SUM(o.count)
        FROM occurrences o
        JOIN projects p ON p.id = o.project_id
        WHERE p.status = ?1
        GROUP BY o.sequence_id
        "#,
    )?;
    let rows = stmt.query_map(params![AnalysisStatus::FullyAnalyzed.to_i32()], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut weights: BTreeMap<i64, i64> = BTreeMap::new();
    for row in rows {
        let (length, weight) = row?;
        *weights.entry(length).or_insert(0) += weight;
    }
    Ok(weights)
}

fn percentage(count: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count as f64 * 100.0 / denominator as f64
    }
}

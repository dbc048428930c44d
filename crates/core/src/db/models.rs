use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How far a project's inline-assembly usage has been examined.
///
/// The ordering is meaningful: a project only ever moves forward through
/// these states, never back. [`AnalysisStatus::rank`] encodes that ordering
/// for the transition check in the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisStatus {
    /// Cataloged, but nobody has looked at its inline assembly yet.
    Unanalyzed,
    /// Known to contain inline assembly; individual snippets not yet recorded.
    PresenceOnly,
    /// Every occurrence in the project has been recorded.
    FullyAnalyzed,
}

impl AnalysisStatus {
    /// Encode as an integer for storage in SQLite.
    pub fn to_i32(self) -> i32 {
        match self {
            AnalysisStatus::Unanalyzed => 0,
            AnalysisStatus::PresenceOnly => 1,
            AnalysisStatus::FullyAnalyzed => 2,
        }
    }

    /// Decode from an integer stored in SQLite.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => AnalysisStatus::Unanalyzed,
            1 => AnalysisStatus::PresenceOnly,
            2 => AnalysisStatus::FullyAnalyzed,
            _ => AnalysisStatus::Unanalyzed,
        }
    }

    /// Position in the forward-only ordering; transitions must strictly increase.
    pub fn rank(self) -> u8 {
        self.to_i32() as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Unanalyzed => "unanalyzed",
            AnalysisStatus::PresenceOnly => "presence-only",
            AnalysisStatus::FullyAnalyzed => "fully-analyzed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally gathered facts about a source repository.
///
/// This is the ingestion record shape: the clone/API/line-counter
/// collaborators assemble one of these (typically as JSON) and hand it to the
/// registry. The core never fetches any of it itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetrics {
    /// Repository name, e.g. `sulong`. May be left empty by the metrics
    /// collaborator; ingestion derives it from the URL then.
    #[serde(default)]
    pub name: String,
    /// Owning organization or user, e.g. `graalvm`.
    #[serde(default)]
    pub organization: String,
    /// Free-text description from the hosting service.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stars: i64,
    #[serde(default)]
    pub forks: i64,
    #[serde(default)]
    pub subscribers: i64,
    #[serde(default)]
    pub open_issues: i64,
    /// Date the repository was created on the hosting service.
    #[serde(default)]
    pub created_on: Option<NaiveDate>,
    /// Primary ecosystem language reported by the hosting service.
    #[serde(default)]
    pub language: Option<String>,
    /// Lines of code by language class, as reported by the line counter.
    #[serde(default)]
    pub loc_c: i64,
    #[serde(default)]
    pub loc_cpp: i64,
    #[serde(default)]
    pub loc_header: i64,
    #[serde(default)]
    pub loc_assembly: i64,
    /// Commit count excluding merges.
    #[serde(default)]
    pub commit_count: i64,
    /// Number of distinct committers.
    #[serde(default)]
    pub committer_count: i64,
    #[serde(default)]
    pub first_commit_on: Option<NaiveDate>,
    #[serde(default)]
    pub last_commit_on: Option<NaiveDate>,
    /// Revision hash the working copy was at when last examined.
    #[serde(default)]
    pub revision: Option<String>,
    /// Date the working copy was last pulled.
    #[serde(default)]
    pub pulled_on: Option<NaiveDate>,
}

/// A cataloged project: its identity (URL), gathered metrics, and how far
/// its inline assembly has been analyzed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectRecord {
    /// Source URL; globally unique, one record per URL.
    pub url: String,
    pub metrics: ProjectMetrics,
    pub status: AnalysisStatus,
}

impl ProjectRecord {
    pub fn new(url: impl Into<String>, metrics: ProjectMetrics) -> Self {
        Self { url: url.into(), metrics, status: AnalysisStatus::Unanalyzed }
    }
}

/// A unique instruction, identified by its canonical text.
///
/// The empty text is a real record: it is the sentinel for a pure
/// compiler/memory barrier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstructionRecord {
    /// Canonical instruction text (mnemonic plus normalized operand form,
    /// prefixes folded in, e.g. `"lock xadd"`).
    pub instruction: String,
    /// Reference test-case snippet; empty for the barrier sentinel.
    pub test_case: String,
    /// True iff the mnemonic is a conditional/unconditional jump.
    pub control_flow: bool,
}

/// A unique ordered instruction sequence, identified by the exact delimited
/// source text it was built from (separators included).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: i64,
    /// The exact source text; two sequences with the same instructions but
    /// different literal text are distinct records.
    pub source_text: String,
    /// Optional compound test case covering the whole sequence.
    pub test_case: Option<String>,
    /// Free-text note.
    pub note: String,
}

/// A named application category; `parent_id` of `None` means top-level.
///
/// Parents are set once at creation and never re-pointed, so the taxonomy
/// forms a forest by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

/// One recorded appearance of a sequence at a file location in a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccurrenceRecord {
    pub id: i64,
    pub sequence_id: i64,
    /// URL of the project the occurrence was found in.
    pub project_url: String,
    /// Path of the file within the project.
    pub file_path: String,
    /// How often the sequence appears in that file; at least 1.
    pub count: i64,
    /// False iff the source spelled the instruction with raw `.byte`
    /// directives instead of mnemonics.
    pub used_mnemonics: bool,
}

/// Record counts across the catalog, for `info`-style reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogCounts {
    pub projects: i64,
    pub instructions: i64,
    pub sequences: i64,
    pub occurrences: i64,
    pub categories: i64,
}

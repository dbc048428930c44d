use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::models::{
    AnalysisStatus, CatalogCounts, CategoryRecord, InstructionRecord, OccurrenceRecord,
    ProjectMetrics, ProjectRecord, SequenceRecord,
};
use crate::normalize::{is_control_flow, normalize, split_sequence_text, InvalidInstruction};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    ///
    /// This is intentionally explicit so callers can surface a clear message
    /// instead of silently clobbering or misinterpreting data.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// A malformed instruction token was submitted.
    #[error(transparent)]
    InvalidInstruction(#[from] InvalidInstruction),

    /// Re-ingestion of an already cataloged project URL.
    #[error("project {url:?} is already cataloged; re-ingestion is not supported")]
    DuplicateProject { url: String },

    /// No project is cataloged under the given URL.
    #[error("no project cataloged under {url:?}")]
    UnknownProject { url: String },

    /// No sequence exists with the given id.
    #[error("no sequence with id {id}")]
    UnknownSequence { id: i64 },

    /// No category exists with the given id.
    #[error("no category with id {id}")]
    UnknownCategory { id: i64 },

    /// An occurrence was recorded against a project nobody has analyzed yet.
    #[error("project {url:?} is still unanalyzed; advance its status before recording occurrences")]
    DanglingReference { url: String },

    /// An attempt to move a project's analysis status backward.
    #[error("cannot move project {url:?} from {from} back to {to}")]
    StatusRegression { url: String, from: AnalysisStatus, to: AnalysisStatus },

    /// Occurrence counts start at 1; a sequence that does not appear is not
    /// recorded at all.
    #[error("occurrence count must be at least 1, got {0}")]
    ZeroOccurrenceCount(i64),

    /// A parent-link walk revisited a category; the taxonomy is corrupt.
    #[error("category taxonomy contains a cycle through id {id}")]
    TaxonomyCycle { id: i64 },
}

/// Convenience result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// SQLite-backed census catalog.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible
/// for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for the instruction/sequence catalogs,
///   the category taxonomy, the project registry, and the occurrence ledger.
///
/// The handle is meant for single-writer batch ingestion followed by
/// read-only queries; the schema-level UNIQUE constraints are the backstop
/// against duplicate inserts from concurrent writers on separate handles.
#[derive(Debug)]
pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open (or create) a catalog database at the given path and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        // The bundled SQLite is compiled with SQLITE_DEFAULT_FOREIGN_KEYS=1,
        // which turns enforcement on. Restore the documented default (off) so
        // the integrity pass — not the engine — diagnoses dangling rows.
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Record counts across all tables.
    pub fn counts(&self) -> CatalogResult<CatalogCounts> {
        let count = |table: &str| -> CatalogResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };
        Ok(CatalogCounts {
            projects: count("projects")?,
            instructions: count("instructions")?,
            sequences: count("sequences")?,
            occurrences: count("occurrences")?,
            categories: count("categories")?,
        })
    }

    // ----- instruction catalog -------------------------------------------

    /// Return the id of the instruction with exactly this text, inserting it
    /// first if absent.
    ///
    /// Lookup is by exact text match before any validation, so a text that is
    /// already cataloged never re-runs the normalizer. New instructions get
    /// their control-flow flag derived from the canonical text.
    pub fn get_or_create_instruction(&self, text: &str) -> CatalogResult<i64> {
        if let Some(id) = self.instruction_id(text)? {
            return Ok(id);
        }
        let normalized = normalize(text)?;
        self.conn.execute(
            r#"
            INSERT INTO instructions (instruction, test_case, control_flow)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                normalized.text,
                "",
                if is_control_flow(&normalized.text) { 1 } else { 0 }
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up an instruction by exact text.
    pub fn find_instruction(&self, text: &str) -> CatalogResult<Option<InstructionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT instruction, test_case, control_flow
            FROM instructions
            WHERE instruction = ?1
            "#,
        )?;
        let mut rows = stmt.query(params![text])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_instruction(row)?))
        } else {
            Ok(None)
        }
    }

    /// Replace the stored test case for an instruction, creating the
    /// instruction if it does not exist yet.
    ///
    /// Returns the previous test case when one was replaced so callers can
    /// warn about the overwrite first; `None` means the instruction was
    /// freshly created.
    pub fn set_instruction_test_case(
        &self,
        text: &str,
        test_case: &str,
    ) -> CatalogResult<Option<String>> {
        let existing: Option<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT test_case FROM instructions WHERE instruction = ?1")?;
            let mut rows = stmt.query(params![text])?;
            match rows.next()? {
                Some(row) => Some(row.get(0)?),
                None => None,
            }
        };

        match existing {
            Some(old) => {
                self.conn.execute(
                    "UPDATE instructions SET test_case = ?1 WHERE instruction = ?2",
                    params![test_case, text],
                )?;
                Ok(Some(old))
            }
            None => {
                let normalized = normalize(text)?;
                self.conn.execute(
                    r#"
                    INSERT INTO instructions (instruction, test_case, control_flow)
                    VALUES (?1, ?2, ?3)
                    "#,
                    params![
                        normalized.text,
                        test_case,
                        if is_control_flow(&normalized.text) { 1 } else { 0 }
                    ],
                )?;
                Ok(None)
            }
        }
    }

    /// List all instructions (ordered by id).
    pub fn list_instructions(&self) -> CatalogResult<Vec<InstructionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT instruction, test_case, control_flow
            FROM instructions
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(InstructionRecord {
                instruction: row.get(0)?,
                test_case: row.get(1)?,
                control_flow: row.get::<_, i32>(2)? != 0,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn instruction_id(&self, text: &str) -> CatalogResult<Option<i64>> {
        let mut stmt =
            self.conn.prepare("SELECT id FROM instructions WHERE instruction = ?1")?;
        let mut rows = stmt.query(params![text])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    // ----- sequence catalog ----------------------------------------------

    /// Register an ordered instruction sequence, creating the individual
    /// instructions as needed.
    ///
    /// The raw text is split on `;`/`,` and every token is validated before
    /// anything is inserted, so a malformed token never leaves a partial
    /// sequence behind. Deduplication keys on the exact source text: an
    /// existing text returns `(existing_id, false)` and changes nothing,
    /// which callers may log but must not treat as an error.
    pub fn get_or_create_sequence(
        &self,
        source_text: &str,
        test_case: Option<&str>,
        note: &str,
    ) -> CatalogResult<(i64, bool)> {
        if let Some(id) = self.find_sequence(source_text)? {
            return Ok((id, false));
        }

        let tokens = split_sequence_text(source_text);
        for token in &tokens {
            normalize(token)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut instruction_ids = Vec::with_capacity(tokens.len());
        for token in &tokens {
            instruction_ids.push(self.get_or_create_instruction(token)?);
        }

        self.conn.execute(
            r#"
            INSERT INTO sequences (source_text, test_case, note)
            VALUES (?1, ?2, ?3)
            "#,
            params![source_text, test_case, note],
        )?;
        let sequence_id = self.conn.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO sequence_instructions (sequence_id, position, instruction_id)
                VALUES (?1, ?2, ?3)
                "#,
            )?;
            for (idx, instruction_id) in instruction_ids.iter().enumerate() {
                // positions are 1-based
                stmt.execute(params![sequence_id, (idx + 1) as i64, instruction_id])?;
            }
        }

        tx.commit()?;
        Ok((sequence_id, true))
    }

    /// Look up a sequence id by its exact source text.
    pub fn find_sequence(&self, source_text: &str) -> CatalogResult<Option<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM sequences WHERE source_text = ?1")?;
        let mut rows = stmt.query(params![source_text])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// The instructions of a sequence, in source order.
    pub fn sequence_instructions(
        &self,
        sequence_id: i64,
    ) -> CatalogResult<Vec<InstructionRecord>> {
        if !self.sequence_exists(sequence_id)? {
            return Err(CatalogError::UnknownSequence { id: sequence_id });
        }
        let mut stmt = self.conn.prepare(
            r#"
            SELECT i.instruction, i.test_case, i.control_flow
            FROM sequence_instructions si
            JOIN instructions i ON i.id = si.instruction_id
            WHERE si.sequence_id = ?1
            ORDER BY si.position
            "#,
        )?;
        let rows = stmt.query_map(params![sequence_id], |row| {
            Ok(InstructionRecord {
                instruction: row.get(0)?,
                test_case: row.get(1)?,
                control_flow: row.get::<_, i32>(2)? != 0,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Derived flag: true iff no occurrence of this sequence was recorded
    /// with raw `.byte` encoding. A sequence without occurrences counts as
    /// mnemonic-only.
    pub fn sequence_uses_only_mnemonics(&self, sequence_id: i64) -> CatalogResult<bool> {
        if !self.sequence_exists(sequence_id)? {
            return Err(CatalogError::UnknownSequence { id: sequence_id });
        }
        let raw_byte_occurrences: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM occurrences WHERE sequence_id = ?1 AND used_mnemonics = 0",
            params![sequence_id],
            |row| row.get(0),
        )?;
        Ok(raw_byte_occurrences == 0)
    }

    /// List all sequences (ordered by id).
    pub fn list_sequences(&self) -> CatalogResult<Vec<SequenceRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source_text, test_case, note
            FROM sequences
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SequenceRecord {
                id: row.get(0)?,
                source_text: row.get(1)?,
                test_case: row.get(2)?,
                note: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn sequence_exists(&self, sequence_id: i64) -> CatalogResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sequences WHERE id = ?1",
            params![sequence_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ----- category taxonomy ---------------------------------------------

    /// Return the id of the category with this name (case-sensitive),
    /// creating it as a top-level category if absent.
    ///
    /// The ingestion path never sets parents; hierarchy comes from
    /// [`CatalogDb::seed_category`] only.
    pub fn get_or_create_category(&self, name: &str) -> CatalogResult<i64> {
        if let Some(record) = self.find_category_by_name(name)? {
            return Ok(record.id);
        }
        self.conn.execute(
            "INSERT INTO categories (name, parent_id) VALUES (?1, NULL)",
            params![name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a category with an explicit parent, for pre-seeded hierarchies.
    ///
    /// An existing name returns its id unchanged; parents are set once at
    /// creation and never re-pointed, which is what keeps the taxonomy a
    /// forest.
    pub fn seed_category(&self, name: &str, parent_id: Option<i64>) -> CatalogResult<i64> {
        if let Some(record) = self.find_category_by_name(name)? {
            return Ok(record.id);
        }
        if let Some(parent) = parent_id {
            if self.fetch_category(parent)?.is_none() {
                return Err(CatalogError::UnknownCategory { id: parent });
            }
        }
        self.conn.execute(
            "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
            params![name, parent_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a category by exact name.
    pub fn find_category_by_name(&self, name: &str) -> CatalogResult<Option<CategoryRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id FROM categories WHERE name = ?1")?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_category(row)?))
        } else {
            Ok(None)
        }
    }

    /// Direct children of a category, by stored parent link.
    pub fn category_children(&self, category_id: i64) -> CatalogResult<Vec<CategoryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, parent_id
            FROM categories
            WHERE parent_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![category_id], |row| {
            Ok(CategoryRecord { id: row.get(0)?, name: row.get(1)?, parent_id: row.get(2)? })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// All descendants of a category in depth-first order.
    ///
    /// The traversal is iterative (explicit stack) and treats a revisited id
    /// as a cycle: construction never re-points parents, so a revisit can
    /// only mean the table was corrupted out-of-band.
    pub fn category_descendants(&self, category_id: i64) -> CatalogResult<Vec<CategoryRecord>> {
        if self.fetch_category(category_id)?.is_none() {
            return Err(CatalogError::UnknownCategory { id: category_id });
        }

        let mut visited: HashSet<i64> = HashSet::from([category_id]);
        let mut out = Vec::new();
        let mut stack = self.category_children(category_id)?;
        stack.reverse();

        while let Some(category) = stack.pop() {
            if !visited.insert(category.id) {
                return Err(CatalogError::TaxonomyCycle { id: category.id });
            }
            let mut children = self.category_children(category.id)?;
            children.reverse();
            out.push(category);
            stack.extend(children);
        }
        Ok(out)
    }

    /// Walk parent links up to the top-level ancestor of a category.
    ///
    /// Bounded by the total category count, so a corrupt cycle surfaces as
    /// [`CatalogError::TaxonomyCycle`] instead of looping forever.
    pub fn category_root(&self, category_id: i64) -> CatalogResult<CategoryRecord> {
        let bound: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;

        let mut current = self
            .fetch_category(category_id)?
            .ok_or(CatalogError::UnknownCategory { id: category_id })?;
        let mut steps: i64 = 0;
        while let Some(parent_id) = current.parent_id {
            steps += 1;
            if steps > bound {
                return Err(CatalogError::TaxonomyCycle { id: current.id });
            }
            current = self
                .fetch_category(parent_id)?
                .ok_or(CatalogError::UnknownCategory { id: parent_id })?;
        }
        Ok(current)
    }

    /// All categories without a parent (ordered by id).
    pub fn top_level_categories(&self) -> CatalogResult<Vec<CategoryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, parent_id
            FROM categories
            WHERE parent_id IS NULL
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategoryRecord { id: row.get(0)?, name: row.get(1)?, parent_id: row.get(2)? })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn fetch_category(&self, category_id: i64) -> CatalogResult<Option<CategoryRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id FROM categories WHERE id = ?1")?;
        let mut rows = stmt.query(params![category_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_category(row)?))
        } else {
            Ok(None)
        }
    }

    // ----- project registry ----------------------------------------------

    /// Catalog a project under its URL.
    ///
    /// Each ingestion creates a fresh record; submitting a URL that already
    /// exists is a caller error surfaced as
    /// [`CatalogError::DuplicateProject`], never a silent merge.
    pub fn insert_project(&self, url: &str, metrics: &ProjectMetrics) -> CatalogResult<i64> {
        if self.project_id_and_status(url)?.is_some() {
            return Err(CatalogError::DuplicateProject { url: url.to_string() });
        }
        self.conn.execute(
            r#"
            INSERT INTO projects (
                url, name, organization, description,
                stars, forks, subscribers, open_issues,
                created_on, language,
                loc_c, loc_cpp, loc_header, loc_assembly,
                commit_count, committer_count, first_commit_on, last_commit_on,
                revision, pulled_on, status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
            "#,
            params![
                url,
                metrics.name,
                metrics.organization,
                metrics.description,
                metrics.stars,
                metrics.forks,
                metrics.subscribers,
                metrics.open_issues,
                date_to_sql(metrics.created_on),
                metrics.language,
                metrics.loc_c,
                metrics.loc_cpp,
                metrics.loc_header,
                metrics.loc_assembly,
                metrics.commit_count,
                metrics.committer_count,
                date_to_sql(metrics.first_commit_on),
                date_to_sql(metrics.last_commit_on),
                metrics.revision,
                date_to_sql(metrics.pulled_on),
                AnalysisStatus::Unanalyzed.to_i32(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a project by URL.
    pub fn find_project(&self, url: &str) -> CatalogResult<Option<ProjectRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT} WHERE url = ?1"
        ))?;
        let mut rows = stmt.query(params![url])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_project(row)?))
        } else {
            Ok(None)
        }
    }

    /// List all projects (ordered by id).
    pub fn list_projects(&self) -> CatalogResult<Vec<ProjectRecord>> {
        let mut stmt = self.conn.prepare(&format!("{PROJECT_SELECT} ORDER BY id"))?;
        let rows = stmt.query_map([], map_project)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Refresh the stored metrics of an existing project. Identity and
    /// analysis status are untouched.
    pub fn update_project_metrics(
        &self,
        url: &str,
        metrics: &ProjectMetrics,
    ) -> CatalogResult<()> {
        if self.project_id_and_status(url)?.is_none() {
            return Err(CatalogError::UnknownProject { url: url.to_string() });
        }
        self.conn.execute(
            r#"
            UPDATE projects SET
                name = ?1, organization = ?2, description = ?3,
                stars = ?4, forks = ?5, subscribers = ?6, open_issues = ?7,
                created_on = ?8, language = ?9,
                loc_c = ?10, loc_cpp = ?11, loc_header = ?12, loc_assembly = ?13,
                commit_count = ?14, committer_count = ?15,
                first_commit_on = ?16, last_commit_on = ?17,
                revision = ?18, pulled_on = ?19
            WHERE url = ?20
            "#,
            params![
                metrics.name,
                metrics.organization,
                metrics.description,
                metrics.stars,
                metrics.forks,
                metrics.subscribers,
                metrics.open_issues,
                date_to_sql(metrics.created_on),
                metrics.language,
                metrics.loc_c,
                metrics.loc_cpp,
                metrics.loc_header,
                metrics.loc_assembly,
                metrics.commit_count,
                metrics.committer_count,
                date_to_sql(metrics.first_commit_on),
                date_to_sql(metrics.last_commit_on),
                metrics.revision,
                date_to_sql(metrics.pulled_on),
                url,
            ],
        )?;
        Ok(())
    }

    /// Advance a project's analysis status.
    ///
    /// The status only ever moves forward through
    /// unanalyzed -> presence-only -> fully-analyzed; anything else fails
    /// with [`CatalogError::StatusRegression`].
    pub fn advance_project_status(
        &self,
        url: &str,
        new_status: AnalysisStatus,
    ) -> CatalogResult<()> {
        let (id, current) = self
            .project_id_and_status(url)?
            .ok_or_else(|| CatalogError::UnknownProject { url: url.to_string() })?;

        if new_status.rank() <= current.rank() {
            return Err(CatalogError::StatusRegression {
                url: url.to_string(),
                from: current,
                to: new_status,
            });
        }

        self.conn.execute(
            "UPDATE projects SET status = ?1 WHERE id = ?2",
            params![new_status.to_i32(), id],
        )?;
        Ok(())
    }

    /// Associate categories with a project, resolving or creating each by
    /// name. Re-attaching an already associated category is a no-op.
    pub fn attach_categories(&self, url: &str, names: &[String]) -> CatalogResult<Vec<i64>> {
        let (project_id, _) = self
            .project_id_and_status(url)?
            .ok_or_else(|| CatalogError::UnknownProject { url: url.to_string() })?;

        let mut category_ids = Vec::with_capacity(names.len());
        for name in names {
            let category_id = self.get_or_create_category(name)?;
            self.conn.execute(
                r#"
                INSERT OR IGNORE INTO project_categories (project_id, category_id)
                VALUES (?1, ?2)
                "#,
                params![project_id, category_id],
            )?;
            category_ids.push(category_id);
        }
        Ok(category_ids)
    }

    /// The categories associated with a project (ordered by category id).
    pub fn project_categories(&self, url: &str) -> CatalogResult<Vec<CategoryRecord>> {
        let (project_id, _) = self
            .project_id_and_status(url)?
            .ok_or_else(|| CatalogError::UnknownProject { url: url.to_string() })?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.name, c.parent_id
            FROM project_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.project_id = ?1
            ORDER BY c.id
            "#,
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(CategoryRecord { id: row.get(0)?, name: row.get(1)?, parent_id: row.get(2)? })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn project_id_and_status(
        &self,
        url: &str,
    ) -> CatalogResult<Option<(i64, AnalysisStatus)>> {
        let mut stmt = self.conn.prepare("SELECT id, status FROM projects WHERE url = ?1")?;
        let mut rows = stmt.query(params![url])?;
        if let Some(row) = rows.next()? {
            let status: i32 = row.get(1)?;
            Ok(Some((row.get(0)?, AnalysisStatus::from_i32(status))))
        } else {
            Ok(None)
        }
    }

    // ----- occurrence ledger ---------------------------------------------

    /// Record that a sequence appears `count` times in one file of a project.
    ///
    /// Both referenced entities must exist, and the project must have
    /// advanced past `unanalyzed` before occurrences can be attributed to
    /// it. Occurrence rows are insert-only; nothing ever mutates them.
    pub fn record_occurrence(
        &self,
        sequence_id: i64,
        project_url: &str,
        file_path: &str,
        count: i64,
        used_mnemonics: bool,
    ) -> CatalogResult<i64> {
        if count < 1 {
            return Err(CatalogError::ZeroOccurrenceCount(count));
        }
        if !self.sequence_exists(sequence_id)? {
            return Err(CatalogError::UnknownSequence { id: sequence_id });
        }
        let (project_id, status) = self
            .project_id_and_status(project_url)?
            .ok_or_else(|| CatalogError::UnknownProject { url: project_url.to_string() })?;
        if status == AnalysisStatus::Unanalyzed {
            return Err(CatalogError::DanglingReference { url: project_url.to_string() });
        }

        self.conn.execute(
            r#"
            INSERT INTO occurrences (sequence_id, project_id, file_path, count, used_mnemonics)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                sequence_id,
                project_id,
                file_path,
                count,
                if used_mnemonics { 1 } else { 0 }
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List all occurrences (ordered by id).
    pub fn list_occurrences(&self) -> CatalogResult<Vec<OccurrenceRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT o.id, o.sequence_id, p.url, o.file_path, o.count, o.used_mnemonics
            FROM occurrences o
            JOIN projects p ON p.id = o.project_id
            ORDER BY o.id
            "#,
        )?;
        let rows = stmt.query_map([], map_occurrence)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// The occurrences recorded for one project (ordered by id).
    pub fn occurrences_for_project(&self, url: &str) -> CatalogResult<Vec<OccurrenceRecord>> {
        let (project_id, _) = self
            .project_id_and_status(url)?
            .ok_or_else(|| CatalogError::UnknownProject { url: url.to_string() })?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT o.id, o.sequence_id, p.url, o.file_path, o.count, o.used_mnemonics
            FROM occurrences o
            JOIN projects p ON p.id = o.project_id
            WHERE o.project_id = ?1
            ORDER BY o.id
            "#,
        )?;
        let rows = stmt.query_map(params![project_id], map_occurrence)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

const PROJECT_SELECT: &str = r#"
    SELECT url, name, organization, description,
           stars, forks, subscribers, open_issues,
           created_on, language,
           loc_c, loc_cpp, loc_header, loc_assembly,
           commit_count, committer_count, first_commit_on, last_commit_on,
           revision, pulled_on, status
    FROM projects
"#;

fn map_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        url: row.get(0)?,
        metrics: ProjectMetrics {
            name: row.get(1)?,
            organization: row.get(2)?,
            description: row.get(3)?,
            stars: row.get(4)?,
            forks: row.get(5)?,
            subscribers: row.get(6)?,
            open_issues: row.get(7)?,
            created_on: date_from_sql(row.get(8)?),
            language: row.get(9)?,
            loc_c: row.get(10)?,
            loc_cpp: row.get(11)?,
            loc_header: row.get(12)?,
            loc_assembly: row.get(13)?,
            commit_count: row.get(14)?,
            committer_count: row.get(15)?,
            first_commit_on: date_from_sql(row.get(16)?),
            last_commit_on: date_from_sql(row.get(17)?),
            revision: row.get(18)?,
            pulled_on: date_from_sql(row.get(19)?),
        },
        status: AnalysisStatus::from_i32(row.get(20)?),
    })
}

fn map_instruction(row: &rusqlite::Row<'_>) -> rusqlite::Result<InstructionRecord> {
    Ok(InstructionRecord {
        instruction: row.get(0)?,
        test_case: row.get(1)?,
        control_flow: row.get::<_, i32>(2)? != 0,
    })
}

fn map_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<CategoryRecord> {
    Ok(CategoryRecord { id: row.get(0)?, name: row.get(1)?, parent_id: row.get(2)? })
}

fn map_occurrence(row: &rusqlite::Row<'_>) -> rusqlite::Result<OccurrenceRecord> {
    Ok(OccurrenceRecord {
        id: row.get(0)?,
        sequence_id: row.get(1)?,
        project_url: row.get(2)?,
        file_path: row.get(3)?,
        count: row.get(4)?,
        used_mnemonics: row.get::<_, i32>(5)? != 0,
    })
}

/// Dates are stored as `YYYY-MM-DD` text, the format the original metrics
/// collaborators emit.
fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn date_from_sql(text: Option<String>) -> Option<NaiveDate> {
    text.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: initial schema (instructions, sequences, categories, projects)
/// - 2: add occurrences table
///
/// Foreign keys are declared for tools that enforce them, but the pragma is
/// left at SQLite's default so the integrity pass can still diagnose
/// dangling rows in databases written elsewhere.
fn apply_migrations(conn: &Connection) -> CatalogResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema version than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(CatalogError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        // Initial schema.
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS instructions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                instruction  TEXT NOT NULL UNIQUE,
                test_case    TEXT NOT NULL DEFAULT '',
                control_flow INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS sequences (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                source_text TEXT NOT NULL UNIQUE,
                test_case   TEXT,
                note        TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS sequence_instructions (
                sequence_id    INTEGER NOT NULL REFERENCES sequences(id),
                position       INTEGER NOT NULL,
                instruction_id INTEGER NOT NULL REFERENCES instructions(id),
                PRIMARY KEY (sequence_id, position)
            );

            CREATE TABLE IF NOT EXISTS categories (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                name      TEXT NOT NULL UNIQUE,
                parent_id INTEGER REFERENCES categories(id)
            );

            CREATE TABLE IF NOT EXISTS projects (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                url             TEXT NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                organization    TEXT NOT NULL,
                description     TEXT,
                stars           INTEGER NOT NULL DEFAULT 0,
                forks           INTEGER NOT NULL DEFAULT 0,
                subscribers     INTEGER NOT NULL DEFAULT 0,
                open_issues     INTEGER NOT NULL DEFAULT 0,
                created_on      TEXT,
                language        TEXT,
                loc_c           INTEGER NOT NULL DEFAULT 0,
                loc_cpp         INTEGER NOT NULL DEFAULT 0,
                loc_header      INTEGER NOT NULL DEFAULT 0,
                loc_assembly    INTEGER NOT NULL DEFAULT 0,
                commit_count    INTEGER NOT NULL DEFAULT 0,
                committer_count INTEGER NOT NULL DEFAULT 0,
                first_commit_on TEXT,
                last_commit_on  TEXT,
                revision        TEXT,
                pulled_on       TEXT,
                status          INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS project_categories (
                project_id  INTEGER NOT NULL REFERENCES projects(id),
                category_id INTEGER NOT NULL REFERENCES categories(id),
                PRIMARY KEY (project_id, category_id)
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS occurrences (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                sequence_id    INTEGER NOT NULL REFERENCES sequences(id),
                project_id     INTEGER NOT NULL REFERENCES projects(id),
                file_path      TEXT NOT NULL,
                count          INTEGER NOT NULL CHECK (count >= 1),
                used_mnemonics INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_occurrences_sequence ON occurrences(sequence_id);
            CREATE INDEX IF NOT EXISTS idx_occurrences_project ON occurrences(project_id);

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> CatalogResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

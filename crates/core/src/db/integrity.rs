//! Batch consistency checks over the occurrence ledger.
//!
//! Violations are collected and reported wholesale so one pass surfaces
//! every problem; nothing here throws on the first hit or auto-repairs.
//! Remediation is the caller's decision.

use thiserror::Error;

use crate::db::catalog_db::{CatalogDb, CatalogResult};

/// One inconsistency found by [`CatalogDb::integrity_check`].
///
/// These are data, not errors: a check run over a broken database returns
/// all of them in one list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// An occurrence references a sequence id that is not in the catalog.
    #[error("occurrence {occurrence_id} references missing sequence {sequence_id}")]
    DanglingSequence { occurrence_id: i64, sequence_id: i64 },

    /// An occurrence claims mnemonic encoding but its sequence literally
    /// spells a raw `rep nop` pause.
    #[error("occurrence {occurrence_id} is flagged mnemonic-encoded but its sequence spells a raw \"rep nop\"")]
    RawRepNopAsMnemonic { occurrence_id: i64 },

    /// An occurrence claims mnemonic encoding but its sequence contains a
    /// `.byte` directive.
    #[error("occurrence {occurrence_id} is flagged mnemonic-encoded but its sequence contains a .byte directive")]
    ByteDirectiveAsMnemonic { occurrence_id: i64 },

    /// A jump instruction whose control-flow flag was not derived correctly.
    #[error("instruction {instruction:?} is a jump but its control-flow flag is unset")]
    JumpWithoutControlFlowFlag { instruction: String },
}

impl CatalogDb {
    /// Run the full consistency pass over the ledger and return every
    /// violation found.
    ///
    /// Checks, in order:
    /// 1. every occurrence's sequence id exists;
    /// 2. no mnemonic-flagged occurrence points at a sequence spelling a
    ///    literal `rep nop` / `rep;nop`;
    /// 3. no mnemonic-flagged occurrence points at a sequence containing a
    ///    `.byte` directive;
    /// 4. every instruction starting with `j` carries the control-flow flag.
    ///
    /// Checks 2 and 3 test the referenced sequence's source text; occurrence
    /// rows carry no snippet body of their own. An empty vec means the
    /// catalog is consistent.
    pub fn integrity_check(&self) -> CatalogResult<Vec<IntegrityViolation>> {
        let conn = self.connection();
        let mut violations = Vec::new();

        {
            let mut stmt = conn.prepare(
                r#"
                SELECT o.id, o.sequence_id
                FROM occurrences o
                WHERE o.sequence_id NOT IN (SELECT id FROM sequences)
                ORDER BY o.id
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(IntegrityViolation::DanglingSequence {
                    occurrence_id: row.get(0)?,
                    sequence_id: row.get(1)?,
                })
            })?;
            for row in rows {
                violations.push(row?);
            }
        }

        {
            let mut stmt = conn.prepare(
                r#"
                SELECT o.id
                FROM occurrences o
                JOIN sequences s ON s.id = o.sequence_id
                WHERE o.used_mnemonics = 1
                  AND (s.source_text LIKE '%rep nop%'
                       OR s.source_text LIKE '%rep;nop%'
                       OR s.source_text LIKE '%rep; nop%')
                ORDER BY o.id
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(IntegrityViolation::RawRepNopAsMnemonic { occurrence_id: row.get(0)? })
            })?;
            for row in rows {
                violations.push(row?);
            }
        }

        {
            let mut stmt = conn.prepare(
                r#"
                SELECT o.id
                FROM occurrences o
                JOIN sequences s ON s.id = o.sequence_id
                WHERE o.used_mnemonics = 1
                  AND s.source_text LIKE '%.byte%'
                ORDER BY o.id
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(IntegrityViolation::ByteDirectiveAsMnemonic { occurrence_id: row.get(0)? })
            })?;
            for row in rows {
                violations.push(row?);
            }
        }

        {
            let mut stmt = conn.prepare(
                r#"
                SELECT instruction
                FROM instructions
                WHERE instruction LIKE 'j%' AND control_flow = 0
                ORDER BY id
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(IntegrityViolation::JumpWithoutControlFlowFlag { instruction: row.get(0)? })
            })?;
            for row in rows {
                violations.push(row?);
            }
        }

        Ok(violations)
    }
}

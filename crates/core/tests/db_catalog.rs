use census_core::db::{CatalogDb, CatalogError, CURRENT_SCHEMA_VERSION};
use rusqlite::Connection;
use tempfile::tempdir;

#[test]
fn catalog_db_initializes_schema_and_persists() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("catalog.db");

    // First open should create the schema and allow inserts.
    {
        let db = CatalogDb::open(&db_path).expect("open db");
        let version: i32 = db
            .connection()
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let id = db.get_or_create_instruction("mov").expect("insert mov");
        assert!(id > 0);
    }

    // Second open should see existing schema and data.
    {
        let db = CatalogDb::open(&db_path).expect("re-open db");
        let record = db.find_instruction("mov").expect("find mov").expect("mov exists");
        assert_eq!(record.instruction, "mov");
        assert_eq!(db.counts().expect("counts").instructions, 1);
    }
}

#[test]
fn catalog_db_open_errors_on_unsupported_schema_version() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("catalog.db");

    // Manually create a DB and set user_version higher than we support.
    {
        let conn = Connection::open(&db_path).expect("open raw sqlite db");
        conn.pragma_update(None, "user_version", 99_i32).expect("set user_version pragma");
    }

    match CatalogDb::open(&db_path) {
        Err(CatalogError::UnsupportedSchemaVersion { found, min_supported, max_supported }) => {
            assert_eq!(found, 99, "unexpected found schema version");
            assert_eq!(min_supported, 0, "unexpected min_supported schema version");
            assert_eq!(max_supported, CURRENT_SCHEMA_VERSION);
        }
        Err(err) => panic!("expected UnsupportedSchemaVersion, got different error: {err}"),
        Ok(_) => panic!("expected UnsupportedSchemaVersion, got Ok(_)"),
    }
}

#[test]
fn get_or_create_instruction_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    let first = db.get_or_create_instruction("lock xadd").expect("insert");
    let second = db.get_or_create_instruction("lock xadd").expect("lookup");
    assert_eq!(first, second);
    assert_eq!(db.counts().expect("counts").instructions, 1);
}

#[test]
fn get_or_create_instruction_rejects_invalid_tokens() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    match db.get_or_create_instruction("lock") {
        Err(CatalogError::InvalidInstruction(_)) => {}
        other => panic!("expected InvalidInstruction, got {other:?}"),
    }
    match db.get_or_create_instruction("int 3") {
        Err(CatalogError::InvalidInstruction(_)) => {}
        other => panic!("expected InvalidInstruction, got {other:?}"),
    }
    assert_eq!(db.counts().expect("counts").instructions, 0);
}

#[test]
fn control_flow_flag_is_derived_at_creation() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    db.get_or_create_instruction("jz").expect("insert jz");
    db.get_or_create_instruction("mov").expect("insert mov");

    let jz = db.find_instruction("jz").expect("find").expect("jz exists");
    assert!(jz.control_flow);
    let mov = db.find_instruction("mov").expect("find").expect("mov exists");
    assert!(!mov.control_flow);
}

#[test]
fn set_instruction_test_case_creates_then_replaces() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    let previous = db.set_instruction_test_case("rdtsc", "void rdtsc() {}").expect("create");
    assert_eq!(previous, None);

    let previous = db
        .set_instruction_test_case("rdtsc", "void rdtsc() { /* updated */ }")
        .expect("replace");
    assert_eq!(previous.as_deref(), Some("void rdtsc() {}"));

    let record = db.find_instruction("rdtsc").expect("find").expect("rdtsc exists");
    assert_eq!(record.test_case, "void rdtsc() { /* updated */ }");
    assert_eq!(db.counts().expect("counts").instructions, 1);
}

#[test]
fn sequence_creation_registers_instructions_in_order() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    let (id, created) =
        db.get_or_create_sequence("mov;lock xadd;jz", None, "").expect("insert sequence");
    assert!(created);

    let counts = db.counts().expect("counts");
    assert_eq!(counts.instructions, 3);
    assert_eq!(counts.sequences, 1);

    let instructions = db.sequence_instructions(id).expect("sequence instructions");
    let texts: Vec<&str> = instructions.iter().map(|i| i.instruction.as_str()).collect();
    assert_eq!(texts, vec!["mov", "lock xadd", "jz"]);

    // Control flow is set on the jump only.
    let flags: Vec<bool> = instructions.iter().map(|i| i.control_flow).collect();
    assert_eq!(flags, vec![false, false, true]);
}

#[test]
fn sequence_get_or_create_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    let (first, created_first) =
        db.get_or_create_sequence("mov;jz", None, "").expect("first insert");
    let (second, created_second) =
        db.get_or_create_sequence("mov;jz", Some("ignored"), "ignored").expect("second call");

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first, second);
    assert_eq!(db.counts().expect("counts").sequences, 1);
}

#[test]
fn sequence_dedup_keys_on_literal_source_text() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    // Same instruction list, different separators: two records by contract.
    let (semicolon, _) = db.get_or_create_sequence("mov;jz", None, "").expect("semicolon form");
    let (comma, _) = db.get_or_create_sequence("mov,jz", None, "").expect("comma form");
    assert_ne!(semicolon, comma);
    assert_eq!(db.counts().expect("counts").sequences, 2);
    // Instructions are still shared.
    assert_eq!(db.counts().expect("counts").instructions, 2);
}

#[test]
fn sequence_with_invalid_token_inserts_nothing() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    match db.get_or_create_sequence("mov;lock;jz", None, "") {
        Err(CatalogError::InvalidInstruction(_)) => {}
        other => panic!("expected InvalidInstruction, got {other:?}"),
    }

    // Every token is validated before anything touches the catalog.
    let counts = db.counts().expect("counts");
    assert_eq!(counts.instructions, 0);
    assert_eq!(counts.sequences, 0);
}

#[test]
fn sequence_instructions_of_unknown_id_fail() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    match db.sequence_instructions(42) {
        Err(CatalogError::UnknownSequence { id }) => assert_eq!(id, 42),
        other => panic!("expected UnknownSequence, got {other:?}"),
    }
}

#[test]
fn barrier_sentinel_is_a_valid_sequence_element() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    // A lone empty token models a pure compiler/memory barrier.
    let (id, created) = db.get_or_create_sequence("", None, "barrier").expect("barrier");
    assert!(created);
    let instructions = db.sequence_instructions(id).expect("instructions");
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0].instruction, "");
    assert!(instructions[0].test_case.is_empty());
}

use census_core::db::{CatalogDb, CatalogError};
use rusqlite::params;
use tempfile::tempdir;

/// Seed system -> {kernel, drivers}, drivers -> {network}, plus a separate
/// top-level multimedia. Returns (system, kernel, drivers, network).
fn seed_forest(db: &CatalogDb) -> (i64, i64, i64, i64) {
    let system = db.seed_category("system", None).expect("seed system");
    let kernel = db.seed_category("kernel", Some(system)).expect("seed kernel");
    let drivers = db.seed_category("drivers", Some(system)).expect("seed drivers");
    let network = db.seed_category("network", Some(drivers)).expect("seed network");
    db.seed_category("multimedia", None).expect("seed multimedia");
    (system, kernel, drivers, network)
}

#[test]
fn children_returns_direct_children_only() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");
    let (system, _, _, _) = seed_forest(&db);

    let children = db.category_children(system).expect("children");
    let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["kernel", "drivers"]);
}

#[test]
fn descendants_walk_depth_first_and_are_repeatable() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");
    let (system, _, _, _) = seed_forest(&db);

    let first = db.category_descendants(system).expect("descendants");
    let names: Vec<&str> = first.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["kernel", "drivers", "network"]);

    // The traversal is materialized; running it again yields the same walk.
    let second = db.category_descendants(system).expect("descendants again");
    assert_eq!(first, second);
}

#[test]
fn descendants_of_unknown_category_fail() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    match db.category_descendants(7) {
        Err(CatalogError::UnknownCategory { id }) => assert_eq!(id, 7),
        other => panic!("expected UnknownCategory, got {other:?}"),
    }
}

#[test]
fn root_walk_terminates_at_top_level() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");
    let (system, kernel, _, network) = seed_forest(&db);

    assert_eq!(db.category_root(network).expect("root of network").id, system);
    assert_eq!(db.category_root(kernel).expect("root of kernel").id, system);
    // A top-level category is its own root.
    assert_eq!(db.category_root(system).expect("root of system").id, system);
}

#[test]
fn injected_cycle_is_detected_not_looped() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");
    let (system, _, _, network) = seed_forest(&db);

    // The API never re-points parents; corrupt the table directly to
    // simulate a database damaged out-of-band.
    db.connection()
        .execute("UPDATE categories SET parent_id = ?1 WHERE id = ?2", params![network, system])
        .expect("inject cycle");

    match db.category_root(network) {
        Err(CatalogError::TaxonomyCycle { .. }) => {}
        other => panic!("expected TaxonomyCycle from root walk, got {other:?}"),
    }
    match db.category_descendants(system) {
        Err(CatalogError::TaxonomyCycle { .. }) => {}
        other => panic!("expected TaxonomyCycle from descendants, got {other:?}"),
    }
}

#[test]
fn seeding_an_existing_name_never_repoints_its_parent() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");
    let (system, kernel, _, _) = seed_forest(&db);

    let other_root = db.seed_category("games", None).expect("seed games");
    let again = db.seed_category("kernel", Some(other_root)).expect("re-seed kernel");
    assert_eq!(again, kernel);

    let record = db.find_category_by_name("kernel").expect("find").expect("kernel exists");
    assert_eq!(record.parent_id, Some(system));
}

#[test]
fn seeding_under_an_unknown_parent_fails() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    match db.seed_category("orphan", Some(99)) {
        Err(CatalogError::UnknownCategory { id }) => assert_eq!(id, 99),
        other => panic!("expected UnknownCategory, got {other:?}"),
    }
}

#[test]
fn get_or_create_category_always_creates_top_level() {
    let dir = tempdir().expect("tempdir");
    let db = CatalogDb::open(&dir.path().join("catalog.db")).expect("open db");

    let id = db.get_or_create_category("crypto").expect("create");
    let again = db.get_or_create_category("crypto").expect("lookup");
    assert_eq!(id, again);

    let record = db.find_category_by_name("crypto").expect("find").expect("crypto exists");
    assert_eq!(record.parent_id, None);

    let tops = db.top_level_categories().expect("top level");
    assert_eq!(tops.len(), 1);
    assert_eq!(tops[0].name, "crypto");
}

use assert_cmd::cargo::cargo_bin_cmd;
use census_core::db::CatalogLayout;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn help_runs_successfully() {
    cargo_bin_cmd!("asm-census").arg("--help").assert().success();
}

/// init without an explicit --root should use the current directory as the
/// catalog root and write the config file.
#[test]
fn init_uses_default_root_when_not_provided() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .current_dir(root)
        .arg("init")
        .arg("--name")
        .arg("TestCatalog")
        .assert()
        .success();

    let layout = CatalogLayout::new(root);
    assert!(
        layout.catalog_config_path.exists(),
        "catalog config should exist at {}",
        layout.catalog_config_path.display()
    );
    assert!(layout.db_path.exists(), "catalog db should exist");
    assert!(layout.projects_dir.is_dir());
    assert!(layout.reports_dir.is_dir());
    assert!(layout.plots_dir.is_dir());
}

/// info should fail (non-zero exit) if no catalog config exists.
#[test]
fn info_fails_when_config_missing() {
    let dir = tempdir().expect("tempdir");

    cargo_bin_cmd!("asm-census")
        .arg("info")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn info_reports_counts_for_a_fresh_catalog() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .arg("init")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("TestCatalog")
        .assert()
        .success();

    cargo_bin_cmd!("asm-census")
        .arg("info")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Catalog: TestCatalog"))
        .stdout(predicate::str::contains("Projects: 0"));
}

#[test]
fn add_project_rejects_malformed_urls() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    let metrics_path = root.join("metrics.json");
    std::fs::write(&metrics_path, "{}").expect("write metrics");

    cargo_bin_cmd!("asm-census")
        .arg("add-project")
        .arg("--root")
        .arg(root)
        .arg("--url")
        .arg("ftp://example.com/not-a-repo")
        .arg("--metrics")
        .arg(&metrics_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid repository URL"));
}

#[test]
fn stats_runs_on_an_empty_catalog() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    cargo_bin_cmd!("asm-census")
        .arg("stats")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Projects:"));
}

#[test]
fn check_passes_on_an_empty_catalog() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    cargo_bin_cmd!("asm-census")
        .arg("check")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("no violations"));
}

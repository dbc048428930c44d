use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn seeded_hierarchy_is_displayed_as_an_indented_tree() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    let seed_path = root.join("categories.yaml");
    std::fs::write(
        &seed_path,
        r#"
system:
  kernel:
  drivers: [network, storage]
multimedia:
"#,
    )
    .expect("write seed file");

    cargo_bin_cmd!("asm-census")
        .arg("seed-categories")
        .arg("--root")
        .arg(root)
        .arg("--file")
        .arg(&seed_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 6 categories"));

    cargo_bin_cmd!("asm-census")
        .arg("categories")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("system"))
        .stdout(predicate::str::contains("\tkernel"))
        .stdout(predicate::str::contains("\tdrivers"))
        .stdout(predicate::str::contains("\t\tnetwork"))
        .stdout(predicate::str::contains("\t\tstorage"))
        .stdout(predicate::str::contains("multimedia"));
}

#[test]
fn categories_of_an_empty_catalog_print_a_placeholder() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("asm-census")
        .arg("init")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    cargo_bin_cmd!("asm-census")
        .arg("categories")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn attach_categories_lists_the_resulting_set() {
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
        .arg("https://github.com/redis/redis")
        .arg("--metrics")
        .arg(&metrics_path)
        .assert()
        .success();

    cargo_bin_cmd!("asm-census")
        .arg("attach-categories")
        .arg("--root")
        .arg(root)
        .arg("--url")
        .arg("https://github.com/redis/redis")
        .arg("--categories")
        .arg("database, caching")
        .assert()
        .success()
        .stdout(predicate::str::contains("database"))
        .stdout(predicate::str::contains("caching"));
}

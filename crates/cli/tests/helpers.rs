use std::path::Path;

use asm_census::{infer_catalog_name, parse_repo_url, split_category_list};

#[test]
fn infer_catalog_name_uses_last_path_component() {
    assert_eq!(infer_catalog_name(Path::new("/work/inline-asm-study")), "inline-asm-study");
    assert_eq!(infer_catalog_name(Path::new("/tmp/census-root")), "census-root");
}

#[test]
fn infer_catalog_name_falls_back_when_missing() {
    assert_eq!(infer_catalog_name(Path::new("/")), "unnamed-catalog");
}

#[test]
fn parse_repo_url_extracts_owner_and_name() {
    let (organization, name) =
        parse_repo_url("https://github.com/graalvm/sulong").expect("valid url");
    assert_eq!(organization, "graalvm");
    assert_eq!(name, "sulong");

    // A trailing slash is tolerated.
    let (organization, name) =
        parse_repo_url("https://github.com/torvalds/linux/").expect("valid url");
    assert_eq!(organization, "torvalds");
    assert_eq!(name, "linux");
}

#[test]
fn parse_repo_url_rejects_malformed_urls() {
    for bad in [
        "http://github.com/graalvm/sulong",
        "https://gitlab.com/graalvm/sulong",
        "https://github.com/graalvm",
        "https://github.com/graalvm/sulong/tree/master",
        "https://github.com//sulong",
        "https://github.com/graal vm/sulong",
        "git@github.com:graalvm/sulong.git",
    ] {
        assert!(parse_repo_url(bad).is_err(), "expected rejection of {bad:?}");
    }
}

#[test]
fn split_category_list_trims_and_drops_empties() {
    assert_eq!(
        split_category_list("database, crypto ,,  games"),
        vec!["database", "crypto", "games"]
    );
    assert!(split_category_list("").is_empty());
    assert!(split_category_list(" , ").is_empty());
}

use std::fs;

use anyhow::{bail, Context, Result};
use census_core::db::{CatalogDb, CategoryRecord};

use crate::commands::open_catalog_context;

/// Display the whole category taxonomy as an indented tree.
pub fn list_categories_command(root: &str) -> Result<()> {
    let ctx = open_catalog_context(root)?;

    let top_level = ctx.db.top_level_categories().context("Failed to list categories")?;
    if top_level.is_empty() {
        println!("Categories:");
        println!("(none)");
        return Ok(());
    }

    println!("Categories:");
    // Iterative depth-first walk; the indent level rides along on the stack.
    let mut stack: Vec<(CategoryRecord, usize)> =
        top_level.into_iter().rev().map(|category| (category, 0)).collect();
    while let Some((category, depth)) = stack.pop() {
        println!("{}{}", "\t".repeat(depth), category.name);
        let mut children = ctx
            .db
            .category_children(category.id)
            .context("Failed to list category children")?;
        children.reverse();
        stack.extend(children.into_iter().map(|child| (child, depth + 1)));
    }

    Ok(())
}

/// Load a pre-seeded category hierarchy from a YAML file.
///
/// The document is a nested mapping of category names; mapping values may be
/// further mappings, lists, single names, or null for leaves:
///
/// ```yaml
/// system:
///   kernel:
///   drivers: [network, storage]
/// multimedia:
/// ```
pub fn seed_categories_command(root: &str, file: &str) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read category seed file {file}"))?;
    let doc: serde_yaml::Value =
        serde_yaml::from_str(&text).context("Failed to parse category seed YAML")?;

    let ctx = open_catalog_context(root)?;
    let seeded = seed_value(&ctx.db, &doc, None)?;

    println!("Seeded {} categor{}", seeded, if seeded == 1 { "y" } else { "ies" });
    Ok(())
}

fn seed_value(db: &CatalogDb, value: &serde_yaml::Value, parent: Option<i64>) -> Result<usize> {
    match value {
        serde_yaml::Value::Null => Ok(0),
        serde_yaml::Value::String(name) => {
            db.seed_category(name, parent)?;
            Ok(1)
        }
        serde_yaml::Value::Sequence(items) => {
            let mut seeded = 0;
            for item in items {
                seeded += seed_value(db, item, parent)?;
            }
            Ok(seeded)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut seeded = 0;
            for (key, child) in mapping {
                let name = key
                    .as_str()
                    .with_context(|| format!("Category names must be strings, got {key:?}"))?;
                let id = db.seed_category(name, parent)?;
                seeded += 1 + seed_value(db, child, Some(id))?;
            }
            Ok(seeded)
        }
        other => bail!("Unsupported YAML node in category seed: {other:?}"),
    }
}

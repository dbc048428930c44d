use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

pub mod commands;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Infer a catalog name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-catalog`.
pub fn infer_catalog_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-catalog").to_string()
}

/// Extract organization and repository name from a hosting URL.
///
/// For example, `https://github.com/graalvm/sulong` yields
/// `("graalvm", "sulong")`. Anything not of the form
/// `https://github.com/<owner>/<name>` is rejected; project identity in the
/// catalog is the URL, so malformed ones must never get that far.
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let invalid = || anyhow!("{url:?} is not a valid repository URL (expected https://github.com/<owner>/<name>)");

    let rest = url.strip_prefix("https://github.com/").ok_or_else(invalid)?;
    let rest = rest.trim_end_matches('/');
    let mut segments = rest.split('/');
    let organization = segments.next().unwrap_or("");
    let name = segments.next().unwrap_or("");
    if organization.is_empty()
        || name.is_empty()
        || segments.next().is_some()
        || !is_valid_url_segment(organization)
        || !is_valid_url_segment(name)
    {
        return Err(invalid());
    }
    Ok((organization.to_string(), name.to_string()))
}

fn is_valid_url_segment(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Split a comma-separated category list into trimmed, non-empty names.
pub fn split_category_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect()
}

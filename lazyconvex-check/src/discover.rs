//! Project layout discovery
//!
//! The checker runs from a project root. The function directory is `convex/`
//! with a `_generated/` child, either directly under the root or one level
//! below it. The schema is the first TypeScript sibling of that directory
//! that calls one of the table-map builders.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CheckError;

/// Substrings that mark a file as the schema module
const SCHEMA_MARKERS: &[&str] = &["makeOwned(", "makeOrgScoped(", "makeSingleton(", "makeBase(", "child("];

/// A located schema file
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub path: PathBuf,
    pub text: String,
}

impl SchemaFile {
    /// File name used when attributing issues
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn has_generated(dir: &Path) -> bool {
    dir.join("_generated").is_dir()
}

/// Sorted directory entries accepted by `include`
fn sorted_entries(dir: &Path, include: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, CheckError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CheckError::io(dir, e))? {
        let path = entry.map_err(|e| CheckError::io(dir, e))?.path();
        if include(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Locate the function directory under `root`
pub fn find_convex_dir(root: &Path) -> Result<PathBuf, CheckError> {
    let direct = root.join("convex");
    if has_generated(&direct) {
        return Ok(direct);
    }
    if !root.is_dir() {
        return Err(CheckError::ConvexDirNotFound(root.to_path_buf()));
    }

    for sub in sorted_entries(root, Path::is_dir)? {
        let nested = sub.join("convex");
        if has_generated(&nested) {
            debug!(dir = %nested.display(), "found nested convex directory");
            return Ok(nested);
        }
    }
    Err(CheckError::ConvexDirNotFound(root.to_path_buf()))
}

/// Whether `text` looks like the schema module
pub fn is_schema_source(text: &str) -> bool {
    SCHEMA_MARKERS.iter().any(|marker| text.contains(marker))
}

fn is_schema_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file() && name.ends_with(".ts") && !name.ends_with(".test.ts") && !name.ends_with(".config.ts")
}

/// Locate the schema file beside `convex_dir`
pub fn find_schema_file(convex_dir: &Path) -> Result<SchemaFile, CheckError> {
    let search_dir = convex_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if !search_dir.is_dir() {
        return Err(CheckError::SchemaNotFound(search_dir.to_path_buf()));
    }

    for path in sorted_entries(search_dir, is_schema_candidate)? {
        let text = fs::read_to_string(&path).map_err(|e| CheckError::io(&path, e))?;
        if is_schema_source(&text) {
            return Ok(SchemaFile { path, text });
        }
    }
    Err(CheckError::SchemaNotFound(search_dir.to_path_buf()))
}

/// Whether `file_name` in the function directory is checked for factory calls
pub fn is_checked_file(file_name: &str) -> bool {
    file_name.ends_with(".ts")
        && !file_name.starts_with('_')
        && !file_name.contains(".test.")
        && !file_name.contains(".config.")
}

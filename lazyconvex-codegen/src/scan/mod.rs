//! Backend function-module scanning
//!
//! Module sources are only read as text, never executed. Each module yields
//! its exported names and factory calls, and is matched to a schema table.

pub mod exports;
pub mod factory;
pub mod mask;

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::GeneratorError;
use crate::harvest::Model;
use crate::ir::ModuleDescriptor;

pub use exports::exported_names;
pub use factory::{detect_options, endpoints, find_factory_calls};

/// Module names that never produce client bindings
const SKIPPED_MODULES: &[&str] = &["_generated", "auth", "auth.config", "http", "schema", "testauth"];

/// A module source file read from the function directory
#[derive(Debug, Clone)]
pub struct ModuleSource {
    /// File name, e.g. `blog.ts`
    pub file: String,

    /// Full source text
    pub text: String,
}

impl ModuleSource {
    /// Module name: the file name without its `.ts` extension
    pub fn module_name(&self) -> &str {
        self.file.strip_suffix(".ts").unwrap_or(&self.file)
    }
}

/// Whether `file_name` is a function module the generator binds
pub fn is_module_file(file_name: &str) -> bool {
    let Some(stem) = file_name.strip_suffix(".ts") else {
        return false;
    };
    !file_name.contains(".test.") && !SKIPPED_MODULES.contains(&stem)
}

/// Read every file in `dir` accepted by `include`, sorted by file name
pub fn read_sources(
    dir: &Path,
    include: impl Fn(&str) -> bool,
) -> Result<Vec<ModuleSource>, GeneratorError> {
    let entries = fs::read_dir(dir).map_err(|e| GeneratorError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GeneratorError::io(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if include(&name) {
            files.push(name);
        }
    }
    files.sort();

    files
        .into_iter()
        .map(|file| {
            let path = dir.join(&file);
            let text = fs::read_to_string(&path).map_err(|e| GeneratorError::io(&path, e))?;
            Ok(ModuleSource { file, text })
        })
        .collect()
}

/// Lowercase the first ASCII letter: module `Blog` serves table `blog`
fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Build module descriptors, in source order
///
/// Modules without exports are dropped. A module serves the table named like
/// itself (first letter lowercased); when no such table exists, the first
/// factory call naming a schema table decides.
pub fn build_modules(sources: &[ModuleSource], model: &Model) -> Vec<ModuleDescriptor> {
    let mut modules = Vec::new();

    for source in sources {
        let exports = exported_names(&source.text);
        if exports.is_empty() {
            debug!(file = %source.file, "module has no exports, skipping");
            continue;
        }

        let name = source.module_name().to_string();
        let factory_calls = find_factory_calls(&source.file, &source.text);
        for call in &factory_calls {
            if model.table(&call.table).is_none() {
                warn!(
                    file = %source.file,
                    factory = %call.kind,
                    table = %call.table,
                    "factory call names a table missing from the schema"
                );
            }
        }

        let own_table = lower_first(&name);
        let table = if model.table(&own_table).is_some() {
            own_table
        } else {
            factory_calls
                .iter()
                .find(|call| model.table(&call.table).is_some())
                .map(|call| call.table.clone())
                .unwrap_or(own_table)
        };
        let kind = model.table(&table).map(|t| t.kind);

        debug!(
            module = %name,
            table = %table,
            exports = exports.len(),
            factories = factory_calls.len(),
            "scanned module"
        );

        modules.push(ModuleDescriptor {
            name,
            exports,
            table,
            kind,
            factory_calls,
        });
    }

    modules
}

//! Output assembly
//!
//! Both client files are built fully in memory first. Files are only written
//! once every stage has succeeded, each through a temporary sibling that is
//! renamed into place.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::GeneratorError;
use crate::filter;
use crate::harvest::Model;
use crate::ir::{ModuleDescriptor, WhereDescriptor};
use crate::overlay::{self, CustomConfig};
use crate::swift::naming::api_name;
use crate::swift::{ModuleContext, SwiftWriter, Target, custom, models, subscription, wrapper};

/// Counts reported after generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Table structs plus synthesized records
    pub structs: usize,
    pub enums: usize,
    pub modules: usize,

    /// `module:function` constants across all modules
    pub api_constants: usize,

    /// Typed wrapper methods in the full client
    pub wrappers: usize,
    pub wheres: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} structs, {} enums, {} modules, {} API constants, {} typed wrappers, {} Where structs",
            self.structs, self.enums, self.modules, self.api_constants, self.wrappers, self.wheres
        )
    }
}

/// Everything the generator derived, ready to render
pub struct Inputs<'a> {
    pub model: &'a Model,
    pub modules: &'a [ModuleDescriptor],
    pub wheres: &'a [WhereDescriptor],
    pub config: &'a CustomConfig,
}

impl<'a> Inputs<'a> {
    fn context(&self, module: &'a ModuleDescriptor) -> ModuleContext<'a> {
        ModuleContext {
            module,
            table: self.model.table(&module.table),
            where_record: filter::find(self.wheres, &module.table),
            registry: &self.model.registry,
        }
    }

    /// CRUD wrappers then custom functions, skipping names already covered
    fn functions(&self, ctx: &ModuleContext<'_>, target: Target) -> Vec<SwiftWriter> {
        let crud = wrapper::crud_functions(ctx, target);
        let taken: HashSet<&str> = crud.iter().map(|(name, _)| *name).collect();

        let mut functions: Vec<SwiftWriter> = crud.into_iter().map(|(_, w)| w).collect();
        for function in overlay::functions_for(ctx.module, self.model, self.config) {
            if taken.contains(function.name.as_str()) {
                debug!(
                    module = %ctx.module.name,
                    function = %function.name,
                    "custom descriptor shadowed by CRUD wrapper"
                );
                continue;
            }
            functions.extend(custom::emit(ctx, &function, target));
        }
        functions
    }
}

/// Append `functions` separated by blank lines
fn push_separated(w: &mut SwiftWriter, functions: Vec<SwiftWriter>) {
    for (i, function) in functions.into_iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        w.append(function);
    }
}

/// Render the full client file
pub fn render_full(inputs: &Inputs<'_>) -> (String, Stats) {
    let model = inputs.model;
    let mut w = SwiftWriter::new();
    let mut emitted = HashSet::new();
    let mut stats = Stats {
        enums: model.registry.enums().len(),
        modules: inputs.modules.len(),
        wheres: inputs.wheres.len(),
        ..Stats::default()
    };

    models::emit_header(&mut w, Target::Full);
    models::emit_records(&mut w, &model.registry, &mut emitted);
    models::emit_enums(&mut w, &model.registry, &mut emitted);
    let tables = models::emit_tables(&mut w, &model.tables, &mut emitted);
    stats.structs = tables + model.registry.records().len();
    models::emit_fixed(&mut w, &emitted);
    for record in inputs.wheres {
        models::emit_where(&mut w, record);
    }

    for module in inputs.modules {
        let ctx = inputs.context(module);
        stats.api_constants += module.exports.len();

        w.line(0, format!("public enum {} {{", api_name(&module.name)));
        for function in &module.exports {
            w.line(1, format!("public static let {function} = \"{}\"", ctx.key(function)));
        }
        if wrapper::has_list_args(&ctx) {
            w.blank();
            w.append(wrapper::list_args(&ctx));
        }

        let functions = inputs.functions(&ctx, Target::Full);
        stats.wrappers += functions.len();
        if !functions.is_empty() {
            w.blank();
            w.line(1, "#if DESKTOP");
            push_separated(&mut w, functions);
            w.line(1, "#endif");
        }
        w.line(0, "}");
        w.blank();
    }

    models::emit_footer(&mut w);
    (w.finish(), stats)
}

/// Render the reduced client file
///
/// It only extends the API enums declared by the full file.
pub fn render_reduced(inputs: &Inputs<'_>) -> String {
    let mut w = SwiftWriter::new();
    models::emit_header(&mut w, Target::Reduced);

    for module in inputs.modules {
        let ctx = inputs.context(module);
        let api = api_name(&module.name);

        let functions = inputs.functions(&ctx, Target::Reduced);
        if !functions.is_empty() {
            w.blank();
            w.line(0, format!("extension {api} {{"));
            push_separated(&mut w, functions);
            w.line(0, "}");
        }

        let subscriptions: Vec<SwiftWriter> = inputs
            .config
            .subscriptions_for(&module.name)
            .iter()
            .map(|sub| subscription::emit(&ctx, sub))
            .collect();
        if !subscriptions.is_empty() {
            w.blank();
            w.line(0, format!("extension {api} {{"));
            push_separated(&mut w, subscriptions);
            w.line(0, "}");
        }
    }

    w.finish()
}

/// Write `contents` to `path` through a temporary sibling
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), GeneratorError> {
    let write_err = |source| GeneratorError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    info!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::harvest;
    use crate::schema::SchemaModule;
    use crate::scan::{ModuleSource, build_modules};

    fn inputs_for(schema: &str, sources: &[(&str, &str)]) -> (Model, Vec<ModuleDescriptor>, Vec<WhereDescriptor>) {
        let model = harvest(&SchemaModule::parse(schema).unwrap()).unwrap();
        let sources: Vec<ModuleSource> = sources
            .iter()
            .map(|(file, text)| ModuleSource {
                file: file.to_string(),
                text: text.to_string(),
            })
            .collect();
        let modules = build_modules(&sources, &model);
        let wheres = filter::derive(&model);
        (model, modules, wheres)
    }

    const BLOG_SCHEMA: &str = r#"{"owned": {"blog": {"type": "object", "shape": {
        "title": {"type": "string"},
        "content": {"type": "string"},
        "category": {"type": "enum", "values": ["tech", "life", "tutorial"]},
        "published": {"type": "boolean"},
        "coverImage": {"type": "optional", "innerType": {"type": "custom"}}
    }}}}"#;

    const BLOG_MODULE: &str = r#"import { crud } from './lazy'
export const { create, update, rm, read, list, bulkRm } = crud('blog', owned.blog)
"#;

    #[test]
    fn test_full_file_layout() {
        let (model, modules, wheres) = inputs_for(BLOG_SCHEMA, &[("blog.ts", BLOG_MODULE)]);
        let config = CustomConfig::default();
        let inputs = Inputs {
            model: &model,
            modules: &modules,
            wheres: &wheres,
            config: &config,
        };
        let (full, stats) = render_full(&inputs);

        let enum_at = full.find("public enum BlogCategory").unwrap();
        let struct_at = full.find("public struct Blog: Codable, Identifiable, Sendable {").unwrap();
        let fixed_at = full.find("public struct Author: Codable, Sendable {").unwrap();
        let where_at = full.find("public struct BlogWhere: Sendable {").unwrap();
        let api_at = full.find("public enum BlogAPI {").unwrap();
        assert!(enum_at < struct_at && struct_at < fixed_at && fixed_at < where_at && where_at < api_at);

        assert!(full.contains("    public static let bulkRm = \"blog:bulkRm\"\n"));
        assert!(full.contains("\n    #if DESKTOP\n    public static func list(\n"));
        assert!(full.ends_with("}\n\n// swiftlint:enable file_types_order file_length\n"));
        assert!(!full.contains("func search("));
        assert!(!full.contains("func restore("));

        assert_eq!(
            stats,
            Stats {
                structs: 1,
                enums: 1,
                modules: 1,
                api_constants: 6,
                wrappers: 6,
                wheres: 1,
            }
        );
        assert_eq!(
            stats.to_string(),
            "1 structs, 1 enums, 1 modules, 6 API constants, 6 typed wrappers, 1 Where structs"
        );
    }

    #[test]
    fn test_reduced_file_extends_api_enums() {
        let (model, modules, wheres) = inputs_for(BLOG_SCHEMA, &[("blog.ts", BLOG_MODULE)]);
        let config = CustomConfig::parse(
            Path::new("c.json"),
            r#"{"subscriptions": {"blog": [
                {"methodName": "subscribeList", "fn": "list", "swiftType": "PaginatedResult<Blog>",
                 "paginated": true, "skipMethod": "subscribePaginatedBlogs", "whereType": "BlogWhere"}
            ]}}"#,
        )
        .unwrap();
        let inputs = Inputs {
            model: &model,
            modules: &modules,
            wheres: &wheres,
            config: &config,
        };
        let reduced = render_reduced(&inputs);
        assert!(reduced.starts_with(
            "// Auto-generated by lazyconvex-codegen-swift. DO NOT EDIT.\n// swiftlint:disable file_length\nimport Foundation\n\n\nextension BlogAPI {\n    public static func create(\n"
        ));
        assert_eq!(reduced.matches("extension BlogAPI {").count(), 2);
        assert!(!reduced.contains("public static func list("));
        assert!(!reduced.contains("public static func read("));
        assert!(reduced.contains("let args = listArgs(where: filterWhere)"));
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/Api.swift");
        write_atomic(&path, "import Foundation\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "import Foundation\n");
        assert!(!path.with_file_name(".Api.swift.tmp").exists());
    }
}

//! CRUD wrappers
//!
//! One typed method per exported factory endpoint. Each wrapper only turns
//! typed parameters into the backend's argument dictionary; retries and
//! caching belong to the client it calls through.

use crate::ir::{FieldEntry, FieldType, Fields, Scalar, TableKind};
use crate::overlay::CallKind;

use super::naming::{swift_type, where_name};
use super::{ModuleContext, SwiftWriter, Target, wire_value};

/// `name: T` or `name: T? = nil`
fn param(name: &str, entry: &FieldEntry, force_optional: bool) -> String {
    let ty = swift_type(&entry.ty);
    if force_optional || entry.optional {
        format!("{name}: {ty}? = nil")
    } else {
        format!("{name}: {ty}")
    }
}

/// Copy an optional parameter into `args` when present
fn guard(name: &str, ty: &FieldType) -> String {
    format!("if let {name} {{ args[\"{name}\"] = {} }}", wire_value(name, ty))
}

/// Org-scoped endpoints take the organization as an extra leading argument
fn scope(ctx: &ModuleContext<'_>) -> (Vec<String>, Vec<String>) {
    if ctx.is_org_scoped() {
        (vec!["orgId: String".into()], vec!["\"orgId\": orgId".into()])
    } else {
        (Vec::new(), Vec::new())
    }
}

/// Every CRUD wrapper the module exports for `target`, in emission order,
/// paired with its function name
pub fn crud_functions(ctx: &ModuleContext<'_>, target: Target) -> Vec<(&'static str, SwiftWriter)> {
    let Some(table) = ctx.table else {
        return Vec::new();
    };
    let exports = |name: &str| ctx.module.exports(name);
    let fields = &table.user_fields;
    let mut out = Vec::new();

    match (table.kind, target) {
        (TableKind::Owned | TableKind::OrgScoped, Target::Full) => {
            if exports("list") {
                out.push(("list", list(ctx)));
            }
            if exports("search") {
                out.push(("search", search(ctx)));
            }
            if exports("create") {
                out.push(("create", create(ctx, fields, target)));
            }
            if exports("update") {
                out.push(("update", update(ctx, fields, target)));
            }
            if exports("rm") {
                out.push(("rm", by_id(ctx, "rm", target)));
            }
            if exports("read") {
                out.push(("read", read(ctx)));
            }
            if exports("restore") {
                out.push(("restore", by_id(ctx, "restore", target)));
            }
            if exports("bulkRm") {
                out.push(("bulkRm", bulk_rm(ctx, target)));
            }
        }
        (TableKind::Owned | TableKind::OrgScoped, Target::Reduced) => {
            if exports("create") {
                out.push(("create", create(ctx, fields, target)));
            }
            if exports("update") {
                out.push(("update", update(ctx, fields, target)));
            }
            if exports("rm") {
                out.push(("rm", by_id(ctx, "rm", target)));
            }
            if exports("restore") {
                out.push(("restore", by_id(ctx, "restore", target)));
            }
            if exports("bulkRm") {
                out.push(("bulkRm", bulk_rm(ctx, target)));
            }
        }
        (TableKind::Singleton, _) => {
            if exports("upsert") {
                out.push(("upsert", upsert(ctx, fields, target)));
            }
            if exports("get") && target == Target::Full {
                out.push(("get", get(ctx)));
            }
        }
        (TableKind::Child, Target::Full) => {
            let arg_safe = fields.iter().all(|(_, entry)| entry.ty.is_arg_safe());
            if exports("create") && arg_safe {
                out.push(("create", create(ctx, fields, target)));
            }
        }
        (TableKind::Child, Target::Reduced) | (TableKind::Base, _) => {}
    }

    out
}

/// Whether the module gets a `listArgs` helper
pub fn has_list_args(ctx: &ModuleContext<'_>) -> bool {
    ctx.kind().is_some_and(TableKind::is_filterable) && ctx.module.exports("list")
}

/// Pagination payload builder shared by `list` and subscriptions
pub fn list_args(ctx: &ModuleContext<'_>) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (mut params, mut args) = scope(ctx);
    params.push("numItems: Int = 50".into());
    params.push("cursor: String? = nil".into());
    if ctx.where_record.is_some() {
        params.push(format!("`where`: {}? = nil", where_name(&ctx.module.table)));
    }
    args.push("\"paginationOpts\": paginationOpts".into());

    w.multiline_signature("listArgs", &params, "-> [String: Any] {");
    w.line(2, "var paginationOpts: [String: Any] = [\"numItems\": numItems]");
    w.line(
        2,
        "if let cursor { paginationOpts[\"cursor\"] = cursor } else { paginationOpts[\"cursor\"] = NSNull() }",
    );
    if ctx.where_record.is_some() {
        w.line(2, format!("var args: [String: Any] = [{}]", args.join(", ")));
        w.line(2, "if let w = `where` { args[\"where\"] = w.toDict() }");
        w.line(2, "return args");
    } else {
        w.line(2, format!("return [{}]", args.join(", ")));
    }
    w.line(1, "}");
    w
}

fn list(ctx: &ModuleContext<'_>) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let mut params = Target::Full.params();
    let mut call = Vec::new();
    if ctx.is_org_scoped() {
        params.push("orgId: String".into());
        call.push("orgId: orgId");
    }
    params.push("numItems: Int = 50".into());
    params.push("cursor: String? = nil".into());
    call.extend(["numItems: numItems", "cursor: cursor"]);
    if ctx.where_record.is_some() {
        params.push(format!("`where`: {}? = nil", where_name(&ctx.module.table)));
        call.push("where: `where`");
    }

    let tail = format!("async throws -> PaginatedResult<{}> {{", ctx.struct_name());
    w.multiline_signature("list", &params, &tail);
    w.line(
        2,
        format!(
            "try await client.query(\"{}\", args: listArgs({}))",
            ctx.key("list"),
            call.join(", ")
        ),
    );
    w.line(1, "}");
    w
}

fn search(ctx: &ModuleContext<'_>) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (scope_params, mut args) = scope(ctx);
    let mut params = Target::Full.params();
    params.extend(scope_params);
    params.push("query searchQuery: String".into());
    params.push("numItems: Int = 20".into());
    params.push("cursor: String? = nil".into());
    args.push("\"paginationOpts\": paginationOpts".into());
    args.push("\"query\": searchQuery".into());

    let tail = format!("async throws -> PaginatedResult<{}> {{", ctx.struct_name());
    w.multiline_signature("search", &params, &tail);
    w.line(2, "var paginationOpts: [String: Any] = [\"numItems\": numItems]");
    w.line(
        2,
        "if let cursor { paginationOpts[\"cursor\"] = cursor } else { paginationOpts[\"cursor\"] = NSNull() }",
    );
    w.line(
        2,
        format!(
            "return try await client.query(\"{}\", args: [{}])",
            ctx.key("search"),
            args.join(", ")
        ),
    );
    w.line(1, "}");
    w
}

/// Required fields go in the literal; optional ones are copied when present
fn create(ctx: &ModuleContext<'_>, fields: &Fields, target: Target) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (scope_params, mut required) = scope(ctx);
    let mut params = target.params();
    params.extend(scope_params);
    let mut optional = Vec::new();

    for (name, entry) in fields {
        params.push(param(name, entry, false));
        if entry.optional {
            optional.push((name, &entry.ty));
        } else {
            required.push(format!("\"{name}\": {}", wire_value(name, &entry.ty)));
        }
    }

    w.multiline_signature("create", &params, "async throws {");
    let binding = if optional.is_empty() { "let" } else { "var" };
    w.line(2, format!("{binding} args: [String: Any] = [{}]", literal(&required)));
    for (name, ty) in optional {
        w.line(2, guard(name, ty));
    }
    w.line(
        2,
        format!("try await {}(\"{}\", args: args)", target.call(CallKind::Mutation), ctx.key("create")),
    );
    w.line(1, "}");
    w
}

/// Every field optional, plus the compare-and-swap guard
fn update(ctx: &ModuleContext<'_>, fields: &Fields, target: Target) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (scope_params, scope_args) = scope(ctx);
    let mut params = target.params();
    params.extend(scope_params);
    params.push("id: String".into());
    let mut required = vec!["\"id\": id".to_string()];
    required.extend(scope_args);

    for (name, entry) in fields {
        params.push(param(name, entry, true));
    }
    params.push("expectedUpdatedAt: Double? = nil".into());

    w.multiline_signature("update", &params, "async throws {");
    w.line(2, format!("var args: [String: Any] = [{}]", required.join(", ")));
    for (name, entry) in fields {
        w.line(2, guard(name, &entry.ty));
    }
    w.line(2, guard("expectedUpdatedAt", &FieldType::Scalar(Scalar::Number)));
    w.line(
        2,
        format!("try await {}(\"{}\", args: args)", target.call(CallKind::Mutation), ctx.key("update")),
    );
    w.line(1, "}");
    w
}

/// `rm` and `restore`: forward the row id
fn by_id(ctx: &ModuleContext<'_>, function: &str, target: Target) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (scope_params, scope_args) = scope(ctx);
    let mut params = target.params();
    params.extend(scope_params);
    params.push("id: String".into());
    let mut args = vec!["\"id\": id".to_string()];
    args.extend(scope_args);

    w.inline_signature(function, &params, "async throws {");
    w.line(
        2,
        format!(
            "try await {}(\"{}\", args: [{}])",
            target.call(CallKind::Mutation),
            ctx.key(function),
            args.join(", ")
        ),
    );
    w.line(1, "}");
    w
}

fn read(ctx: &ModuleContext<'_>) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (scope_params, scope_args) = scope(ctx);
    let mut params = Target::Full.params();
    params.extend(scope_params);
    params.push("id: String".into());
    let mut args = vec!["\"id\": id".to_string()];
    args.extend(scope_args);

    let tail = format!("async throws -> {} {{", ctx.struct_name());
    w.inline_signature("read", &params, &tail);
    w.line(
        2,
        format!("try await client.query(\"{}\", args: [{}])", ctx.key("read"), args.join(", ")),
    );
    w.line(1, "}");
    w
}

fn bulk_rm(ctx: &ModuleContext<'_>, target: Target) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let (scope_params, scope_args) = scope(ctx);
    let mut params = target.params();
    params.extend(scope_params);
    params.push("ids: [String]".into());
    let mut args = vec!["\"ids\": ids".to_string()];
    args.extend(scope_args);

    w.inline_signature("bulkRm", &params, "async throws {");
    w.line(
        2,
        format!(
            "try await {}(\"{}\", args: [{}])",
            target.call(CallKind::Mutation),
            ctx.key("bulkRm"),
            args.join(", ")
        ),
    );
    w.line(1, "}");
    w
}

fn upsert(ctx: &ModuleContext<'_>, fields: &Fields, target: Target) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let mut params = target.params();
    for (name, entry) in fields {
        params.push(param(name, entry, true));
    }

    w.multiline_signature("upsert", &params, "async throws {");
    w.line(2, "var args: [String: Any] = [:]");
    for (name, entry) in fields {
        w.line(2, guard(name, &entry.ty));
    }
    w.line(
        2,
        format!("try await {}(\"{}\", args: args)", target.call(CallKind::Mutation), ctx.key("upsert")),
    );
    w.line(1, "}");
    w
}

fn get(ctx: &ModuleContext<'_>) -> SwiftWriter {
    let mut w = SwiftWriter::new();
    let tail = format!("async throws -> {}? {{", ctx.struct_name());
    w.inline_signature("get", &Target::Full.params(), &tail);
    w.line(2, format!("try await client.query(\"{}\", args: [:])", ctx.key("get")));
    w.line(1, "}");
    w
}

/// Dictionary literal body; `:` for an empty dictionary
pub(crate) fn literal(entries: &[String]) -> String {
    if entries.is_empty() {
        ":".to_string()
    } else {
        entries.join(", ")
    }
}

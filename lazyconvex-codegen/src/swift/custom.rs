//! Custom-function emission
//!
//! Every descriptor is rendered in two steps: the strategy builds the argument
//! expression (possibly after a few setup lines), then the call site is
//! written for the target and call kind.

use crate::overlay::{CallKind, CustomArg, CustomFunction, StructArray, StructArrayField};

use super::wrapper::literal;
use super::{ModuleContext, SwiftWriter, Target};

/// Result type decoded and dropped by actions without a meaningful return
const VOID_ACTION_TYPE: &str = "[String: String]";

/// Render `function` for `target`
///
/// Returns `None` when the target has no counterpart, which is the case for
/// queries in the reduced client.
pub fn emit(ctx: &ModuleContext<'_>, function: &CustomFunction, target: Target) -> Option<SwiftWriter> {
    if target == Target::Reduced && function.kind == CallKind::Query {
        return None;
    }

    // Dummy-typed calls discard their result
    let returns = match (target, function.kind) {
        _ if function.dummy_action_type.is_some() => None,
        (Target::Reduced, CallKind::Mutation) => None,
        _ => function.resolved_return(&ctx.struct_name()),
    };

    let mut params = target.params();
    params.extend(
        function
            .nested_data_outer
            .iter()
            .map(|outer| format!("{outer}: String")),
    );
    params.extend(function.args.iter().map(param));

    let tail = match &returns {
        Some(ty) => format!("async throws -> {ty} {{"),
        None => "async throws {".to_string(),
    };

    let mut w = SwiftWriter::new();
    w.inline_signature(&function.name, &params, &tail);

    let mut body = SwiftWriter::new();
    let args = if function.nested_data {
        nested_payload(&mut body, function)
    } else if let Some(array) = &function.struct_array {
        struct_array_payload(&mut body, ctx, function, array)
    } else {
        plain_payload(&mut body, "args", &function.args, &[])
    };

    let key = ctx.key(&function.name);
    let has_setup = !body.is_empty();
    w.append(body);
    call(&mut w, target, function, &key, &args, returns.as_deref(), has_setup);
    w.line(1, "}");
    Some(w)
}

fn param(arg: &CustomArg) -> String {
    if arg.is_optional {
        format!("{}: {}? = nil", arg.name, arg.swift_type)
    } else {
        format!("{}: {}", arg.name, arg.swift_type)
    }
}

/// Bind `name` to a dictionary of `args` when some are optional
///
/// `prefix` entries go first in the literal. Returns the expression to send.
fn plain_payload(w: &mut SwiftWriter, name: &str, args: &[CustomArg], prefix: &[String]) -> String {
    let mut required: Vec<String> = prefix.to_vec();
    required.extend(
        args.iter()
            .filter(|a| !a.is_optional)
            .map(|a| format!("\"{}\": {}", a.wire_name(), a.wire_expr())),
    );
    let optional: Vec<&CustomArg> = args.iter().filter(|a| a.is_optional).collect();

    if optional.is_empty() {
        return format!("[{}]", literal(&required));
    }
    w.line(2, format!("var {name}: [String: Any] = [{}]", literal(&required)));
    for arg in optional {
        w.line(
            2,
            format!(
                "if let {} {{ {name}[\"{}\"] = {} }}",
                arg.name,
                arg.wire_name(),
                arg.wire_expr()
            ),
        );
    }
    name.to_string()
}

/// Arguments go in an inner `data` dictionary; outer ids stay top level
fn nested_payload(w: &mut SwiftWriter, function: &CustomFunction) -> String {
    let required: Vec<String> = function
        .args
        .iter()
        .filter(|a| !a.is_optional)
        .map(|a| format!("\"{}\": {}", a.wire_name(), a.wire_expr()))
        .collect();
    let optional: Vec<&CustomArg> = function.args.iter().filter(|a| a.is_optional).collect();

    let binding = if optional.is_empty() { "let" } else { "var" };
    w.line(2, format!("{binding} data: [String: Any] = [{}]", literal(&required)));
    for arg in optional {
        w.line(
            2,
            format!("if let {0} {{ data[\"{1}\"] = {2} }}", arg.name, arg.wire_name(), arg.wire_expr()),
        );
    }

    let mut outer: Vec<String> = function
        .nested_data_outer
        .iter()
        .map(|o| format!("\"{o}\": {o}"))
        .collect();
    outer.push("\"data\": data".into());
    format!("[{}]", outer.join(", "))
}

/// Re-encode each element of the array argument into a dictionary
///
/// Required element fields go in the literal; optional ones only when present.
fn struct_array_payload(
    w: &mut SwiftWriter,
    ctx: &ModuleContext<'_>,
    function: &CustomFunction,
    array: &StructArray,
) -> String {
    let fields = array.resolved_fields(ctx.registry);
    let dicts = format!("{}Dicts", array.arg.strip_suffix('s').unwrap_or(&array.arg));
    let (optional, required): (Vec<&StructArrayField>, Vec<&StructArrayField>) =
        fields.iter().partition(|f| f.optional);

    let entries: Vec<String> = required
        .iter()
        .map(|f| {
            let value = if f.enum_field {
                format!("p.{}.rawValue", f.name)
            } else {
                format!("p.{}", f.name)
            };
            format!("\"{}\": {value}", f.name)
        })
        .collect();
    let binding = if optional.is_empty() { "let" } else { "var" };

    w.line(2, format!("var {dicts} = [[String: Any]]()"));
    w.line(2, format!("for p in {} {{", array.arg));
    w.line(3, format!("{binding} d: [String: Any] = [{}]", literal(&entries)));
    for field in optional {
        let value = if field.enum_field {
            format!("{}.rawValue", field.name)
        } else {
            field.name.clone()
        };
        w.line(
            3,
            format!("if let {0} = p.{0} {{ d[\"{0}\"] = {value} }}", field.name),
        );
    }
    w.line(3, format!("{dicts}.append(d)"));
    w.line(2, "}");

    let others: Vec<CustomArg> = function
        .args
        .iter()
        .filter(|a| a.name != array.arg)
        .cloned()
        .collect();
    plain_payload(w, "args", &others, &[format!("\"{}\": {dicts}", array.arg)])
}

/// Write the backend call
fn call(
    w: &mut SwiftWriter,
    target: Target,
    function: &CustomFunction,
    key: &str,
    args: &str,
    returns: Option<&str>,
    has_setup: bool,
) {
    let dummy = function.dummy_action_type.as_deref();

    match (target, function.kind) {
        (Target::Reduced, CallKind::Action) => {
            let void_type = dummy.or(returns.is_none().then_some(VOID_ACTION_TYPE));
            w.line(2, "#if !SKIP");
            if let Some(ty) = void_type {
                w.line(
                    2,
                    format!(
                        "let _: {ty} = try await ConvexService.shared.action(\"{key}\", args: {args}, returning: {ty}.self)"
                    ),
                );
                w.line(2, "#else");
                w.line(2, format!("try await ConvexService.shared.action(name: \"{key}\", args: {args})"));
            } else if let Some(ty) = returns {
                w.line(
                    2,
                    format!(
                        "return try await ConvexService.shared.action(\"{key}\", args: {args}, returning: {ty}.self)"
                    ),
                );
                w.line(2, "#else");
                let (method, cast) = skip_method(function, ty);
                let bridged = format!("try await ConvexService.shared.{method}(name: \"{key}\", args: {args})");
                if cast {
                    w.line(2, format!("return Array({bridged})"));
                } else {
                    w.line(2, format!("return {bridged}"));
                }
            }
            w.line(2, "#endif");
        }
        (_, kind) => {
            let receiver = target.call(kind);
            match dummy {
                Some(ty) => w.line(2, format!("let _: {ty} = try await {receiver}(\"{key}\", args: {args})")),
                None => {
                    let ret = if returns.is_some() && has_setup { "return " } else { "" };
                    w.line(2, format!("{ret}try await {receiver}(\"{key}\", args: {args})"));
                }
            }
        }
    }
}

/// Bridged action method and whether its result needs `Array(...)`
///
/// Defaults to `action<Type>`, or `action<Element>s` with a cast for arrays.
fn skip_method(function: &CustomFunction, return_type: &str) -> (String, bool) {
    if let Some(method) = &function.skip_method {
        return (method.clone(), function.skip_array_cast);
    }
    let bare: String = return_type.chars().filter(|c| c.is_alphanumeric()).collect();
    if return_type.starts_with('[') {
        (format!("action{bare}s"), true)
    } else {
        (format!("action{bare}"), function.skip_array_cast)
    }
}

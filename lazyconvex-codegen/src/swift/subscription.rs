//! Live subscriptions for the reduced client

use crate::overlay::Subscription;

use super::naming::api_name;
use super::{ModuleContext, SwiftWriter};

/// Render one `subscribe*` method
///
/// Paginated subscriptions build their arguments through the module's
/// `listArgs`; the rest send their arguments directly.
pub fn emit(ctx: &ModuleContext<'_>, sub: &Subscription) -> SwiftWriter {
    let mut params = Vec::new();
    if let Some(where_type) = &sub.where_type {
        params.push(format!("where filterWhere: {where_type}? = nil"));
    }
    params.extend(sub.args.iter().map(|a| format!("{}: {}", a.name, a.swift_type)));
    let marker = if sub.nullable { "?" } else { "" };
    params.push(format!(
        "onUpdate: @escaping @Sendable @MainActor ({}{marker}) -> Void",
        sub.swift_type
    ));
    params.push("onError: @escaping @Sendable @MainActor (Error) -> Void = { _ in _ = () }".into());
    if sub.on_null {
        params.push("onNull: @escaping @Sendable @MainActor () -> Void = { () }".into());
    }

    let mut w = SwiftWriter::new();
    w.line(1, "@preconcurrency");
    w.multiline_signature(&sub.method_name, &params, "-> String {");

    let args = if sub.paginated {
        let mut list_params = Vec::new();
        if sub.args.iter().any(|a| a.name == "orgId") {
            list_params.push("orgId: orgId");
        }
        if sub.where_type.is_some() {
            list_params.push("where: filterWhere");
        }
        w.line(2, format!("let args = listArgs({})", list_params.join(", ")));
        Some("args".to_string())
    } else if sub.args.is_empty() {
        // Array subscriptions without arguments use the bridge's default
        (!sub.array).then(|| "[:]".to_string())
    } else {
        let entries: Vec<String> = sub
            .args
            .iter()
            .map(|a| format!("\"{0}\": {0}", a.name))
            .collect();
        Some(format!("[{}]", entries.join(", ")))
    };
    let args = args.map(|a| format!(", args: {a}")).unwrap_or_default();

    let function = format!("{}.{}", api_name(&ctx.module.name), sub.function);
    let update = if sub.array {
        "{ r in onUpdate(Array(r)) }"
    } else {
        "{ r in onUpdate(r) }"
    };
    let on_null = if sub.on_null { ", onNull: { onNull() }" } else { "" };

    w.line(2, "#if !SKIP");
    w.line(
        2,
        format!(
            "return ConvexService.shared.subscribe(to: {function}{args}, type: {}.self, onUpdate: onUpdate, onError: onError)",
            sub.swift_type
        ),
    );
    w.line(2, "#else");
    w.line(
        2,
        format!(
            "return ConvexService.shared.{}(to: {function}{args}, onUpdate: {update}, onError: {{ e in onError(e) }}{on_null})",
            sub.skip_method
        ),
    );
    w.line(2, "#endif");
    w.line(1, "}");
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ModuleDescriptor;
    use crate::overlay::SubscriptionArg;
    use crate::registry::TypeRegistry;

    fn render(sub: &Subscription) -> String {
        let module = ModuleDescriptor {
            name: "blog".into(),
            exports: vec!["list".into(), "read".into()],
            table: "blog".into(),
            kind: None,
            factory_calls: Vec::new(),
        };
        let registry = TypeRegistry::new();
        let ctx = ModuleContext {
            module: &module,
            table: None,
            where_record: None,
            registry: &registry,
        };
        emit(&ctx, sub).finish()
    }

    fn subscription(method: &str, function: &str, swift_type: &str, skip: &str) -> Subscription {
        Subscription {
            method_name: method.into(),
            function: function.into(),
            swift_type: swift_type.into(),
            paginated: false,
            array: false,
            nullable: false,
            on_null: false,
            skip_method: skip.into(),
            where_type: None,
            args: Vec::new(),
        }
    }

    #[test]
    fn test_paginated_subscription_uses_list_args() {
        let sub = Subscription {
            paginated: true,
            where_type: Some("BlogWhere".into()),
            ..subscription("subscribeList", "list", "PaginatedResult<Blog>", "subscribePaginatedBlogs")
        };
        let out = render(&sub);
        assert!(out.starts_with(
            "    @preconcurrency\n    public static func subscribeList(\n        where filterWhere: BlogWhere? = nil,\n"
        ));
        assert!(out.contains("        onError: @escaping @Sendable @MainActor (Error) -> Void = { _ in _ = () }\n    ) -> String {\n"));
        assert!(out.contains("let args = listArgs(where: filterWhere)"));
        assert!(out.contains(
            "return ConvexService.shared.subscribe(to: BlogAPI.list, args: args, type: PaginatedResult<Blog>.self, onUpdate: onUpdate, onError: onError)"
        ));
        assert!(out.contains(
            "return ConvexService.shared.subscribePaginatedBlogs(to: BlogAPI.list, args: args, onUpdate: { r in onUpdate(r) }, onError: { e in onError(e) })"
        ));
    }

    #[test]
    fn test_direct_args_with_null_callback() {
        let sub = Subscription {
            nullable: true,
            on_null: true,
            args: vec![SubscriptionArg {
                name: "id".into(),
                swift_type: "String".into(),
            }],
            ..subscription("subscribeRead", "read", "Blog", "subscribeBlog")
        };
        let out = render(&sub);
        assert!(out.contains("        onUpdate: @escaping @Sendable @MainActor (Blog?) -> Void,\n"));
        assert!(out.contains("        onNull: @escaping @Sendable @MainActor () -> Void = { () }\n"));
        assert!(out.contains("subscribe(to: BlogAPI.read, args: [\"id\": id], type: Blog.self"));
        assert!(out.contains(", onError: { e in onError(e) }, onNull: { onNull() })"));
    }

    #[test]
    fn test_array_subscription_without_args() {
        let sub = Subscription {
            array: true,
            ..subscription("subscribeAll", "list", "[Blog]", "subscribeBlogs")
        };
        let out = render(&sub);
        assert!(out.contains("subscribe(to: BlogAPI.list, type: [Blog].self"));
        assert!(out.contains("subscribeBlogs(to: BlogAPI.list, onUpdate: { r in onUpdate(Array(r)) }"));
    }
}

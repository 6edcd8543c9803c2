//! Built-in custom-function descriptors
//!
//! Shipped descriptors cover the organization module, per-table editor ACL
//! endpoints, file uploads and child-table helpers. Which set applies is
//! decided by what a module exports and which table it serves, never by the
//! module's name.

use super::{CallKind, CustomArg, CustomFunction, STRUCT_PLACEHOLDER, StructArray};
use crate::harvest::Model;
use crate::ir::{ModuleDescriptor, TableDescriptor, TableKind};
use crate::swift::naming::swift_type;

/// Every built-in descriptor applying to `module`
pub fn builtin(module: &ModuleDescriptor, model: &Model) -> Vec<CustomFunction> {
    let mut functions = Vec::new();

    if is_org_module(module) {
        functions.extend(org_functions());
    } else if has_acl(module) {
        functions.extend(acl_functions(&module.table));
    }

    if module.kind.is_none() && module.exports("upload") {
        functions.push(
            CustomFunction::plain("upload", CallKind::Mutation, Vec::new()).returning("String"),
        );
    }

    if let Some(table) = model.table(&module.table).filter(|t| t.kind == TableKind::Child) {
        functions.extend(child_functions(table));
    }

    functions
}

fn is_org_module(module: &ModuleDescriptor) -> bool {
    ["myOrgs", "membership", "members"]
        .iter()
        .all(|name| module.exports(name))
}

fn has_acl(module: &ModuleDescriptor) -> bool {
    ["addEditor", "removeEditor", "setEditors", "editors"]
        .iter()
        .all(|name| module.exports(name))
}

fn req(name: &str, ty: &str) -> CustomArg {
    CustomArg::required(name, ty)
}

fn opt(name: &str, ty: &str) -> CustomArg {
    CustomArg::optional(name, ty)
}

fn query(name: &str, args: Vec<CustomArg>, returns: &str) -> CustomFunction {
    CustomFunction::plain(name, CallKind::Query, args).returning(returns)
}

fn mutation(name: &str, args: Vec<CustomArg>) -> CustomFunction {
    CustomFunction::plain(name, CallKind::Mutation, args)
}

fn nested(name: &str, outer: &[&str], args: Vec<CustomArg>) -> CustomFunction {
    CustomFunction {
        nested_data: true,
        nested_data_outer: outer.iter().map(|s| s.to_string()).collect(),
        ..mutation(name, args)
    }
}

/// Organization lifecycle: profile, membership, invites and join requests
fn org_functions() -> Vec<CustomFunction> {
    let org_id = || req("orgId", "String");
    vec![
        nested(
            "create",
            &[],
            vec![req("name", "String"), req("slug", "String"), opt("avatarId", "String")],
        ),
        nested(
            "update",
            &["orgId"],
            vec![opt("name", "String"), opt("slug", "String"), opt("avatarId", "String")],
        ),
        query("get", vec![org_id()], "Org"),
        query("getBySlug", vec![req("slug", "String")], "Org?"),
        query("getPublic", vec![req("slug", "String")], "Org?"),
        query("myOrgs", Vec::new(), "[OrgWithRole]"),
        mutation("remove", vec![org_id()]),
        query("isSlugAvailable", vec![req("slug", "String")], "SlugAvailability"),
        mutation("getOrCreate", Vec::new()).returning("OrgGetOrCreateResult"),
        query("membership", vec![org_id()], "OrgMembership"),
        query("members", vec![org_id()], "[OrgMemberEntry]"),
        mutation("setAdmin", vec![req("isAdmin", "Bool"), req("memberId", "String")]),
        mutation("removeMember", vec![req("memberId", "String")]),
        mutation("leave", vec![org_id()]),
        mutation(
            "transferOwnership",
            vec![req("newOwnerId", "String"), org_id()],
        ),
        mutation(
            "invite",
            vec![req("email", "String"), req("isAdmin", "Bool"), org_id()],
        ),
        mutation("acceptInvite", vec![req("token", "String")]),
        mutation("revokeInvite", vec![req("inviteId", "String")]),
        query("pendingInvites", vec![org_id()], "[OrgInvite]"),
        mutation("requestJoin", vec![org_id(), opt("message", "String")]),
        mutation(
            "approveJoinRequest",
            vec![req("requestId", "String"), opt("isAdmin", "Bool")],
        ),
        mutation("rejectJoinRequest", vec![req("requestId", "String")]),
        mutation("cancelJoinRequest", vec![req("requestId", "String")]),
        query("pendingJoinRequests", vec![org_id()], "[JoinRequestEntry]"),
        query("myJoinRequest", vec![org_id()], "OrgJoinRequest?"),
    ]
}

/// Editor ACL endpoints of an org-scoped table
fn acl_functions(table: &str) -> Vec<CustomFunction> {
    let table_id = format!("{table}Id");
    vec![
        mutation(
            "addEditor",
            vec![req("orgId", "String"), req("editorId", "String"), req(&table_id, "String")],
        ),
        query(
            "editors",
            vec![req("orgId", "String"), req(&table_id, "String")],
            "[EditorEntry]",
        ),
        mutation(
            "removeEditor",
            vec![req("orgId", "String"), req("editorId", "String"), req(&table_id, "String")],
        ),
        mutation(
            "setEditors",
            vec![req("orgId", "String"), req("editorIds", "[String]"), req(&table_id, "String")],
        ),
    ]
}

/// Per-parent `list`, and `create` serializing a record-array field
fn child_functions(table: &TableDescriptor) -> Vec<CustomFunction> {
    let mut functions = Vec::new();

    if let Some(foreign_key) = &table.foreign_key {
        functions.push(query(
            "list",
            vec![req(foreign_key, "String")],
            &format!("[{STRUCT_PLACEHOLDER}]"),
        ));
    }

    let arg_safe = table.user_fields.iter().all(|(_, entry)| entry.ty.is_arg_safe());
    let array_field = table
        .user_fields
        .iter()
        .find_map(|(name, entry)| entry.ty.record_element().map(|record| (name, record)));

    if let (false, Some((array_arg, record))) = (arg_safe, array_field) {
        let args = table
            .user_fields
            .iter()
            .map(|(name, entry)| {
                let mut arg = CustomArg {
                    is_optional: entry.optional,
                    ..CustomArg::required(name, &swift_type(&entry.ty))
                };
                if entry.ty.enum_name().is_some() {
                    arg.wire_expr = Some(format!("{name}.rawValue"));
                }
                arg
            })
            .collect();
        functions.push(CustomFunction {
            struct_array: Some(StructArray {
                arg: array_arg.clone(),
                record: record.to_string(),
                fields: None,
            }),
            ..mutation("create", args)
        });
    }

    functions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::harvest;
    use crate::schema::SchemaModule;

    fn module(name: &str, table: &str, kind: Option<TableKind>, exports: &[&str]) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.into(),
            exports: exports.iter().map(|s| s.to_string()).collect(),
            table: table.into(),
            kind,
            factory_calls: Vec::new(),
        }
    }

    fn names(functions: &[CustomFunction]) -> Vec<&str> {
        functions.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_org_catalog_requires_membership_exports() {
        let model = Model::default();
        let org = module("org", "org", None, &["myOrgs", "membership", "members"]);
        let functions = builtin(&org, &model);
        assert_eq!(functions.len(), 25);

        let update = functions.iter().find(|f| f.name == "update").unwrap();
        assert!(update.nested_data);
        assert_eq!(update.nested_data_outer, vec!["orgId"]);
        assert!(update.args.iter().all(|a| a.is_optional));

        let partial = module("org", "org", None, &["myOrgs", "members"]);
        assert!(builtin(&partial, &model).is_empty());
    }

    #[test]
    fn test_acl_catalog_uses_table_id() {
        let model = Model::default();
        let wiki = module(
            "wiki",
            "wiki",
            Some(TableKind::OrgScoped),
            &["addEditor", "removeEditor", "setEditors", "editors"],
        );
        let functions = builtin(&wiki, &model);
        assert_eq!(names(&functions), vec!["addEditor", "editors", "removeEditor", "setEditors"]);
        assert_eq!(functions[0].args[2].name, "wikiId");
        assert_eq!(functions[1].return_type.as_deref(), Some("[EditorEntry]"));
    }

    #[test]
    fn test_upload_only_without_factory_kind() {
        let model = Model::default();
        let file = module("file", "file", None, &["upload"]);
        assert_eq!(names(&builtin(&file, &model)), vec!["upload"]);

        let blog = module("blog", "blog", Some(TableKind::Owned), &["upload"]);
        assert!(builtin(&blog, &model).is_empty());
    }

    #[test]
    fn test_child_list_and_struct_array_create() {
        let schema = SchemaModule::parse(
            r#"{"children": {"message": {"foreignKey": "chatId", "schema": {"type": "object", "shape": {
                "chatId": {"type": "string"},
                "parts": {"type": "array", "element": {"type": "union", "options": [
                    {"type": "object", "shape": {"type": {"type": "enum", "values": ["text"]}, "text": {"type": "string"}}}
                ]}},
                "role": {"type": "enum", "values": ["user", "assistant"]}
            }}}}}"#,
        )
        .unwrap();
        let model = harvest(&schema).unwrap();
        let message = module("message", "message", Some(TableKind::Child), &["list", "create"]);
        let functions = builtin(&message, &model);
        assert_eq!(names(&functions), vec!["list", "create"]);

        let list = &functions[0];
        assert_eq!(list.kind, CallKind::Query);
        assert_eq!(list.args[0].name, "chatId");
        assert_eq!(list.resolved_return("Message").as_deref(), Some("[Message]"));

        let create = &functions[1];
        let array = create.struct_array.as_ref().unwrap();
        assert_eq!(array.arg, "parts");
        assert_eq!(array.record, "MessagePart");
        assert_eq!(create.args[1].swift_type, "[MessagePart]");
        assert_eq!(create.args[2].wire_expr(), "role.rawValue");
    }

    #[test]
    fn test_struct_array_create_keeps_record_optionality() {
        let schema = SchemaModule::parse(
            r#"{"children": {"item": {"foreignKey": "listId", "schema": {"type": "object", "shape": {
                "listId": {"type": "string"},
                "lines": {"type": "array", "element": {"type": "object", "shape": {
                    "note": {"type": "optional", "innerType": {"type": "string"}},
                    "name": {"type": "string"},
                    "qty": {"type": "number"}
                }}}
            }}}}}"#,
        )
        .unwrap();
        let model = harvest(&schema).unwrap();
        let item = module("item", "item", Some(TableKind::Child), &["create"]);
        let functions = builtin(&item, &model);
        let create = functions.iter().find(|f| f.name == "create").unwrap();
        let array = create.struct_array.as_ref().unwrap();
        assert_eq!(array.record, "ItemLine");

        let fields = array.resolved_fields(&model.registry);
        let shape: Vec<(&str, bool)> = fields.iter().map(|f| (f.name.as_str(), f.optional)).collect();
        assert_eq!(shape, vec![("note", true), ("name", false), ("qty", false)]);
    }
}

//! Custom-function overlay
//!
//! Non-CRUD endpoints are described as data: an argument list plus an
//! emission strategy. Descriptors come from the built-in [`catalog`] and from
//! an optional JSON config file; config entries only fill gaps the catalog
//! leaves.

pub mod catalog;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::GeneratorError;
use crate::harvest::Model;
use crate::ir::{FieldType, ModuleDescriptor};
use crate::registry::TypeRegistry;

/// Placeholder in a return type replaced by the module's record name
pub const STRUCT_PLACEHOLDER: &str = "$STRUCT";

/// Backend call kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Query,
    Mutation,
    Action,
}

impl CallKind {
    /// Client method used by the full target
    pub fn client_method(self) -> &'static str {
        match self {
            CallKind::Query => "query",
            CallKind::Mutation => "mutation",
            CallKind::Action => "action",
        }
    }
}

/// One argument of a custom function
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomArg {
    /// Swift parameter name
    pub name: String,

    /// Swift type, without the optional marker
    pub swift_type: String,

    #[serde(default)]
    pub is_optional: bool,

    /// Key in the args dictionary, when it differs from `name`
    #[serde(default)]
    pub wire_name: Option<String>,

    /// Expression sent on the wire, when it differs from `name`
    #[serde(default)]
    pub wire_expr: Option<String>,
}

impl CustomArg {
    /// A required argument
    pub fn required(name: &str, swift_type: &str) -> Self {
        Self {
            name: name.to_string(),
            swift_type: swift_type.to_string(),
            is_optional: false,
            wire_name: None,
            wire_expr: None,
        }
    }

    /// An optional argument defaulting to `nil`
    pub fn optional(name: &str, swift_type: &str) -> Self {
        Self {
            is_optional: true,
            ..Self::required(name, swift_type)
        }
    }

    pub fn wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    pub fn wire_expr(&self) -> &str {
        self.wire_expr.as_deref().unwrap_or(&self.name)
    }
}

/// Field re-encoded from each element of a struct-array argument
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructArrayField {
    pub name: String,

    /// Sent as `.rawValue`
    #[serde(default)]
    pub enum_field: bool,

    /// Sent only when the element has a value
    #[serde(default)]
    pub optional: bool,
}

/// Array-of-record serialization for one argument
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructArray {
    /// Argument holding the array
    pub arg: String,

    /// Element record name
    pub record: String,

    /// Element fields; defaults to the record shape
    #[serde(default)]
    pub fields: Option<Vec<StructArrayField>>,
}

impl StructArray {
    /// Element fields, falling back to the registered record shape
    ///
    /// The registered shape lists the union discriminant first. Optionality
    /// follows the record's own fields.
    pub fn resolved_fields(&self, registry: &TypeRegistry) -> Vec<StructArrayField> {
        if let Some(fields) = &self.fields {
            return fields.clone();
        }
        registry
            .record(&self.record)
            .map(|record| {
                record
                    .fields
                    .iter()
                    .map(|(name, entry)| StructArrayField {
                        name: name.clone(),
                        enum_field: matches!(entry.ty, FieldType::EnumRef(_)),
                        optional: entry.optional,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A non-CRUD endpoint descriptor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFunction {
    /// Exported function name
    #[serde(rename = "fn")]
    pub name: String,

    pub kind: CallKind,

    #[serde(default)]
    pub args: Vec<CustomArg>,

    /// Swift return type; may contain [`STRUCT_PLACEHOLDER`]
    #[serde(default)]
    pub return_type: Option<String>,

    /// Send `args` inside a nested `data` dictionary
    #[serde(default)]
    pub nested_data: bool,

    /// String arguments kept beside `data` when `nested_data` is set
    #[serde(default)]
    pub nested_data_outer: Vec<String>,

    #[serde(default)]
    pub struct_array: Option<StructArray>,

    /// Decode and drop the action result as this type
    #[serde(default)]
    pub dummy_action_type: Option<String>,

    /// Bridged method for reduced-target actions
    #[serde(default)]
    pub skip_method: Option<String>,

    /// Wrap the bridged result in `Array(...)`
    #[serde(default)]
    pub skip_array_cast: bool,
}

impl CustomFunction {
    /// A descriptor with the plain argument-dictionary strategy
    pub fn plain(name: &str, kind: CallKind, args: Vec<CustomArg>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            args,
            return_type: None,
            nested_data: false,
            nested_data_outer: Vec::new(),
            struct_array: None,
            dummy_action_type: None,
            skip_method: None,
            skip_array_cast: false,
        }
    }

    /// Set the return type
    pub fn returning(mut self, return_type: &str) -> Self {
        self.return_type = Some(return_type.to_string());
        self
    }

    /// Return type with the placeholder replaced by `struct_name`
    pub fn resolved_return(&self, struct_name: &str) -> Option<String> {
        self.return_type
            .as_ref()
            .map(|ty| ty.replace(STRUCT_PLACEHOLDER, struct_name))
    }
}

/// Argument of a subscription method
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionArg {
    pub name: String,
    pub swift_type: String,
}

/// A reduced-target live subscription
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Generated method name, e.g. `subscribeList`
    pub method_name: String,

    /// API constant subscribed to
    #[serde(rename = "fn")]
    pub function: String,

    /// Decoded update type
    pub swift_type: String,

    /// Arguments built by the module's `listArgs`
    #[serde(default)]
    pub paginated: bool,

    /// Bridged result needs `Array(...)`
    #[serde(default)]
    pub array: bool,

    #[serde(default)]
    pub nullable: bool,

    /// Add an `onNull` callback
    #[serde(default)]
    pub on_null: bool,

    /// Bridged subscribe method
    pub skip_method: String,

    /// Filter record accepted as `where filterWhere:`
    #[serde(default)]
    pub where_type: Option<String>,

    #[serde(default)]
    pub args: Vec<SubscriptionArg>,
}

/// Parsed `--custom` config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    #[serde(default)]
    pub version: Option<u32>,

    /// Module name to extra function descriptors
    #[serde(default)]
    pub functions: BTreeMap<String, Vec<CustomFunction>>,

    /// Module name to subscriptions
    #[serde(default)]
    pub subscriptions: BTreeMap<String, Vec<Subscription>>,
}

impl CustomConfig {
    /// Parse a config document
    pub fn parse(path: &Path, text: &str) -> Result<Self, GeneratorError> {
        serde_json::from_str(text).map_err(|e| GeneratorError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and parse the config at `path`
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let text = fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;
        let config = Self::parse(path, &text)?;
        debug!(
            path = %path.display(),
            modules = config.functions.len(),
            subscriptions = config.subscriptions.len(),
            "loaded custom config"
        );
        Ok(config)
    }

    /// Subscriptions configured for `module`
    pub fn subscriptions_for(&self, module: &str) -> &[Subscription] {
        self.subscriptions.get(module).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Custom functions for `module`, sorted by name and limited to its exports
///
/// Built-in descriptors win over config entries of the same name, except
/// that two nested-payload descriptors merge their argument lists.
pub fn functions_for(
    module: &ModuleDescriptor,
    model: &Model,
    config: &CustomConfig,
) -> Vec<CustomFunction> {
    let mut merged: BTreeMap<String, CustomFunction> = catalog::builtin(module, model)
        .into_iter()
        .map(|f| (f.name.clone(), f))
        .collect();

    for extra in config.functions.get(&module.name).into_iter().flatten() {
        match merged.get_mut(&extra.name) {
            Some(existing) if existing.nested_data && extra.nested_data => {
                for arg in &extra.args {
                    if !existing.args.iter().any(|a| a.name == arg.name) {
                        existing.args.push(arg.clone());
                    }
                }
            }
            Some(_) => {}
            None => {
                merged.insert(extra.name.clone(), extra.clone());
            }
        }
    }

    merged
        .into_values()
        .filter(|f| module.exports(&f.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::harvest;
    use crate::schema::SchemaModule;

    fn module(name: &str, exports: &[&str]) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.into(),
            exports: exports.iter().map(|s| s.to_string()).collect(),
            table: name.into(),
            kind: None,
            factory_calls: Vec::new(),
        }
    }

    #[test]
    fn test_parse_config() {
        let config = CustomConfig::parse(
            Path::new("custom.json"),
            r#"{
                "version": 1,
                "functions": {"movie": [
                    {"fn": "load", "kind": "action", "returnType": "Movie", "args": [
                        {"name": "tmdbId", "swiftType": "Int", "isOptional": false, "wireName": "tmdb_id", "wireExpr": "Double(tmdbId)"}
                    ], "skipMethod": "actionMovie"}
                ]},
                "subscriptions": {"blog": [
                    {"methodName": "subscribeList", "fn": "list", "swiftType": "PaginatedResult<Blog>",
                     "paginated": true, "skipMethod": "subscribePaginatedBlogs", "whereType": "BlogWhere"}
                ]}
            }"#,
        )
        .unwrap();

        assert_eq!(config.version, Some(1));
        let load = &config.functions["movie"][0];
        assert_eq!(load.kind, CallKind::Action);
        assert_eq!(load.args[0].wire_name(), "tmdb_id");
        assert_eq!(load.args[0].wire_expr(), "Double(tmdbId)");
        assert_eq!(load.skip_method.as_deref(), Some("actionMovie"));

        let subs = config.subscriptions_for("blog");
        assert_eq!(subs.len(), 1);
        assert!(subs[0].paginated);
        assert!(subs[0].args.is_empty());
        assert!(config.subscriptions_for("chat").is_empty());
    }

    #[test]
    fn test_parse_config_error_names_file() {
        let err = CustomConfig::parse(Path::new("bad.json"), "{\"functions\": 3}").unwrap_err();
        match err {
            GeneratorError::ConfigParse { path, .. } => assert_eq!(path, Path::new("bad.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_fills_gaps_sorted_and_filtered() {
        let model = Model::default();
        let config = CustomConfig::parse(
            Path::new("c.json"),
            r#"{"functions": {"movie": [
                {"fn": "search", "kind": "action", "returnType": "[SearchResult]", "args": [{"name": "query", "swiftType": "String"}]},
                {"fn": "load", "kind": "action", "args": []},
                {"fn": "hidden", "kind": "query", "args": []}
            ]}}"#,
        )
        .unwrap();

        let fns = functions_for(&module("movie", &["search", "load"]), &model, &config);
        let names: Vec<&str> = fns.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["load", "search"]);
    }

    #[test]
    fn test_builtin_wins_but_nested_args_merge() {
        let model = Model::default();
        let exports = ["myOrgs", "membership", "members", "create", "get"];
        let config = CustomConfig::parse(
            Path::new("c.json"),
            r#"{"functions": {"org": [
                {"fn": "create", "kind": "mutation", "nestedData": true, "args": [
                    {"name": "name", "swiftType": "String"},
                    {"name": "color", "swiftType": "String", "isOptional": true}
                ]},
                {"fn": "get", "kind": "query", "returnType": "Wrong", "args": []}
            ]}}"#,
        )
        .unwrap();

        let fns = functions_for(&module("org", &exports), &model, &config);
        let create = fns.iter().find(|f| f.name == "create").unwrap();
        let args: Vec<&str> = create.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(args, vec!["name", "slug", "avatarId", "color"]);

        let get = fns.iter().find(|f| f.name == "get").unwrap();
        assert_eq!(get.return_type.as_deref(), Some("Org"));
    }

    #[test]
    fn test_struct_array_fields_default_to_record_shape() {
        let schema = SchemaModule::parse(
            r#"{"children": {"message": {"foreignKey": "chatId", "schema": {"type": "object", "shape": {
                "chatId": {"type": "string"},
                "parts": {"type": "array", "element": {"type": "union", "options": [
                    {"type": "object", "shape": {"type": {"type": "literal", "values": ["text"]}, "text": {"type": "string"}}},
                    {"type": "object", "shape": {"type": {"type": "literal", "values": ["image"]}, "image": {"type": "string"}}}
                ]}}
            }}}}}"#,
        )
        .unwrap();
        let model = harvest(&schema).unwrap();

        let array = StructArray {
            arg: "parts".into(),
            record: "MessagePart".into(),
            fields: None,
        };
        let fields = array.resolved_fields(&model.registry);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["type", "text", "image"]);
        assert!(fields[0].enum_field);
        assert!(!fields[0].optional);
        assert!(!fields[1].enum_field);
        assert!(fields[1].optional && fields[2].optional);
    }

    #[test]
    fn test_resolved_return_replaces_placeholder() {
        let f = CustomFunction::plain("byProject", CallKind::Query, Vec::new()).returning("[$STRUCT]");
        assert_eq!(f.resolved_return("TaskItem").as_deref(), Some("[TaskItem]"));
    }
}

//! Swift naming helpers
//!
//! Converts table, module and enum-value names into valid Swift identifiers
//! and maps resolved field types onto Swift type syntax.

use heck::ToLowerCamelCase;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{FieldEntry, FieldType, Scalar};
use crate::resolve::capitalize;

static SWIFT_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("swift identifier regex should be valid"));

/// Swift keywords that need backticks when used as a case name
const SWIFT_KEYWORDS: &[&str] = &[
    "as", "associatedtype", "break", "case", "catch", "class", "continue", "default", "defer",
    "deinit", "do", "else", "enum", "extension", "fallthrough", "false", "fileprivate", "for",
    "func", "guard", "if", "import", "in", "init", "inout", "internal", "is", "let", "nil",
    "open", "operator", "private", "protocol", "public", "repeat", "rethrows", "return", "self",
    "static", "struct", "subscript", "super", "switch", "throw", "throws", "true", "try",
    "typealias", "var", "where", "while",
];

/// Type names that clash with Swift or Foundation types
const RENAMED_TYPES: &[(&str, &str)] = &[("Task", "TaskItem")];

/// `org_member` and `org-member` become `OrgMember`; `blogProfile` becomes `BlogProfile`
pub fn pascal_case(s: &str) -> String {
    s.split(['_', '-']).map(capitalize).collect()
}

/// Swift record name for a table
pub fn struct_name(table: &str) -> String {
    let name = pascal_case(table);
    RENAMED_TYPES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| to.to_string())
        .unwrap_or(name)
}

/// `public enum` name holding a module's API constants
pub fn api_name(module: &str) -> String {
    format!("{}API", pascal_case(module))
}

/// Filter record name for a table
pub fn where_name(table: &str) -> String {
    format!("{}Where", pascal_case(table))
}

/// One `case` line body for an enum raw value
pub fn enum_case(value: &str) -> String {
    if SWIFT_KEYWORDS.contains(&value) {
        return format!("case `{value}`");
    }
    if SWIFT_IDENT.is_match(value) {
        return format!("case {value}");
    }
    let mut ident = value.to_lower_camel_case();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    format!("case {ident} = \"{value}\"")
}

/// Swift spelling of a field type, without an optional marker
pub fn swift_type(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar(Scalar::String) => "String".to_string(),
        FieldType::Scalar(Scalar::Number) => "Double".to_string(),
        FieldType::Scalar(Scalar::Bool) => "Bool".to_string(),
        FieldType::EnumRef(name) | FieldType::RecordRef(name) | FieldType::UnionRef(name) => {
            name.clone()
        }
        FieldType::ArrayOf(element, optional) => {
            let marker = if *optional { "?" } else { "" };
            format!("[{}{marker}]", swift_type(element))
        }
    }
}

/// Swift spelling of a field entry, with `?` when optional
pub fn entry_type(entry: &FieldEntry) -> String {
    let ty = swift_type(&entry.ty);
    if entry.optional { format!("{ty}?") } else { ty }
}

/// Four-space indentation
pub fn indent(level: usize) -> String {
    "    ".repeat(level)
}

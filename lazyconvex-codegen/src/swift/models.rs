//! Type declarations
//!
//! Records, enums, table structs, the fixed shared records every client
//! needs, and filter (`Where`) structs.

use std::collections::HashSet;

use crate::ir::{FieldType, TableDescriptor, WhereDescriptor};
use crate::registry::{EnumDef, RecordDef, TypeRegistry};

use super::naming::{entry_type, enum_case, struct_name, swift_type, where_name};
use super::{SwiftWriter, Target};

const GENERATED_BANNER: &str = "// Auto-generated by lazyconvex-codegen-swift. DO NOT EDIT.";

/// File header; the full file also disables type-order linting
pub fn emit_header(w: &mut SwiftWriter, target: Target) {
    w.line(0, GENERATED_BANNER);
    match target {
        Target::Full => w.line(0, "// swiftlint:disable file_types_order file_length"),
        Target::Reduced => w.line(0, "// swiftlint:disable file_length"),
    }
    w.line(0, "import Foundation");
    w.blank();
}

/// Closing lint directive of the full file
pub fn emit_footer(w: &mut SwiftWriter) {
    w.line(0, "// swiftlint:enable file_types_order file_length");
}

/// Nested and union records, in registration order
pub fn emit_records(w: &mut SwiftWriter, registry: &TypeRegistry, emitted: &mut HashSet<String>) {
    for record in registry.records() {
        emitted.insert(record.name.clone());
        emit_record(w, record);
    }
}

fn emit_record(w: &mut SwiftWriter, record: &RecordDef) {
    w.line(0, format!("public struct {}: Codable, Sendable {{", record.name));
    for (name, entry) in &record.fields {
        w.line(1, format!("public let {name}: {}", entry_type(entry)));
    }

    // Unions get a memberwise init defaulting every optional to nil
    if record.is_union() {
        w.blank();
        w.line(1, "public init(");
        let last = record.fields.len().saturating_sub(1);
        for (i, (name, entry)) in record.fields.iter().enumerate() {
            let default = if entry.optional { " = nil" } else { "" };
            let comma = if i == last { "" } else { "," };
            w.line(2, format!("{name}: {}{default}{comma}", entry_type(entry)));
        }
        w.line(1, ") {");
        for (name, _) in &record.fields {
            w.line(2, format!("self.{name} = {name}"));
        }
        w.line(1, "}");
    }

    w.line(0, "}");
    w.blank();
}

/// Every registered enum, cases sorted by raw value
pub fn emit_enums(w: &mut SwiftWriter, registry: &TypeRegistry, emitted: &mut HashSet<String>) {
    for def in registry.enums() {
        emitted.insert(def.name.clone());
        emit_enum(w, def);
    }
}

fn emit_enum(w: &mut SwiftWriter, def: &EnumDef) {
    w.line(0, format!("public enum {}: String, CaseIterable, Codable, Sendable {{", def.name));
    for value in &def.values {
        w.line(1, enum_case(value));
    }
    w.blank();
    w.line(1, "public var displayName: String { rawValue.capitalized }");
    w.line(0, "}");
    w.blank();
}

/// One struct per table; returns how many were emitted
///
/// A table whose struct name is already taken is skipped.
pub fn emit_tables(
    w: &mut SwiftWriter,
    tables: &[TableDescriptor],
    emitted: &mut HashSet<String>,
) -> usize {
    let mut count = 0;
    for table in tables {
        let name = struct_name(&table.name);
        if !emitted.insert(name.clone()) {
            continue;
        }
        count += 1;

        let id = table.fields.iter().find(|(field, _)| field == "_id");
        let protocols = if id.is_some() {
            "Codable, Identifiable, Sendable"
        } else {
            "Codable, Sendable"
        };
        w.line(0, format!("public struct {name}: {protocols} {{"));
        for (field, entry) in &table.fields {
            w.line(1, format!("public let {field}: {}", entry_type(entry)));
        }
        if let Some((_, entry)) = id {
            w.blank();
            let accessor = if entry.optional { "_id ?? \"\"" } else { "_id" };
            w.line(1, format!("public var id: String {{ {accessor} }}"));
        }
        w.line(0, "}");
        w.blank();
    }
    count
}

/// A shared record every client relies on
struct FixedRecord {
    name: &'static str,
    fields: &'static [(&'static str, &'static str)],
    /// Body of the `Identifiable` accessor
    id: Option<&'static str>,
}

/// A shared enum with optional extra members
struct FixedEnum {
    name: &'static str,
    cases: &'static [&'static str],
    extras: &'static [&'static str],
}

const AUTHOR: FixedRecord = FixedRecord {
    name: "Author",
    fields: &[("name", "String?"), ("email", "String?"), ("imageUrl", "String?")],
    id: None,
};

const ORG_RECORDS: &[FixedRecord] = &[
    FixedRecord {
        name: "Org",
        fields: &[
            ("_id", "String"),
            ("_creationTime", "Double"),
            ("name", "String"),
            ("slug", "String"),
            ("userId", "String"),
            ("updatedAt", "Double"),
        ],
        id: Some("_id"),
    },
    FixedRecord {
        name: "OrgMember",
        fields: &[
            ("_id", "String"),
            ("orgId", "String"),
            ("userId", "String"),
            ("isAdmin", "Bool"),
            ("updatedAt", "Double"),
        ],
        id: Some("_id"),
    },
];

const ORG_ENUMS: &[FixedEnum] = &[
    FixedEnum {
        name: "OrgRole",
        cases: &["admin", "member", "owner"],
        extras: &[
            "public var isOwner: Bool { self == .owner }",
            "public var isAdmin: Bool { self == .owner || self == .admin }",
        ],
    },
    FixedEnum {
        name: "JoinRequestStatus",
        cases: &["approved", "pending", "rejected"],
        extras: &[],
    },
];

const MEMBERSHIP_RECORDS: &[FixedRecord] = &[
    FixedRecord {
        name: "OrgMemberEntry",
        fields: &[
            ("memberId", "String?"),
            ("userId", "String"),
            ("role", "OrgRole"),
            ("name", "String?"),
            ("email", "String?"),
            ("imageUrl", "String?"),
        ],
        id: Some("userId"),
    },
    FixedRecord {
        name: "OrgWithRole",
        fields: &[("org", "Org"), ("role", "OrgRole")],
        id: Some("org._id"),
    },
    FixedRecord {
        name: "OrgMembership",
        fields: &[
            ("_id", "String?"),
            ("orgId", "String?"),
            ("userId", "String?"),
            ("isAdmin", "Bool?"),
            ("role", "OrgRole?"),
        ],
        id: None,
    },
    FixedRecord {
        name: "OrgInvite",
        fields: &[
            ("_id", "String"),
            ("_creationTime", "Double?"),
            ("orgId", "String"),
            ("email", "String"),
            ("expiresAt", "Double"),
            ("token", "String?"),
            ("isAdmin", "Bool?"),
        ],
        id: Some("_id"),
    },
    FixedRecord {
        name: "OrgJoinRequest",
        fields: &[
            ("_id", "String"),
            ("_creationTime", "Double?"),
            ("orgId", "String"),
            ("userId", "String"),
            ("status", "JoinRequestStatus"),
            ("message", "String?"),
        ],
        id: Some("_id"),
    },
    FixedRecord {
        name: "JoinRequestUser",
        fields: &[("name", "String?"), ("image", "String?")],
        id: None,
    },
    FixedRecord {
        name: "JoinRequestEntry",
        fields: &[("request", "OrgJoinRequest"), ("user", "JoinRequestUser?")],
        id: Some("request._id"),
    },
    FixedRecord {
        name: "EditorEntry",
        fields: &[("userId", "String"), ("name", "String?"), ("email", "String?")],
        id: Some("userId"),
    },
    FixedRecord {
        name: "SlugAvailability",
        fields: &[("available", "Bool")],
        id: None,
    },
    FixedRecord {
        name: "OrgGetOrCreateResult",
        fields: &[("created", "Bool"), ("orgId", "String")],
        id: None,
    },
];

/// Pagination envelope; the cross-compiled build cannot decode generics
const PAGINATED_RESULT: &[(usize, &str)] = &[
    (0, "#if !SKIP"),
    (0, "public struct PaginatedResult<T: Codable & Sendable>: Codable, Sendable {"),
    (1, "public let page: [T]"),
    (1, "public let continueCursor: String"),
    (1, "public let isDone: Bool"),
    (0, ""),
    (1, "public init(page: [T], continueCursor: String, isDone: Bool) {"),
    (2, "self.page = page"),
    (2, "self.continueCursor = continueCursor"),
    (2, "self.isDone = isDone"),
    (1, "}"),
    (0, "}"),
    (0, "#else"),
    (0, "public struct PaginatedResult<T: Codable & Sendable>: Sendable {"),
    (1, "public let page: [T]"),
    (1, "public let continueCursor: String"),
    (1, "public let isDone: Bool"),
    (0, ""),
    (1, "public init(page: [T], continueCursor: String, isDone: Bool) {"),
    (2, "self.page = page"),
    (2, "self.continueCursor = continueCursor"),
    (2, "self.isDone = isDone"),
    (1, "}"),
    (0, "}"),
    (0, "#endif"),
    (0, ""),
];

/// Shared records and enums, skipping any name a schema type already took
pub fn emit_fixed(w: &mut SwiftWriter, emitted: &HashSet<String>) {
    let free = |name: &str| !emitted.contains(name);

    if free(AUTHOR.name) {
        emit_fixed_record(w, &AUTHOR);
    }
    if free("PaginatedResult") {
        for (level, text) in PAGINATED_RESULT {
            w.line(*level, text);
        }
    }
    for record in ORG_RECORDS.iter().filter(|r| free(r.name)) {
        emit_fixed_record(w, record);
    }
    w.blank();
    for def in ORG_ENUMS.iter().filter(|e| free(e.name)) {
        w.line(0, format!("public enum {}: String, CaseIterable, Codable, Sendable {{", def.name));
        for case in def.cases {
            w.line(1, format!("case {case}"));
        }
        w.blank();
        w.line(1, "public var displayName: String { rawValue.capitalized }");
        for extra in def.extras {
            w.line(1, extra);
        }
        w.line(0, "}");
        w.blank();
    }
    for record in MEMBERSHIP_RECORDS.iter().filter(|r| free(r.name)) {
        emit_fixed_record(w, record);
    }
}

fn emit_fixed_record(w: &mut SwiftWriter, record: &FixedRecord) {
    let protocols = if record.id.is_some() {
        "Codable, Identifiable, Sendable"
    } else {
        "Codable, Sendable"
    };
    w.line(0, format!("public struct {}: {protocols} {{", record.name));
    for (name, ty) in record.fields {
        w.line(1, format!("public let {name}: {ty}"));
    }
    if let Some(id) = record.id {
        w.blank();
        w.line(1, format!("public var id: String {{ {id} }}"));
    }
    w.line(0, "}");
    w.blank();
}

/// Filter struct with a memberwise init and a wire encoder
pub fn emit_where(w: &mut SwiftWriter, record: &WhereDescriptor) {
    let name = where_name(&record.table);
    let mut params: Vec<(String, String)> = record
        .fields
        .iter()
        .map(|(field, ty)| (field.clone(), swift_type(ty)))
        .collect();
    if record.own {
        params.push(("own".into(), "Bool".into()));
    }
    params.push(("or".into(), "[Self]".into()));

    w.line(0, format!("public struct {name}: Sendable {{"));
    for (field, ty) in &params {
        w.line(1, format!("public var {field}: {ty}?"));
    }
    w.blank();

    w.line(1, "public init(");
    let last = params.len() - 1;
    for (i, (field, ty)) in params.iter().enumerate() {
        let comma = if i == last { "" } else { "," };
        w.line(2, format!("{field}: {ty}? = nil{comma}"));
    }
    w.line(1, ") {");
    for (field, _) in &params {
        w.line(2, format!("self.{field} = {field}"));
    }
    w.line(1, "}");
    w.blank();

    w.line(1, "public func toDict() -> [String: Any] {");
    w.line(2, "var d = [String: Any]()");
    for (field, ty) in &record.fields {
        let value = match ty {
            FieldType::EnumRef(_) => format!("{field}.rawValue"),
            _ => field.clone(),
        };
        w.line(2, format!("if let {field} {{ d[\"{field}\"] = {value} }}"));
    }
    if record.own {
        w.line(2, "if let own { d[\"own\"] = own }");
    }
    w.line(2, "if let or {");
    w.line(3, "var arr = [[String: Any]]()");
    w.line(3, "for w in or { arr.append(w.toDict()) }");
    w.line(3, "d[\"or\"] = arr");
    w.line(2, "}");
    w.line(2, "return d");
    w.line(1, "}");
    w.line(0, "}");
    w.blank();
}

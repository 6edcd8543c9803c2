//! Swift emission
//!
//! Two client files are rendered from the same descriptors. The [`Target`]
//! decides the call-site shape; everything else is shared.
//!
//! - `models`: records, enums, table structs, fixed shared records, filters
//! - `wrapper`: CRUD wrappers and `listArgs`
//! - `custom`: overlay descriptors
//! - `subscription`: reduced-target live subscriptions

pub mod custom;
pub mod models;
pub mod naming;
pub mod subscription;
pub mod wrapper;

use crate::ir::{FieldType, ModuleDescriptor, TableDescriptor, TableKind, WhereDescriptor};
use crate::overlay::CallKind;
use crate::registry::TypeRegistry;

use naming::indent;

/// Which client file is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Desktop client: explicit client parameter, every wrapper
    Full,
    /// Cross-compiled mobile client: shared service, mutations and actions only
    Reduced,
}

impl Target {
    /// Leading client parameter, if the target takes one
    pub fn client_param(self) -> Option<&'static str> {
        match self {
            Target::Full => Some("_ client: ConvexClientProtocol"),
            Target::Reduced => None,
        }
    }

    /// Receiver and method for a backend call
    pub fn call(self, kind: CallKind) -> String {
        match (self, kind) {
            (Target::Full, kind) => format!("client.{}", kind.client_method()),
            (Target::Reduced, CallKind::Mutation) => "ConvexService.shared.mutate".to_string(),
            (Target::Reduced, CallKind::Query) => "ConvexService.shared.query".to_string(),
            (Target::Reduced, CallKind::Action) => "ConvexService.shared.action".to_string(),
        }
    }

    /// Parameter list starting with the client parameter, if any
    pub fn params(self) -> Vec<String> {
        self.client_param().map(str::to_string).into_iter().collect()
    }
}

/// Line buffer for one output file
#[derive(Debug, Clone, Default)]
pub struct SwiftWriter {
    lines: Vec<String>,
}

impl SwiftWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `text` at indentation `level`
    pub fn line(&mut self, level: usize, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{text}", indent(level)));
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Append every line of `other`
    pub fn append(&mut self, other: SwiftWriter) {
        self.lines.extend(other.lines);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Opening line of a function whose parameters go one per line
    ///
    /// `tail` follows the closing parenthesis, e.g. `async throws {`.
    pub fn multiline_signature(&mut self, name: &str, params: &[String], tail: &str) {
        self.line(1, format!("public static func {name}("));
        let last = params.len().saturating_sub(1);
        for (i, param) in params.iter().enumerate() {
            let comma = if i == last { "" } else { "," };
            self.line(2, format!("{param}{comma}"));
        }
        self.line(1, format!(") {tail}"));
    }

    /// Opening line of a function with its parameters inline
    pub fn inline_signature(&mut self, name: &str, params: &[String], tail: &str) {
        self.line(1, format!("public static func {name}({}) {tail}", params.join(", ")));
    }

    /// Joined file text, newline-terminated
    pub fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Everything the wrapper emitters need to know about one module
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    pub module: &'a ModuleDescriptor,

    /// Served table, when the schema declares it
    pub table: Option<&'a TableDescriptor>,

    /// Filter record of the served table
    pub where_record: Option<&'a WhereDescriptor>,

    pub registry: &'a TypeRegistry,
}

impl ModuleContext<'_> {
    /// `module:function` key sent to the backend
    pub fn key(&self, function: &str) -> String {
        format!("{}:{}", self.module.name, function)
    }

    /// Record name of the served table
    pub fn struct_name(&self) -> String {
        naming::struct_name(&self.module.table)
    }

    pub fn kind(&self) -> Option<TableKind> {
        self.table.map(|t| t.kind)
    }

    pub fn is_org_scoped(&self) -> bool {
        self.kind() == Some(TableKind::OrgScoped)
    }
}

/// Expression sending `name` on the wire
///
/// Enums go as their raw value; enum arrays are mapped element-wise.
pub fn wire_value(name: &str, ty: &FieldType) -> String {
    match ty {
        FieldType::EnumRef(_) => format!("{name}.rawValue"),
        FieldType::ArrayOf(element, false) if matches!(**element, FieldType::EnumRef(_)) => {
            format!("{name}.map(\\.rawValue)")
        }
        _ => name.to_string(),
    }
}

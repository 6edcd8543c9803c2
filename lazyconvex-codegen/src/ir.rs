//! Intermediate Representation (IR) for code generation
//!
//! The IR is the language-agnostic model built from the schema document and
//! the backend module sources. Every stage after harvesting and scanning only
//! reads these types; the Swift emitter renders them.

use std::fmt;

/// Category of a schema table
///
/// The kind decides which implicit fields a table record gains and which
/// endpoint families its factory exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// User-owned rows (`crud`)
    Owned,
    /// Rows scoped to an organization (`orgCrud`)
    OrgScoped,
    /// Cached external data (`cacheCrud`)
    Base,
    /// One row per user (`singletonCrud`)
    Singleton,
    /// Rows attached to a parent table (`childCrud`)
    Child,
}

impl TableKind {
    /// Kinds in harvesting order
    pub const ALL: [TableKind; 5] = [
        TableKind::Owned,
        TableKind::OrgScoped,
        TableKind::Base,
        TableKind::Singleton,
        TableKind::Child,
    ];

    /// Name of the schema map holding tables of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Owned => "owned",
            TableKind::OrgScoped => "orgScoped",
            TableKind::Base => "base",
            TableKind::Singleton => "singleton",
            TableKind::Child => "children",
        }
    }

    /// Whether tables of this kind get a filter (`Where`) record
    pub fn is_filterable(self) -> bool {
        matches!(self, TableKind::Owned | TableKind::OrgScoped)
    }

    /// Implicit fields the backend adds to every row of this kind
    pub fn implicit_fields(self) -> Vec<(String, FieldEntry)> {
        use FieldType::{RecordRef, Scalar as S};

        let string = || S(Scalar::String);
        let number = || S(Scalar::Number);
        let fields: Vec<(&str, FieldEntry)> = match self {
            TableKind::Owned => vec![
                ("_id", FieldEntry::required(string())),
                ("_creationTime", FieldEntry::required(number())),
                ("author", FieldEntry::optional(RecordRef("Author".into()))),
                ("updatedAt", FieldEntry::required(number())),
                ("userId", FieldEntry::required(string())),
            ],
            TableKind::OrgScoped => vec![
                ("_id", FieldEntry::required(string())),
                ("_creationTime", FieldEntry::required(number())),
                ("orgId", FieldEntry::required(string())),
                ("updatedAt", FieldEntry::required(number())),
                ("userId", FieldEntry::required(string())),
            ],
            TableKind::Base => vec![
                ("_id", FieldEntry::optional(string())),
                ("_creationTime", FieldEntry::optional(number())),
                ("cacheHit", FieldEntry::optional(S(Scalar::Bool))),
            ],
            TableKind::Singleton => vec![("_id", FieldEntry::optional(string()))],
            TableKind::Child => vec![
                ("_id", FieldEntry::required(string())),
                ("_creationTime", FieldEntry::required(number())),
                ("updatedAt", FieldEntry::optional(number())),
                ("userId", FieldEntry::optional(string())),
            ],
        };
        fields
            .into_iter()
            .map(|(name, entry)| (name.to_string(), entry))
            .collect()
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// `String`
    String,
    /// Any numeric kind, encoded as `Double`
    Number,
    /// `Bool`
    Bool,
}

/// Resolved type of a field
///
/// Optionality lives on [`FieldEntry`], not here, so the same type can be
/// required in one table and optional in another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// String, number or boolean
    Scalar(Scalar),
    /// Synthesized enumeration
    EnumRef(String),
    /// Array; the flag marks optional elements
    ArrayOf(Box<FieldType>, bool),
    /// Synthesized nested record (or a fixed shared record like `Author`)
    RecordRef(String),
    /// Synthesized discriminated-union record
    UnionRef(String),
}

impl FieldType {
    /// Scalars and enums can appear in filter clauses
    pub fn is_filterable(&self) -> bool {
        matches!(self, FieldType::Scalar(_) | FieldType::EnumRef(_))
    }

    /// Whether a wrapper can take this type as a parameter and send it as-is
    ///
    /// Scalars, enums and non-optional arrays of either qualify. Records and
    /// unions need explicit serialization.
    pub fn is_arg_safe(&self) -> bool {
        match self {
            FieldType::Scalar(_) | FieldType::EnumRef(_) => true,
            FieldType::ArrayOf(element, false) => {
                matches!(**element, FieldType::Scalar(_) | FieldType::EnumRef(_))
            }
            _ => false,
        }
    }

    /// Record or union name of an array element, if this is such an array
    pub fn record_element(&self) -> Option<&str> {
        match self {
            FieldType::ArrayOf(element, _) => match &**element {
                FieldType::RecordRef(name) | FieldType::UnionRef(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Enum name when this is an enum reference
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            FieldType::EnumRef(name) => Some(name),
            _ => None,
        }
    }
}

/// A field type plus its optionality
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldEntry {
    /// Underlying type
    pub ty: FieldType,

    /// Field may be absent
    pub optional: bool,
}

impl FieldEntry {
    /// A required field of type `ty`
    pub fn required(ty: FieldType) -> Self {
        Self {
            ty,
            optional: false,
        }
    }

    /// An optional field of type `ty`
    pub fn optional(ty: FieldType) -> Self {
        Self { ty, optional: true }
    }
}

/// Ordered `name -> entry` list
pub type Fields = Vec<(String, FieldEntry)>;

/// Look up a field by name in an ordered field list
pub fn find_field<'a>(fields: &'a Fields, name: &str) -> Option<&'a FieldEntry> {
    fields
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, entry)| entry)
}

/// Insert or replace a field, keeping the position of an existing entry
pub fn upsert_field(fields: &mut Fields, name: &str, entry: FieldEntry) {
    match fields.iter_mut().find(|(field, _)| field == name) {
        Some(slot) => slot.1 = entry,
        None => fields.push((name.to_string(), entry)),
    }
}

/// How many uploads a file-placeholder field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// One upload, exposed as `<field>Url`
    Single,
    /// Array of uploads, exposed as `<field>Urls`
    Multiple,
}

/// A harvested schema table
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// Table name as declared in the schema map
    pub name: String,

    /// Table kind
    pub kind: TableKind,

    /// Record fields: implicit, then declared, then derived URL fields
    pub fields: Fields,

    /// Declared fields only, used for wrapper arguments
    pub user_fields: Fields,

    /// Declared fields backed by the file placeholder
    pub uploads: Vec<(String, UploadKind)>,

    /// Foreign key naming the parent row (child tables only)
    pub foreign_key: Option<String>,
}

impl TableDescriptor {
    /// Whether `field` is a file placeholder
    pub fn is_upload(&self, field: &str) -> bool {
        self.uploads.iter().any(|(name, _)| name == field)
    }
}

/// Factory constructors a backend module may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryKind {
    /// `crud(...)`
    Crud,
    /// `orgCrud(...)`
    OrgCrud,
    /// `childCrud(...)`
    ChildCrud,
    /// `cacheCrud(...)`
    CacheCrud,
    /// `singletonCrud(...)`
    SingletonCrud,
}

impl FactoryKind {
    /// Every factory, in the order the scanner tries them
    pub const ALL: [FactoryKind; 5] = [
        FactoryKind::Crud,
        FactoryKind::OrgCrud,
        FactoryKind::ChildCrud,
        FactoryKind::CacheCrud,
        FactoryKind::SingletonCrud,
    ];

    /// Function name as written in source
    pub fn as_str(self) -> &'static str {
        match self {
            FactoryKind::Crud => "crud",
            FactoryKind::OrgCrud => "orgCrud",
            FactoryKind::ChildCrud => "childCrud",
            FactoryKind::CacheCrud => "cacheCrud",
            FactoryKind::SingletonCrud => "singletonCrud",
        }
    }

    /// Parse a factory function name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Table kind this factory serves
    pub fn table_kind(self) -> TableKind {
        match self {
            FactoryKind::Crud => TableKind::Owned,
            FactoryKind::OrgCrud => TableKind::OrgScoped,
            FactoryKind::ChildCrud => TableKind::Child,
            FactoryKind::CacheCrud => TableKind::Base,
            FactoryKind::SingletonCrud => TableKind::Singleton,
        }
    }
}

impl fmt::Display for FactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option flags detected in a factory call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactoryOptions {
    /// `search` option present
    pub search: bool,
    /// `softDelete` option present
    pub soft_delete: bool,
    /// `acl` option present
    pub acl: bool,
    /// `pub` option present
    pub public: bool,
}

/// A factory call found in a module source
#[derive(Debug, Clone)]
pub struct FactoryCall {
    /// Factory constructor
    pub kind: FactoryKind,

    /// Table name literal
    pub table: String,

    /// File the call was found in
    pub file: String,

    /// Text between the table literal and the closing parenthesis
    pub options_text: String,

    /// Flags detected in `options_text`
    pub options: FactoryOptions,
}

/// A scanned backend function module
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// File stem, used as the `module:function` prefix
    pub name: String,

    /// Exported names in first-seen source order
    pub exports: Vec<String>,

    /// Table this module serves
    pub table: String,

    /// Kind of `table`, if the schema declares it
    pub kind: Option<TableKind>,

    /// Factory calls found in the source
    pub factory_calls: Vec<FactoryCall>,
}

impl ModuleDescriptor {
    /// Whether the module exports `name`
    pub fn exports(&self, name: &str) -> bool {
        self.exports.iter().any(|export| export == name)
    }
}

/// Filter record for one table
#[derive(Debug, Clone)]
pub struct WhereDescriptor {
    /// Table the filter applies to
    pub table: String,

    /// Filterable fields, all optional in the record
    pub fields: Vec<(String, FieldType)>,

    /// Owned tables accept an `own` flag
    pub own: bool,
}

//! Named types synthesized during resolution
//!
//! Enumerations, nested records and discriminated-union records are collected
//! here in registration order. A name may be registered more than once as long
//! as every registration describes the same definition; a differing definition
//! under an existing name is a [`GeneratorError::NameCollision`].

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::GeneratorError;
use crate::ir::Fields;

/// A synthesized enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Type name
    pub name: String,

    /// Raw values, sorted
    pub values: BTreeSet<String>,
}

/// What produced a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// An object validator nested inside a field
    Nested,
    /// A discriminated union merged into one record
    Union {
        /// Name of the discriminant enum, if the options declared values
        discriminant: Option<String>,
    },
}

/// A synthesized record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    /// Type name
    pub name: String,

    /// Nested or union
    pub kind: RecordKind,

    /// Fields in declaration order
    pub fields: Fields,
}

impl RecordDef {
    /// Whether this record came from a union
    pub fn is_union(&self) -> bool {
        matches!(self.kind, RecordKind::Union { .. })
    }
}

/// Registry of every synthesized type name
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    enums: Vec<EnumDef>,
    records: Vec<RecordDef>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum under `name`
    pub fn register_enum<I, S>(&mut self, name: &str, values: I) -> Result<(), GeneratorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if let Some(existing) = self.enums.iter().find(|e| e.name == name) {
            if existing.values == values {
                debug!(name, "enum already registered");
                return Ok(());
            }
            return Err(GeneratorError::NameCollision {
                name: name.to_string(),
                kind: "enum",
            });
        }
        self.enums.push(EnumDef {
            name: name.to_string(),
            values,
        });
        Ok(())
    }

    /// Register a record
    pub fn register_record(&mut self, record: RecordDef) -> Result<(), GeneratorError> {
        if let Some(existing) = self.records.iter().find(|r| r.name == record.name) {
            if *existing == record {
                debug!(name = %record.name, "record already registered");
                return Ok(());
            }
            return Err(GeneratorError::NameCollision {
                name: record.name,
                kind: "record",
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Whether `name` is a registered enum
    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.iter().any(|e| e.name == name)
    }

    /// Look up a record
    pub fn record(&self, name: &str) -> Option<&RecordDef> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Enums in registration order
    pub fn enums(&self) -> &[EnumDef] {
        &self.enums
    }

    /// Records in registration order
    pub fn records(&self) -> &[RecordDef] {
        &self.records
    }
}

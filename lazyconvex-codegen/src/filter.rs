//! Filter (`Where`) record derivation
//!
//! Owned and org-scoped tables get a filter record over their declared scalar
//! and enum fields. Upload placeholders are string-typed but not filterable.

use crate::harvest::Model;
use crate::ir::{TableKind, WhereDescriptor};

/// Derive filter records for every filterable table, in table order
///
/// Tables without a single filterable field get no record.
pub fn derive(model: &Model) -> Vec<WhereDescriptor> {
    model
        .tables
        .iter()
        .filter(|table| table.kind.is_filterable())
        .filter_map(|table| {
            let fields: Vec<_> = table
                .user_fields
                .iter()
                .filter(|(name, entry)| entry.ty.is_filterable() && !table.is_upload(name))
                .map(|(name, entry)| (name.clone(), entry.ty.clone()))
                .collect();
            if fields.is_empty() {
                return None;
            }
            Some(WhereDescriptor {
                table: table.name.clone(),
                fields,
                own: table.kind == TableKind::Owned,
            })
        })
        .collect()
}

/// Find the filter record of `table`
pub fn find<'a>(wheres: &'a [WhereDescriptor], table: &str) -> Option<&'a WhereDescriptor> {
    wheres.iter().find(|w| w.table == table)
}

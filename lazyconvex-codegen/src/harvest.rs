//! Schema harvesting
//!
//! Walks the five table maps, resolves every declared field and builds one
//! [`TableDescriptor`] per table.

use tracing::debug;

use crate::error::GeneratorError;
use crate::ir::{FieldEntry, FieldType, Fields, Scalar, TableDescriptor, TableKind, UploadKind, upsert_field};
use crate::registry::TypeRegistry;
use crate::resolve::{resolve_shape, upload_kind};
use crate::schema::{SchemaModule, Validator};

/// Harvested tables plus every type synthesized while resolving them
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Tables in harvesting order
    pub tables: Vec<TableDescriptor>,

    /// Synthesized enums and records
    pub registry: TypeRegistry,
}

impl Model {
    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Build the table model from a schema document
pub fn harvest(schema: &SchemaModule) -> Result<Model, GeneratorError> {
    let mut model = Model::default();

    let flat = [
        (TableKind::Owned, &schema.owned),
        (TableKind::OrgScoped, &schema.org_scoped),
        (TableKind::Base, &schema.base),
        (TableKind::Singleton, &schema.singleton),
    ];
    for (kind, tables) in flat {
        for (name, validator) in tables.iter() {
            let table = harvest_table(&mut model.registry, name, kind, validator, None)?;
            model.tables.push(table);
        }
    }

    for (name, child) in schema.children.iter() {
        let table = harvest_table(
            &mut model.registry,
            name,
            TableKind::Child,
            &child.schema,
            child.foreign_key.clone(),
        )?;
        model.tables.push(table);
    }

    Ok(model)
}

fn harvest_table(
    registry: &mut TypeRegistry,
    name: &str,
    kind: TableKind,
    validator: &Validator,
    foreign_key: Option<String>,
) -> Result<TableDescriptor, GeneratorError> {
    let shape = validator.object_shape().ok_or_else(|| {
        GeneratorError::SchemaParse(format!(
            "{kind} table '{name}' must be an object validator, found '{}'",
            validator.kind
        ))
    })?;

    let user_fields = resolve_shape(registry, shape, name)?;
    let uploads: Vec<(String, UploadKind)> = shape
        .iter()
        .filter_map(|(field, v)| upload_kind(v).map(|kind| (field.to_string(), kind)))
        .collect();

    let mut fields: Fields = kind.implicit_fields();
    for (field, entry) in &user_fields {
        upsert_field(&mut fields, field, entry.clone());
    }
    for (field, upload) in &uploads {
        let (url_field, ty) = match upload {
            UploadKind::Single => (format!("{field}Url"), FieldType::Scalar(Scalar::String)),
            UploadKind::Multiple => (
                format!("{field}Urls"),
                FieldType::ArrayOf(Box::new(FieldType::Scalar(Scalar::String)), false),
            ),
        };
        upsert_field(&mut fields, &url_field, FieldEntry::optional(ty));
    }

    debug!(
        table = name,
        kind = %kind,
        fields = fields.len(),
        uploads = uploads.len(),
        "harvested table"
    );

    Ok(TableDescriptor {
        name: name.to_string(),
        kind,
        fields,
        user_fields,
        uploads,
        foreign_key,
    })
}

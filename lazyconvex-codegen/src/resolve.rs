//! Validator tree resolution
//!
//! Turns one field validator into a [`FieldEntry`]. Enums, nested objects and
//! unions register a synthesized type in the [`TypeRegistry`] named
//! `Capitalize(model) + Capitalize(field)`.

use crate::error::GeneratorError;
use crate::ir::{FieldEntry, FieldType, Fields, Scalar, UploadKind};
use crate::registry::{RecordDef, RecordKind, TypeRegistry};
use crate::schema::{Node, OrderedMap, Validator};

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name synthesized for a type declared at `model.field`
pub fn synthesized_name(model: &str, field: &str) -> String {
    format!("{}{}", capitalize(model), capitalize(field))
}

/// Resolve the validator of `model.field`
pub fn resolve(
    registry: &mut TypeRegistry,
    validator: &Validator,
    model: &str,
    field: &str,
) -> Result<FieldEntry, GeneratorError> {
    let ty = match validator.node() {
        Node::Optional(inner) => {
            let resolved = resolve(registry, inner, model, field)?;
            return Ok(FieldEntry::optional(resolved.ty));
        }
        Node::String | Node::File => FieldType::Scalar(Scalar::String),
        Node::Number => FieldType::Scalar(Scalar::Number),
        Node::Boolean => FieldType::Scalar(Scalar::Bool),
        Node::Enum => {
            let name = synthesized_name(model, field);
            registry.register_enum(&name, validator.enum_values())?;
            FieldType::EnumRef(name)
        }
        Node::Array(element) => {
            if matches!(element.node(), Node::File) {
                FieldType::ArrayOf(Box::new(FieldType::Scalar(Scalar::String)), false)
            } else {
                let singular = field.strip_suffix('s').unwrap_or(field);
                let inner = resolve(registry, element, model, singular)?;
                FieldType::ArrayOf(Box::new(inner.ty), inner.optional)
            }
        }
        Node::Object(shape) => {
            let name = synthesized_name(model, field);
            // Fields of a nested record are named under its lowercased name
            let fields = resolve_shape(registry, shape, &name.to_lowercase())?;
            registry.register_record(RecordDef {
                name: name.clone(),
                kind: RecordKind::Nested,
                fields,
            })?;
            FieldType::RecordRef(name)
        }
        Node::Union(options) => {
            let name = synthesized_name(model, field);
            resolve_union(registry, options, &name)?;
            FieldType::UnionRef(name)
        }
        Node::Unsupported(kind) => {
            return Err(GeneratorError::UnsupportedValidator {
                kind: kind.to_string(),
                model: model.to_string(),
                field: field.to_string(),
            });
        }
    };
    Ok(FieldEntry::required(ty))
}

/// Resolve every field of an object shape, using `model` for nested names
pub fn resolve_shape(
    registry: &mut TypeRegistry,
    shape: &OrderedMap<Validator>,
    model: &str,
) -> Result<Fields, GeneratorError> {
    let mut fields = Fields::with_capacity(shape.len());
    for (field, validator) in shape.iter() {
        let entry = resolve(registry, validator, model, field)?;
        fields.push((field.to_string(), entry));
    }
    Ok(fields)
}

/// Merge union options into one record named `name`
///
/// The `type` discriminant comes first and stays required. Every other field
/// is optional; the first option declaring a field decides its type.
fn resolve_union(
    registry: &mut TypeRegistry,
    options: &[Validator],
    name: &str,
) -> Result<(), GeneratorError> {
    let mut discriminant_values = Vec::new();
    for option in options {
        let Some(shape) = option.unwrapped().object_shape() else {
            continue;
        };
        if let Some(tag) = shape.get("type") {
            let tag = tag.unwrapped();
            if matches!(tag.kind.as_str(), "enum" | "literal") {
                discriminant_values.extend(tag.enum_values());
            }
        }
    }

    let discriminant = if discriminant_values.is_empty() {
        None
    } else {
        let enum_name = format!("{name}Type");
        registry.register_enum(&enum_name, discriminant_values)?;
        Some(enum_name)
    };

    let tag_type = match &discriminant {
        Some(enum_name) => FieldType::EnumRef(enum_name.clone()),
        None => FieldType::Scalar(Scalar::String),
    };
    let mut fields: Fields = vec![("type".to_string(), FieldEntry::required(tag_type))];

    for option in options {
        let Some(shape) = option.unwrapped().object_shape() else {
            continue;
        };
        for (field, validator) in shape.iter() {
            if field == "type" || fields.iter().any(|(existing, _)| existing == field) {
                continue;
            }
            let resolved = resolve(registry, validator, name, field)?;
            fields.push((field.to_string(), FieldEntry::optional(resolved.ty)));
        }
    }

    registry.register_record(RecordDef {
        name: name.to_string(),
        kind: RecordKind::Union { discriminant },
        fields,
    })
}

/// Upload shape of a field validator, if it is a file placeholder
pub fn upload_kind(validator: &Validator) -> Option<UploadKind> {
    match validator.unwrapped().node() {
        Node::File => Some(UploadKind::Single),
        Node::Array(element) if upload_kind(element) == Some(UploadKind::Single) => {
            Some(UploadKind::Multiple)
        }
        _ => None,
    }
}

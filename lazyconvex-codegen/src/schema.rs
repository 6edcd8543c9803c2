//! Validator-definition input
//!
//! The schema document mirrors the definition tree the validator library
//! exposes at runtime: every node carries a `type` tag plus the children its
//! kind needs. Map and shape keys keep document order, which the generated
//! output depends on.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

use crate::error::GeneratorError;

/// A JSON object read as an ordered list of entries
///
/// A repeated key keeps its first position and takes the last value, like a
/// JavaScript object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<T>(pub Vec<(String, T)>);

impl<T> OrderedMap<T> {
    /// Iterate entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        OrderedMap(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, T)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// One validator node
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// Kind tag (`string`, `optional`, `object`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Wrapped node of `optional` / `nullable`
    #[serde(default)]
    pub inner_type: Option<Box<Validator>>,

    /// Element node of `array`
    #[serde(default)]
    pub element: Option<Box<Validator>>,

    /// Enum or literal values
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,

    /// Enum entries; only the keys are used
    #[serde(default)]
    pub entries: Option<OrderedMap<serde_json::Value>>,

    /// Object shape
    #[serde(default)]
    pub shape: Option<OrderedMap<Validator>>,

    /// Object shape under its alternate key
    #[serde(default)]
    pub properties: Option<OrderedMap<Validator>>,

    /// Union options
    #[serde(default)]
    pub options: Option<Vec<Validator>>,
}

/// Borrowed view of a validator, dispatched on its kind
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// `string`
    String,
    /// `number`, `float` or `int`
    Number,
    /// `boolean`
    Boolean,
    /// `custom`, the file-upload placeholder
    File,
    /// `optional` or `nullable` around the inner node
    Optional(&'a Validator),
    /// `enum`
    Enum,
    /// `array` of the element node
    Array(&'a Validator),
    /// `object` with its shape
    Object(&'a OrderedMap<Validator>),
    /// `union` of its options
    Union(&'a [Validator]),
    /// Anything else, including malformed nodes of a known kind
    Unsupported(&'a str),
}

impl Validator {
    /// Classify this node
    pub fn node(&self) -> Node<'_> {
        match self.kind.as_str() {
            "string" => Node::String,
            "number" | "float" | "int" => Node::Number,
            "boolean" => Node::Boolean,
            "custom" => Node::File,
            "optional" | "nullable" => match &self.inner_type {
                Some(inner) => Node::Optional(inner),
                None => Node::Unsupported(&self.kind),
            },
            "enum" => Node::Enum,
            "array" => match &self.element {
                Some(element) => Node::Array(element),
                None => Node::Unsupported(&self.kind),
            },
            "object" => match self.object_shape() {
                Some(shape) => Node::Object(shape),
                None => Node::Unsupported(&self.kind),
            },
            "union" => match &self.options {
                Some(options) => Node::Union(options),
                None => Node::Unsupported(&self.kind),
            },
            other => Node::Unsupported(other),
        }
    }

    /// Shape of an object node, from `shape` or `properties`
    pub fn object_shape(&self) -> Option<&OrderedMap<Validator>> {
        self.shape.as_ref().or(self.properties.as_ref())
    }

    /// The node with every `optional`/`nullable` wrapper removed
    pub fn unwrapped(&self) -> &Validator {
        match self.node() {
            Node::Optional(inner) => inner.unwrapped(),
            _ => self,
        }
    }

    /// String values of an `enum` (or `literal`) node
    pub fn enum_values(&self) -> Vec<String> {
        if let Some(values) = &self.values {
            return values.iter().filter_map(literal_text).collect();
        }
        self.entries
            .as_ref()
            .map(|entries| entries.iter().map(|(key, _)| key.to_string()).collect())
            .unwrap_or_default()
    }
}

fn literal_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A child table entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDef {
    /// Row validator
    pub schema: Validator,

    /// Field holding the parent row id
    #[serde(default)]
    pub foreign_key: Option<String>,
}

/// The five exported table maps
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaModule {
    /// Owned tables
    pub owned: OrderedMap<Validator>,
    /// Organization-scoped tables
    pub org_scoped: OrderedMap<Validator>,
    /// Cache tables
    pub base: OrderedMap<Validator>,
    /// Singleton tables
    pub singleton: OrderedMap<Validator>,
    /// Child tables
    pub children: OrderedMap<ChildDef>,
}

impl SchemaModule {
    /// Parse a schema document
    pub fn parse(text: &str) -> Result<Self, GeneratorError> {
        serde_json::from_str(text).map_err(|e| GeneratorError::SchemaParse(e.to_string()))
    }

    /// Read and parse the schema document at `path`
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let text = std::fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;
        Self::parse(&text)
    }
}

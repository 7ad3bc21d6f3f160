//! Field metadata
//!
//! Datasets, sources and models describe their columns in a `fields` object
//! keyed by field id. This module reads that object into typed metadata.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Column metadata for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub column_number: i64,
    pub optype: Option<String>,
    pub preferred: bool,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl From<&Value> for FieldInfo {
    fn from(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        Self {
            name: text("name").unwrap_or_default(),
            column_number: value
                .get("column_number")
                .and_then(|v| v.as_i64())
                .unwrap_or(-1),
            optype: text("optype"),
            // Fields are preferred unless flagged otherwise
            preferred: value
                .get("preferred")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            label: text("label"),
            description: text("description"),
        }
    }
}

/// Field id → metadata for a resource
#[derive(Debug, Clone, Default)]
pub struct Fields {
    fields: BTreeMap<String, FieldInfo>,
}

impl Fields {
    /// Read the `fields` object of a resource (empty if it has none)
    pub fn from_resource(resource: &Value) -> Self {
        let fields = resource
            .get("fields")
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .map(|(id, field)| (id.clone(), FieldInfo::from(field)))
                    .collect()
            })
            .unwrap_or_default();

        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldInfo> {
        self.fields.get(field_id)
    }

    /// Field ids in id order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields that take part in modeling by default
    pub fn preferred(&self) -> impl Iterator<Item = (&str, &FieldInfo)> {
        self.fields
            .iter()
            .filter(|(_, field)| field.preferred)
            .map(|(id, field)| (id.as_str(), field))
    }

    /// Highest column number among the preferred fields
    pub fn last_preferred_column(&self) -> Option<i64> {
        self.preferred().map(|(_, field)| field.column_number).max()
    }

    /// Identity mapping between field ids, the default for `fields_map`
    pub fn identity_map(&self) -> Value {
        let map: Map<String, Value> = self
            .ids()
            .map(|id| (id.to_string(), Value::String(id.to_string())))
            .collect();
        Value::Object(map)
    }

    /// User-editable field attributes, in the shape accepted by a source
    /// update: `{field_id: {name, optype, label?, description?}}`
    pub fn changes(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(id, field)| {
                let mut attributes = Map::new();
                attributes.insert("name".to_string(), Value::String(field.name.clone()));
                if let Some(optype) = &field.optype {
                    attributes.insert("optype".to_string(), Value::String(optype.clone()));
                }
                if let Some(label) = &field.label {
                    attributes.insert("label".to_string(), Value::String(label.clone()));
                }
                if let Some(description) = &field.description {
                    attributes.insert(
                        "description".to_string(),
                        Value::String(description.clone()),
                    );
                }
                (id.clone(), Value::Object(attributes))
            })
            .collect()
    }
}

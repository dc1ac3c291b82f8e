//! Data dictionary model
//!
//! The data dictionary is the ordered catalog of a project's fields. Its
//! first entry is, by platform convention, the record-identifier field.

use super::errors::TabulaError;
use super::result::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// A single field definition from a project's data dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Variable name, used as the CSV column name
    pub field_name: String,

    /// Name of the form (instrument) the field belongs to
    pub form_name: String,

    /// Field type (text, radio, calc, ...)
    #[serde(default)]
    pub field_type: String,

    /// Human-readable label
    #[serde(default)]
    pub field_label: String,

    /// Marked as an identifier (PHI) in the dictionary
    #[serde(default, deserialize_with = "deserialize_identifier_flag")]
    pub identifier: bool,
}

impl FieldDescriptor {
    /// Create a non-identifier field
    pub fn new(field_name: impl Into<String>, form_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            form_name: form_name.into(),
            field_type: "text".to_string(),
            field_label: String::new(),
            identifier: false,
        }
    }

    /// Mark the field as PHI-sensitive
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Set the field label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.field_label = label.into();
        self
    }
}

/// The platform writes the identifier flag as `"y"` or an empty string;
/// booleans are accepted too.
fn deserialize_identifier_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => s.trim().eq_ignore_ascii_case("y"),
        None => false,
    })
}

/// Ordered data dictionary for a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataDictionary {
    fields: Vec<FieldDescriptor>,
}

impl DataDictionary {
    /// Wrap an ordered list of field descriptors
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Fields in dictionary order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the dictionary has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name of the record-identifier field (the first dictionary entry)
    ///
    /// # Errors
    ///
    /// Returns `TabulaError::Metadata` for an empty dictionary.
    pub fn record_id_field(&self) -> Result<&str> {
        self.fields
            .first()
            .map(|f| f.field_name.as_str())
            .ok_or_else(|| {
                TabulaError::Metadata("data dictionary has no fields".to_string())
            })
    }

    /// Form names in first-appearance order
    pub fn form_names(&self) -> Vec<&str> {
        let mut forms: Vec<&str> = Vec::new();
        for field in &self.fields {
            if !forms.contains(&field.form_name.as_str()) {
                forms.push(&field.form_name);
            }
        }
        forms
    }
}

impl From<Vec<FieldDescriptor>> for DataDictionary {
    fn from(fields: Vec<FieldDescriptor>) -> Self {
        Self::new(fields)
    }
}

//! The JSON command envelope.
//!
//! Every request to the engine is one JSON object with a `type_` naming the
//! operation and a `name_` naming the object it applies to. Any further
//! keys are operation specific.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Command {
    #[serde(rename = "type_")]
    pub kind: String,
    #[serde(rename = "name_")]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Command {
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Add or replace a field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Add a field from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if `value` cannot be serialized.
    pub fn with_serialized<T: Serialize + ?Sized>(
        mut self,
        key: &str,
        value: &T,
    ) -> Result<Self, CoreError> {
        self.fields
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Merge a set of fields, replacing existing keys.
    #[must_use]
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "type_" | "name_" => None,
            _ => self.fields.get(key),
        }
    }

    /// The command as sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

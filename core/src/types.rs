//! Domain types for the n8n API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A workflow as returned by the server.
///
/// The shape belongs to n8n and changes between releases, so the value is
/// kept as raw JSON and serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workflow(pub Value);

impl Workflow {
    /// The `id` field, when it is present and is a string or a number.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Workflow {
    fn from(value: Value) -> Self {
        Workflow(value)
    }
}

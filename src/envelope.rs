//! Loosely typed view over the `{success, data, message, error}` response envelope

use crate::error::{Operation, UNMAPPED_ERROR};
use crate::{BlackoinError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decoded response body with optional-field probing.
///
/// No schema is assumed beyond the fields the API is known to send; absent
/// or mistyped fields read as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    fields: Map<String, Value>,
}

impl Envelope {
    /// Wrap a decoded payload; anything other than a JSON object reads as empty
    pub fn from_payload(payload: Option<Value>) -> Self {
        match payload {
            Some(Value::Object(fields)) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Raw field lookup; JSON `null` counts as absent
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    /// `success` flag, when present and boolean
    pub fn success(&self) -> Option<bool> {
        self.field("success").and_then(Value::as_bool)
    }

    /// Whether the envelope explicitly reports failure
    pub fn is_rejected(&self) -> bool {
        self.success() == Some(false)
    }

    pub fn message(&self) -> Option<String> {
        self.field("message").map(text_of)
    }

    pub fn error(&self) -> Option<String> {
        self.field("error").map(text_of)
    }

    /// `error`, else `message`, else the unmapped-error sentinel
    pub fn error_text(&self) -> String {
        self.error()
            .or_else(|| self.message())
            .unwrap_or_else(|| UNMAPPED_ERROR.to_string())
    }

    pub fn data(&self) -> Option<&Value> {
        self.field("data")
    }

    pub fn into_data(mut self) -> Option<Value> {
        self.fields.remove("data").filter(|value| !value.is_null())
    }

    /// Whole envelope as a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Map a `data` object into a typed DTO, reporting missing or mistyped fields
/// against `operation`.
pub(crate) fn decode_data<T: DeserializeOwned>(operation: Operation, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| BlackoinError::malformed(operation, e.to_string()))
}

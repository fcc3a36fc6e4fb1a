//! Redaction of credentials and personal documents before payloads are logged

use serde::Serialize;
use serde_json::Value;

const REDACTED: &str = "***";

/// Keep the last four characters of `text`, star out the rest
pub fn mask_tail(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > 4 {
        let visible: String = chars[chars.len() - 4..].iter().collect();
        "*".repeat(chars.len() - 4) + &visible
    } else {
        text.to_string()
    }
}

/// Keys whose values are never logged
fn is_secret_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("secret") || k.contains("token") || k.contains("password")
}

/// Keys holding a personal document (CPF/CNPJ and similar)
fn is_document_key(key: &str) -> bool {
    matches!(key.to_lowercase().as_str(), "document" | "document_number")
}

/// Serialize `v` and redact it; values that fail to serialize log as `null`
pub fn secure_serializable(v: impl Serialize) -> Value {
    match serde_json::to_value(v) {
        Ok(value) => secure_value(&value),
        Err(_) => Value::Null,
    }
}

pub fn secure_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut new = serde_json::Map::with_capacity(map.len());
            for (k, val) in map {
                let new_val = match val {
                    Value::Null => Value::Null,
                    _ if is_secret_key(k) => Value::String(REDACTED.to_string()),
                    Value::String(s) if is_document_key(k) => Value::String(mask_tail(s)),
                    Value::Number(n) if is_document_key(k) => {
                        Value::String(mask_tail(&n.to_string()))
                    }
                    _ => secure_value(val),
                };
                new.insert(k.clone(), new_val);
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(secure_value).collect()),
        other => other.clone(),
    }
}

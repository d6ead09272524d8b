use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::ResultSet, error::ExtractionError};

pub const EXTRACT_ROUTE: &str = "extract";
pub const FILE_PART_NAME: &str = "file";

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Body the extraction service sends alongside a non-success status,
/// e.g. `{"error": "No file uploaded"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Turns a raw `/extract` response into a result set.
///
/// Any 2xx body must be a flat JSON object; its field order is kept. Non-2xx
/// responses become `ExtractionError::Service`, preferring the message from an
/// `ErrorEnvelope` over the raw body text.
pub fn decode_extract_response(status: u16, body: &[u8]) -> Result<ResultSet, ExtractionError> {
    if !(200..300).contains(&status) {
        return Err(ExtractionError::Service {
            status,
            message: service_error_message(body),
        });
    }

    let document: Value = serde_json::from_slice(body)
        .map_err(|err| ExtractionError::parse(format!("body is not JSON: {err}")))?;
    match document {
        Value::Object(fields) => Ok(ResultSet::from_fields(fields)),
        other => Err(ExtractionError::parse(format!(
            "expected a JSON object of fields, got {}",
            json_kind(&other)
        ))),
    }
}

fn service_error_message(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return envelope.error;
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    if text.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("{truncated}…");
    }
    text.to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field names pulled out of the inbound payload by name.
pub const RECOGNIZED_FIELDS: [&str; 5] = ["vid", "project", "tag", "phone", "time"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("Request body must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

/// One normalized record as expected by the destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    /// Inbound `phone` when truthy, otherwise `""`. Not coerced to a string.
    pub phone: Value,
    /// Zero or one element: the inbound `tag` when truthy.
    pub tags: Vec<Value>,
    #[serde(rename = "additionalFields")]
    pub additional_fields: Map<String, Value>,
}

/// The payload sent downstream: always a JSON array holding exactly one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope([OutputRecord; 1]);

impl Envelope {
    pub fn new(record: OutputRecord) -> Self {
        Self([record])
    }

    pub fn record(&self) -> &OutputRecord {
        &self.0[0]
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.0
    }

    pub fn into_record(self) -> OutputRecord {
        let [record] = self.0;
        record
    }
}

// ============================================================================
// Value helpers
// ============================================================================

/// JSON truthiness: `null`, `false`, numeric zero and `""` are falsy.
/// Arrays and objects are always truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Short name of a JSON value's kind, used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Transformation
// ============================================================================

/// Reshape an inbound JSON object into the outbound envelope.
///
/// Mapping:
/// - phone → `phone` (truthy value passed through, else `""`)
/// - tag → `tags` (`[tag]` when truthy, else `[]`)
/// - vid, project, time → `additionalFields`, in that order, whenever the key is present
///   (including `null`, `0`, `false`, `""`)
/// - every other key → `additionalFields`, after the above, in input order
///
/// Recognized keys never appear in `additionalFields` more than once.
pub fn transform(input: Map<String, Value>) -> Envelope {
    let mut vid = None;
    let mut project = None;
    let mut tag = None;
    let mut phone = None;
    let mut time = None;
    let mut rest = Map::new();

    for (key, value) in input {
        match key.as_str() {
            "vid" => vid = Some(value),
            "project" => project = Some(value),
            "tag" => tag = Some(value),
            "phone" => phone = Some(value),
            "time" => time = Some(value),
            _ => {
                rest.insert(key, value);
            }
        }
    }

    let mut additional_fields = Map::with_capacity(rest.len() + 3);
    for (key, value) in [("vid", vid), ("project", project), ("time", time)] {
        if let Some(value) = value {
            additional_fields.insert(key.to_string(), value);
        }
    }
    additional_fields.extend(rest);

    let tags = match tag {
        Some(tag) if is_truthy(&tag) => vec![tag],
        _ => Vec::new(),
    };

    let phone = match phone {
        Some(phone) if is_truthy(&phone) => phone,
        _ => Value::String(String::new()),
    };

    Envelope::new(OutputRecord {
        phone,
        tags,
        additional_fields,
    })
}

/// Request-boundary entry point: accepts any JSON value but only transforms objects.
pub fn transform_value(value: Value) -> Result<Envelope, TransformError> {
    match value {
        Value::Object(map) => Ok(transform(map)),
        other => Err(TransformError::NotAnObject {
            found: value_kind(&other),
        }),
    }
}

//! Inbound envelope (JSON text frame) and its validator.
//!
//! Validation is a two-step typed decode:
//! 1. parse the payload as UTF-8 JSON (`Unparseable` on failure)
//! 2. check the envelope shape and collect every failing field
//!    (`SchemaMismatch` with a structured report)

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Validated application envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Message discriminator (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Arbitrary payload, `null` included.
    pub data: Value,
    /// Client-supplied timestamp, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Machine-readable reason for a single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueCode {
    /// Key is absent.
    Required,
    /// Key is present with the wrong JSON type.
    InvalidType {
        expected: &'static str,
        received: &'static str,
    },
    /// String is present but empty.
    TooSmall,
}

/// One entry of a schema mismatch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Field path; empty for the root value.
    pub path: String,
    #[serde(flatten)]
    pub code: IssueCode,
    pub message: String,
}

impl FieldIssue {
    fn new(path: &str, code: IssueCode) -> Self {
        let message = match &code {
            IssueCode::Required => "Required".to_string(),
            IssueCode::InvalidType { expected, received } => {
                format!("Expected {expected}, received {received}")
            }
            IssueCode::TooSmall => "String must contain at least 1 character(s)".to_string(),
        };
        Self {
            path: path.to_string(),
            code,
            message,
        }
    }
}

/// Why a raw payload was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Payload is not UTF-8 JSON.
    #[error("unparseable payload: {0}")]
    Unparseable(String),
    /// Payload is JSON but not an envelope.
    #[error("schema mismatch on {} field(s)", .0.len())]
    SchemaMismatch(Vec<FieldIssue>),
}

impl ValidationError {
    /// Field report for `SchemaMismatch`, empty otherwise.
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            ValidationError::SchemaMismatch(issues) => issues,
            ValidationError::Unparseable(_) => &[],
        }
    }
}

/// Decode and validate a raw frame payload.
pub fn validate(raw: impl AsRef<[u8]>) -> Result<Envelope, ValidationError> {
    let value: Value = serde_json::from_slice(raw.as_ref())
        .map_err(|e| ValidationError::Unparseable(e.to_string()))?;
    check_shape(value)
}

fn check_shape(value: Value) -> Result<Envelope, ValidationError> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(ValidationError::SchemaMismatch(vec![FieldIssue::new(
                "",
                IssueCode::InvalidType {
                    expected: "object",
                    received: json_kind(&other),
                },
            )]))
        }
    };

    let mut issues = Vec::new();

    let msg_type = match obj.remove("type") {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::String(_)) => {
            issues.push(FieldIssue::new("type", IssueCode::TooSmall));
            None
        }
        Some(other) => {
            issues.push(invalid_type("type", "string", &other));
            None
        }
        None => {
            issues.push(FieldIssue::new("type", IssueCode::Required));
            None
        }
    };

    // `data: null` counts as present; only a missing key fails.
    let data = obj.remove("data");
    if data.is_none() {
        issues.push(FieldIssue::new("data", IssueCode::Required));
    }

    let timestamp = match obj.remove("timestamp") {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            issues.push(invalid_type("timestamp", "string", &other));
            None
        }
    };

    match (msg_type, data) {
        (Some(msg_type), Some(data)) if issues.is_empty() => Ok(Envelope {
            msg_type,
            data,
            timestamp,
        }),
        _ => Err(ValidationError::SchemaMismatch(issues)),
    }
}

fn invalid_type(path: &str, expected: &'static str, got: &Value) -> FieldIssue {
    FieldIssue::new(
        path,
        IssueCode::InvalidType {
            expected,
            received: json_kind(got),
        },
    )
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_null_data() {
        let env = validate(r#"{"type":"ping","data":null}"#).unwrap();
        assert_eq!(env.msg_type, "ping");
        assert_eq!(env.data, Value::Null);
        assert!(env.timestamp.is_none());
    }

    #[test]
    fn drops_unknown_keys() {
        let env = validate(r#"{"type":"t","data":1,"extra":true}"#).unwrap();
        assert_eq!(serde_json::to_value(&env).unwrap(), json!({"type":"t","data":1}));
    }

    #[test]
    fn keeps_timestamp() {
        let env = validate(r#"{"type":"t","data":{},"timestamp":"2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(env.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn reports_every_failing_field() {
        let err = validate(r#"{"type":5,"timestamp":1}"#).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, ["type", "data", "timestamp"]);
    }

    #[test]
    fn empty_type_is_too_small() {
        let err = validate(r#"{"type":"","data":1}"#).unwrap_err();
        assert_eq!(err.issues()[0].code, IssueCode::TooSmall);
    }

    #[test]
    fn non_object_root_is_schema_mismatch() {
        let err = validate("[1,2]").unwrap_err();
        let issue = &err.issues()[0];
        assert_eq!(issue.path, "");
        assert_eq!(
            issue.code,
            IssueCode::InvalidType { expected: "object", received: "array" }
        );
    }

    #[test]
    fn invalid_utf8_is_unparseable() {
        let err = validate([0xff_u8, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ValidationError::Unparseable(_)));
    }

    #[test]
    fn issue_serializes_flat() {
        let issue = FieldIssue::new(
            "type",
            IssueCode::InvalidType { expected: "string", received: "number" },
        );
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({
                "path": "type",
                "code": "invalid_type",
                "expected": "string",
                "received": "number",
                "message": "Expected string, received number"
            })
        );
    }
}

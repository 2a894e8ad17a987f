//! API error taxonomy.

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API failures, used by views to decide how to degrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// 401 that the refresh flow did not (or could not) recover
    Unauthorized,
    /// No usable credentials; the user has to log in again
    LoginRequired,
    /// 403, the user lacks the role for this resource
    Forbidden,
    /// 400 with field errors from a write
    Validation,
    /// 404, usually a normal "nothing here yet" case
    NotFound,
    /// Any other non-success status
    HttpStatus,
    /// Connection failure before a status was received
    Network,
    /// Response body did not match the expected shape
    Parse,
    /// Credential store could not be read or written
    Storage,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::LoginRequired => "login_required",
            ApiErrorKind::Forbidden => "forbidden",
            ApiErrorKind::Validation => "validation",
            ApiErrorKind::NotFound => "not_found",
            ApiErrorKind::HttpStatus => "http_status",
            ApiErrorKind::Network => "network",
            ApiErrorKind::Parse => "parse",
            ApiErrorKind::Storage => "storage",
        };
        f.write_str(label)
    }
}

/// One field's messages from a validation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name, or `non_field_errors` / `detail` for form-level messages
    pub field: String,
    pub messages: Vec<String>,
}

/// Structured error from the API pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when one was received
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Raw body or underlying error text
    pub details: Option<String>,
    /// Field errors for `Validation`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Builds an error from a non-success response status and its body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        let detail = detail_message(body);
        let (kind, summary) = match status {
            StatusCode::UNAUTHORIZED => (ApiErrorKind::Unauthorized, "Not authenticated"),
            StatusCode::FORBIDDEN => (ApiErrorKind::Forbidden, "Access denied"),
            StatusCode::NOT_FOUND => (ApiErrorKind::NotFound, "Not found"),
            StatusCode::BAD_REQUEST => (ApiErrorKind::Validation, "Validation failed"),
            _ => (ApiErrorKind::HttpStatus, "Request failed"),
        };
        let message = match detail {
            Some(detail) => format!("HTTP {code}: {detail}"),
            None => format!("HTTP {code}: {summary}"),
        };
        let fields = if kind == ApiErrorKind::Validation {
            field_errors(body)
        } else {
            Vec::new()
        };
        Self {
            kind,
            status: Some(code),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
            fields,
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Network, format!("Network error: {err}"))
    }

    pub fn parse(err: impl fmt::Display) -> Self {
        Self::new(ApiErrorKind::Parse, format!("Unexpected response: {err}"))
    }

    pub fn storage(err: &anyhow::Error) -> Self {
        Self::new(ApiErrorKind::Storage, format!("Credential store error: {err:#}"))
    }

    pub fn login_required(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::LoginRequired, message)
    }

    /// True when the user must re-authenticate before anything else works.
    pub fn requires_login(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::LoginRequired | ApiErrorKind::Unauthorized
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    /// Messages attached to one field.
    pub fn field_messages(&self, field: &str) -> &[String] {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map_or(&[][..], |f| f.messages.as_slice())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for field in &self.fields {
            write!(f, "\n  {}: {}", field.field, field.messages.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Extracts a `{"detail": "..."}` message from an error body.
fn detail_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("detail")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Extracts per-field messages from a validation body.
///
/// Accepts `{"field": ["msg", ...]}`, `{"field": "msg"}` and nested objects
/// (flattened as `parent.child`).
fn field_errors(body: &str) -> Vec<FieldError> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    collect_fields("", &map, &mut out);
    out
}

fn collect_fields(prefix: &str, map: &serde_json::Map<String, Value>, out: &mut Vec<FieldError>) {
    for (key, value) in map {
        let field = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::String(msg) => out.push(FieldError {
                field,
                messages: vec![msg.clone()],
            }),
            Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
                if !messages.is_empty() {
                    out.push(FieldError { field, messages });
                }
            }
            Value::Object(nested) => collect_fields(&field, nested, out),
            _ => {}
        }
    }
}

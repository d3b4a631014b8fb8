//! Error type produced at the gateway boundary and normalized for display.

use serde_json::Value;
use thiserror::Error;

/// Body attached to a non-success HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
  /// A plain string body
  Text(String),
  /// A structured body, usually an object
  Json(Value),
}

impl ErrorBody {
  /// Parse a raw response body. Only JSON payloads are kept; a JSON string
  /// becomes `Text`, anything else `Json`.
  pub fn parse(raw: &[u8]) -> Option<Self> {
    match serde_json::from_slice::<Value>(raw).ok()? {
      Value::String(s) => Some(ErrorBody::Text(s)),
      Value::Null => None,
      other => Some(ErrorBody::Json(other)),
    }
  }
}

/// Failure of a remote query.
///
/// Every failure is classified once, where it happens, so the cache never
/// has to inspect the shape of an error at runtime.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
  /// Transport-level failure (DNS, refused connection, transport timeout)
  #[error("{message}")]
  Network { message: String },

  /// Non-success HTTP status
  #[error("HTTP error! status: {status}")]
  Http {
    status: u16,
    body: Option<ErrorBody>,
  },

  /// Response payload could not be parsed
  #[error("{message}")]
  Decode { message: String },

  /// Anything without a recognizable shape
  #[error("Unknown error occurred")]
  Unknown,
}

impl QueryError {
  pub fn network(message: impl Into<String>) -> Self {
    QueryError::Network {
      message: message.into(),
    }
  }

  pub fn decode(message: impl Into<String>) -> Self {
    QueryError::Decode {
      message: message.into(),
    }
  }

  pub fn http(status: u16) -> Self {
    QueryError::Http { status, body: None }
  }

  pub fn with_body(self, body: ErrorBody) -> Self {
    match self {
      QueryError::Http { status, .. } => QueryError::Http {
        status,
        body: Some(body),
      },
      other => other,
    }
  }

  /// Human-readable message for display.
  ///
  /// Priority: string body, then `message` field of an object body, then the
  /// error's own message, then the generic status line, then the unknown
  /// fallback.
  pub fn message(&self) -> String {
    match self {
      QueryError::Http {
        body: Some(ErrorBody::Text(text)),
        ..
      } => text.clone(),
      QueryError::Http {
        body: Some(ErrorBody::Json(value)),
        status,
      } => match value.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => format!("HTTP error! status: {}", status),
      },
      QueryError::Http { status, body: None } => format!("HTTP error! status: {}", status),
      QueryError::Network { message } | QueryError::Decode { message } => message.clone(),
      QueryError::Unknown => "Unknown error occurred".to_string(),
    }
  }
}

impl From<reqwest::Error> for QueryError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      QueryError::decode(e.to_string())
    } else if let Some(status) = e.status() {
      QueryError::http(status.as_u16())
    } else {
      QueryError::network(e.to_string())
    }
  }
}

impl From<serde_json::Error> for QueryError {
  fn from(e: serde_json::Error) -> Self {
    QueryError::decode(e.to_string())
  }
}

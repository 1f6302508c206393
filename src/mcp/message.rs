// ABOUTME: JSON-RPC message classification into requests, responses and notifications
// ABOUTME: Performed once at the proxy boundary so nothing downstream re-inspects raw shapes

//! Message classification.
//!
//! Every raw JSON value crossing the proxy is turned into a [`JsonRpcMessage`]
//! exactly once. The rules follow JSON-RPC 2.0 shape detection:
//!
//! | `id` | `method` | `result`/`error` | Classified as |
//! |------|----------|------------------|---------------|
//! | yes  | yes      | -                | Request       |
//! | yes  | no       | yes              | Response      |
//! | no   | yes      | -                | Notification  |
//! | otherwise                          || Malformed     |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Protocol-level message identifier.
///
/// JSON-RPC allows ids to be numbers, strings, or null. Numbers that fit an
/// `i64` are kept as integers; any other number (fractional, or beyond the
/// `i64` range) keeps its exact JSON text so it still correlates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Integer id (most common for auto-incrementing clients).
    Number(i64),
    /// Numeric id outside the `i64` range, as written on the wire.
    OtherNumber(String),
    /// String id.
    String(String),
    /// Explicit `null` id.
    Null,
}

impl MessageId {
    /// Parse from a JSON value.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::OtherNumber(n.to_string()), Self::Number),
            ),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Null => Some(Self::Null),
            _ => None,
        }
    }

    /// Convert back to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number((*n).into()),
            Self::OtherNumber(text) => text
                .parse::<serde_json::Number>()
                .map_or_else(|_| Value::String(text.clone()), Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Null => Value::Null,
        }
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::OtherNumber(text) => f.write_str(text),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A classified JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessage {
    /// A call expecting a response.
    Request {
        /// Correlation id.
        id: MessageId,
        /// Method name.
        method: String,
        /// Parameters, if any.
        params: Option<Value>,
    },
    /// Reply to an earlier request.
    Response {
        /// Id of the request being answered.
        id: MessageId,
        /// `Ok(result)` or `Err(error)`.
        outcome: Result<Value, RpcError>,
    },
    /// One-way message with no id.
    Notification {
        /// Method name.
        method: String,
        /// Parameters, if any.
        params: Option<Value>,
    },
}

impl JsonRpcMessage {
    /// Correlation id, if this kind of message carries one.
    #[must_use]
    pub const fn id(&self) -> Option<&MessageId> {
        match self {
            Self::Request { id, .. } | Self::Response { id, .. } => Some(id),
            Self::Notification { .. } => None,
        }
    }

    /// Method name for requests and notifications.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request { method, .. } | Self::Notification { method, .. } => Some(method),
            Self::Response { .. } => None,
        }
    }
}

/// Raised when a raw value matches none of the three message shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedMessage {
    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has neither an id nor a method")]
    MissingIdAndMethod,

    #[error("message id {0} has no method, result or error")]
    NoMethodOrOutcome(String),

    #[error("unsupported id type: {0}")]
    InvalidId(String),

    #[error("method must be a string")]
    InvalidMethod,

    #[error("invalid error object: {0}")]
    InvalidError(String),
}

/// Classify a raw JSON value.
///
/// Pure: no I/O and no side effects. Callers log and drop on error.
pub fn classify(raw: &Value) -> Result<JsonRpcMessage, MalformedMessage> {
    let obj = raw.as_object().ok_or(MalformedMessage::NotAnObject)?;

    let method = match obj.get("method") {
        None => None,
        Some(Value::String(m)) => Some(m.clone()),
        Some(_) => return Err(MalformedMessage::InvalidMethod),
    };
    let params = obj.get("params").cloned();

    let Some(raw_id) = obj.get("id") else {
        return method
            .map(|method| JsonRpcMessage::Notification { method, params })
            .ok_or(MalformedMessage::MissingIdAndMethod);
    };

    let id = MessageId::from_json(raw_id)
        .ok_or_else(|| MalformedMessage::InvalidId(raw_id.to_string()))?;

    if let Some(method) = method {
        return Ok(JsonRpcMessage::Request { id, method, params });
    }

    if let Some(error) = obj.get("error") {
        let error: RpcError = serde_json::from_value(error.clone())
            .map_err(|e| MalformedMessage::InvalidError(e.to_string()))?;
        return Ok(JsonRpcMessage::Response {
            id,
            outcome: Err(error),
        });
    }

    if let Some(result) = obj.get("result") {
        return Ok(JsonRpcMessage::Response {
            id,
            outcome: Ok(result.clone()),
        });
    }

    Err(MalformedMessage::NoMethodOrOutcome(id.to_string()))
}

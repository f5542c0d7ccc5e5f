//! Tool call envelope.
//!
//! Every tool call, successful or not, is answered with the same response
//! shape: `{success, data|error, metadata}`. Error codes follow the JSON-RPC
//! convention the rest of the tool ecosystem expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// Incoming tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
    /// Opaque caller identity used for rate limiting. Anything stable works:
    /// an API key, a session id, a forwarded address.
    #[serde(default)]
    pub caller: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub execution_time_ms: u64,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMetadata {
    pub fn new(execution_time_ms: u64, cached: bool) -> Self {
        Self {
            execution_time_ms,
            cached,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorBody>,
    pub metadata: ResponseMetadata,
}

impl ToolResponse {
    pub fn success(data: Value, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata,
        }
    }

    pub fn error(error: ToolError, metadata: ResponseMetadata) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolErrorBody {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum ToolError {
    ParseError(String),
    UnknownTool(String),
    InvalidParams(String),
    NotFound(String),
    RateLimited { retry_after_secs: u64 },
    Internal(String),
}

impl ToolError {
    pub fn code(&self) -> i32 {
        match self {
            ToolError::ParseError(_) => -32700,
            ToolError::UnknownTool(_) => -32601,
            ToolError::InvalidParams(_) => -32602,
            ToolError::Internal(_) => -32603,
            ToolError::RateLimited { .. } => -32003,
            ToolError::NotFound(_) => -32004,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ToolError::ParseError(msg) => format!("Parse error: {msg}"),
            ToolError::UnknownTool(name) => format!("Unknown tool: {name}"),
            ToolError::InvalidParams(msg) => format!("Invalid params: {msg}"),
            ToolError::NotFound(what) => format!("Not found: {what}"),
            ToolError::RateLimited { retry_after_secs } => {
                format!("Rate limit exceeded, retry after {retry_after_secs} seconds")
            }
            ToolError::Internal(msg) => format!("Internal error: {msg}"),
        }
    }
}

impl From<ToolError> for ToolErrorBody {
    fn from(err: ToolError) -> Self {
        let retry_after_secs = match &err {
            ToolError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        ToolErrorBody {
            code: err.code(),
            message: err.message(),
            retry_after_secs,
        }
    }
}

impl From<CatalogError> for ToolError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::ComponentNotFound(id) => ToolError::NotFound(id.clone()),
            CatalogError::RateLimitExceeded { retry_after } => ToolError::RateLimited {
                // Round up so "retry after 0s" never lies.
                retry_after_secs: (retry_after.as_secs_f64().ceil() as u64).max(1),
            },
            CatalogError::InvalidComponentId(_)
            | CatalogError::InvalidSearchQuery(_)
            | CatalogError::InvalidCategory(_)
            | CatalogError::Validation(_) => ToolError::InvalidParams(err.public_message()),
            CatalogError::Cache(_) | CatalogError::Network(_) => {
                ToolError::Internal(err.public_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_shape_on_success() {
        let resp = ToolResponse::success(json!({"total": 3}), ResponseMetadata::new(12, true));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["total"], 3);
        assert!(value.get("error").is_none());
        assert_eq!(value["metadata"]["execution_time_ms"], 12);
        assert_eq!(value["metadata"]["cached"], true);
        assert!(value["metadata"]["timestamp"].is_string());
    }

    #[test]
    fn envelope_shape_on_error() {
        let resp = ToolResponse::error(
            ToolError::UnknownTool("frobnicate".into()),
            ResponseMetadata::new(1, false),
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("data").is_none());
        assert_eq!(value["error"]["code"], -32601);
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let err: ToolError = CatalogError::RateLimitExceeded {
            retry_after: Duration::from_secs(42),
        }
        .into();
        let body: ToolErrorBody = err.into();
        assert_eq!(body.code, -32003);
        assert_eq!(body.retry_after_secs, Some(42));
    }

    #[test]
    fn retry_after_rounds_sub_second_remainders_up() {
        let err: ToolError = CatalogError::RateLimitExceeded {
            retry_after: Duration::from_millis(2900),
        }
        .into();
        let body: ToolErrorBody = err.into();
        assert_eq!(body.retry_after_secs, Some(3));

        let err: ToolError = CatalogError::RateLimitExceeded {
            retry_after: Duration::from_millis(10),
        }
        .into();
        let body: ToolErrorBody = err.into();
        assert_eq!(body.retry_after_secs, Some(1));
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err: ToolError = CatalogError::Cache("lru slot 3 corrupted".into()).into();
        assert!(!err.message().contains("slot 3"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err: ToolError = CatalogError::InvalidComponentId("bad id!".into()).into();
        assert!(err.message().contains("bad id!"));
        assert_eq!(err.code(), -32602);
    }
}

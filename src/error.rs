//! Error taxonomy for the catalog service.
//!
//! Every failure the service can produce is one variant of [`CatalogError`],
//! and every variant carries a fixed classification: fault side, retryability,
//! severity and whether its message may be shown to callers. The protocol
//! layer relies on this mapping being total.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Which side of the protocol boundary is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Client,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid component id: {0}")]
    InvalidComponentId(String),

    #[error("component not found: {0}")]
    ComponentNotFound(String),

    #[error("invalid search query: {0}")]
    InvalidSearchQuery(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after: Duration },
}

impl CatalogError {
    pub fn fault(&self) -> Fault {
        match self {
            CatalogError::InvalidComponentId(_)
            | CatalogError::ComponentNotFound(_)
            | CatalogError::InvalidSearchQuery(_)
            | CatalogError::InvalidCategory(_)
            | CatalogError::Validation(_)
            | CatalogError::RateLimitExceeded { .. } => Fault::Client,
            CatalogError::Cache(_) | CatalogError::Network(_) => Fault::Server,
        }
    }

    /// Whether retrying the same request can succeed. Rate-limited requests
    /// are retryable only after [`CatalogError::retry_after`] has elapsed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::Network(_)
                | CatalogError::Cache(_)
                | CatalogError::RateLimitExceeded { .. }
        )
    }

    /// Whether the error message is safe to place in the response envelope.
    /// Cache and network internals stay in server-side logs.
    pub fn user_facing(&self) -> bool {
        match self.fault() {
            Fault::Client => true,
            Fault::Server => false,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CatalogError::InvalidComponentId(_)
            | CatalogError::InvalidSearchQuery(_)
            | CatalogError::InvalidCategory(_)
            | CatalogError::Validation(_) => Severity::Low,
            CatalogError::ComponentNotFound(_) => Severity::Medium,
            CatalogError::RateLimitExceeded { .. } | CatalogError::Network(_) => Severity::High,
            CatalogError::Cache(_) => Severity::Critical,
        }
    }

    /// Delay after which a rate-limited request may be retried.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Message for the response envelope. Non-user-facing errors collapse to
    /// a fixed text; the full message is logged where the error is handled.
    pub fn public_message(&self) -> String {
        if self.user_facing() {
            self.to_string()
        } else {
            "internal error".to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

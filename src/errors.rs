//! Application error model with MCP error mapping
//!
//! Defines a typed error hierarchy using `thiserror` so callers can tell a
//! bad argument from a credential problem from a Gmail failure without
//! inspecting message text. Each variant maps to an MCP `ErrorData`.

use rmcp::model::ErrorData;
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid tool arguments or configuration
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No tool registered under the requested name
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Stored credentials are missing, unreadable, expired, or rejected
    #[error("credentials unavailable: {0}")]
    Credentials(String),
    /// Gmail or the userinfo endpoint returned an error
    #[error("provider error: {0}")]
    Provider(String),
    /// Provider request timed out
    #[error("operation timed out: {0}")]
    Timeout(String),
    /// Internal error (serialization, client construction)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convenience constructor for `InvalidInput`
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable, machine-readable error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Credentials(_) => "credentials",
            Self::Provider(_) => "provider",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }

    /// Convert to MCP `ErrorData`
    ///
    /// # Mappings
    ///
    /// - `InvalidInput` → `invalid_params`
    /// - `UnknownTool` → `invalid_params`
    /// - `Credentials` → `invalid_request`
    /// - `Provider` → `internal_error`
    /// - `Timeout` → `internal_error`
    /// - `Internal` → `internal_error`
    pub fn to_error_data(&self) -> ErrorData {
        let data = Some(json!({ "code": self.code() }));
        let msg = self.to_string();
        match self {
            Self::InvalidInput(_) | Self::UnknownTool(_) => ErrorData::invalid_params(msg, data),
            Self::Credentials(_) => ErrorData::invalid_request(msg, data),
            Self::Provider(_) | Self::Timeout(_) | Self::Internal(_) => {
                ErrorData::internal_error(msg, data)
            }
        }
    }
}

/// Type alias for fallible return values
pub type AppResult<T> = Result<T, AppError>;

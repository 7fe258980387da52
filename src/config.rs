//! Configuration module for the Gmail account and provider endpoints
//!
//! All configuration is loaded from environment variables prefixed with
//! `GMAIL_MCP_`. Command-line flags parsed in `main` may override the account
//! and credentials directory after loading.

use std::env;
use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Default Gmail REST API base URL
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
/// Default Google OAuth2 userinfo endpoint
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Server-wide configuration
///
/// Cloned into the provider client and credential store at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Account whose stored credentials are used (usually an email address)
    pub user_id: String,
    /// Directory holding `.oauth2.<user_id>.json` credential files
    pub credentials_dir: PathBuf,
    /// Gmail REST API base URL (no trailing slash)
    pub api_base: String,
    /// OAuth2 userinfo endpoint
    pub userinfo_url: String,
    /// Per-request timeout for provider calls in milliseconds
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    /// Load all configuration from environment variables
    ///
    /// `GMAIL_MCP_USER_ID` may be left unset when `user_override` supplies
    /// the account (e.g. from `--user-id`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if required environment variables are missing
    /// or malformed.
    ///
    /// # Example Environment
    ///
    /// ```text
    /// GMAIL_MCP_USER_ID=user@gmail.com
    /// GMAIL_MCP_CREDENTIALS_DIR=/home/user/.config/gmail-mcp
    /// GMAIL_MCP_REQUEST_TIMEOUT_MS=30000
    /// ```
    pub fn load_from_env(user_override: Option<String>) -> AppResult<Self> {
        let user_id = match user_override {
            Some(user) if !user.trim().is_empty() => user,
            _ => required_env("GMAIL_MCP_USER_ID")?,
        };
        validate_user_id(&user_id)?;

        let request_timeout_ms = parse_u64_env("GMAIL_MCP_REQUEST_TIMEOUT_MS", 30_000)?;
        if request_timeout_ms == 0 {
            return Err(AppError::invalid(
                "GMAIL_MCP_REQUEST_TIMEOUT_MS must be greater than zero",
            ));
        }

        Ok(Self {
            user_id,
            credentials_dir: PathBuf::from(optional_env("GMAIL_MCP_CREDENTIALS_DIR", ".")?),
            api_base: trim_url(optional_env("GMAIL_MCP_API_BASE", DEFAULT_API_BASE)?),
            userinfo_url: optional_env("GMAIL_MCP_USERINFO_URL", DEFAULT_USERINFO_URL)?,
            request_timeout_ms,
        })
    }

    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Path of the stored credential file for the configured account
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_dir.join(format!(".oauth2.{}.json", self.user_id))
    }
}

/// Reject account ids that could escape the credentials directory
fn validate_user_id(user_id: &str) -> AppResult<()> {
    if user_id.len() > 254 {
        return Err(AppError::invalid("user id must be at most 254 chars"));
    }
    if user_id
        .chars()
        .any(|ch| ch.is_control() || matches!(ch, '/' | '\\'))
        || user_id.contains("..")
    {
        return Err(AppError::invalid(
            "user id must not contain path separators, '..', or control characters",
        ));
    }
    Ok(())
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}

/// Read a required environment variable, returning error if missing or empty
fn required_env(key: &str) -> AppResult<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!(
            "missing required environment variable {key}"
        ))),
    }
}

/// Read an optional string environment variable with default fallback
///
/// Empty values fall back to `default`.
fn optional_env(key: &str, default: &str) -> AppResult<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        Ok(_) | Err(VarError::NotPresent) => Ok(default.to_owned()),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `u64` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u64`.
fn parse_u64_env(key: &str, default: u64) -> AppResult<u64> {
    match env::var(key) {
        Ok(v) => parse_u64_value(&v).ok_or_else(|| {
            AppError::InvalidInput(format!("invalid u64 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a raw `u64` value; surrounding whitespace is not accepted
fn parse_u64_value(value: &str) -> Option<u64> {
    value.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ServerConfig, parse_u64_value, trim_url, validate_user_id};

    #[test]
    fn parse_u64_value_rejects_padding_and_garbage() {
        assert_eq!(parse_u64_value("1500"), Some(1500));
        for invalid in ["", " 1500 ", "1500\n", "-1", "ten", "1.5"] {
            assert_eq!(parse_u64_value(invalid), None);
        }
    }

    #[test]
    fn user_id_rejects_path_traversal() {
        validate_user_id("someone@gmail.com").expect("email address must be valid");
        for invalid in ["../etc/passwd", "a/b", "a\\b", "x\ny"] {
            assert!(validate_user_id(invalid).is_err(), "{invalid:?} must fail");
        }
    }

    #[test]
    fn credentials_path_uses_oauth2_file_naming() {
        let config = ServerConfig {
            user_id: "someone@gmail.com".to_owned(),
            credentials_dir: PathBuf::from("/var/lib/gmail-mcp"),
            api_base: trim_url("https://gmail.googleapis.com/gmail/v1/".to_owned()),
            userinfo_url: super::DEFAULT_USERINFO_URL.to_owned(),
            request_timeout_ms: 1_000,
        };
        assert_eq!(
            config.credentials_path(),
            PathBuf::from("/var/lib/gmail-mcp/.oauth2.someone@gmail.com.json")
        );
        assert_eq!(config.api_base, "https://gmail.googleapis.com/gmail/v1");
    }
}

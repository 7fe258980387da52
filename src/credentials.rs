//! Stored OAuth credential lookup
//!
//! Credentials are produced by an external authorization step and stored as
//! `.oauth2.<user_id>.json` in the credentials directory. This module only
//! reads them; it never refreshes or rewrites a token.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use secrecy::SecretString;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};

/// Access credentials for one Gmail account
///
/// The token is held in a `SecretString` so it never reaches logs.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account the credentials belong to
    pub user_id: String,
    /// OAuth2 bearer token
    pub access_token: SecretString,
    /// Token expiry, when the stored file records one
    pub expires_at: Option<DateTime<Utc>>,
}

/// Source of the current stored credentials
pub trait CredentialStore: Send + Sync {
    /// Return the credentials currently on record
    ///
    /// # Errors
    ///
    /// Returns `Credentials` when nothing usable is stored.
    fn stored_credentials(&self) -> BoxFuture<'_, AppResult<Credentials>>;
}

/// On-disk credential layout (subset of the OAuth2 client library format)
#[derive(Debug, Deserialize)]
struct StoredCredentials {
    access_token: Option<String>,
    token_expiry: Option<String>,
}

/// Credential store backed by a JSON file per account
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    user_id: String,
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(user_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            user_id: user_id.into(),
            path: path.into(),
        }
    }

    /// Build a store for the configured account and credentials directory
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.user_id.clone(), config.credentials_path())
    }

    async fn load(&self) -> AppResult<Credentials> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::Credentials(format!(
                "cannot read stored credentials for '{}' at {}: {e}",
                self.user_id,
                self.path.display()
            ))
        })?;
        let credentials = parse_stored_credentials(&self.user_id, &raw, Utc::now())?;
        tracing::debug!(
            user = %credentials.user_id,
            expires_at = ?credentials.expires_at,
            "loaded stored credentials"
        );
        Ok(credentials)
    }
}

impl CredentialStore for FileCredentialStore {
    fn stored_credentials(&self) -> BoxFuture<'_, AppResult<Credentials>> {
        Box::pin(self.load())
    }
}

/// Decode a stored credential file and reject unusable tokens
fn parse_stored_credentials(
    user_id: &str,
    raw: &[u8],
    now: DateTime<Utc>,
) -> AppResult<Credentials> {
    let stored: StoredCredentials = serde_json::from_slice(raw).map_err(|e| {
        AppError::Credentials(format!("stored credentials for '{user_id}' are malformed: {e}"))
    })?;

    let access_token = stored
        .access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::Credentials(format!(
                "stored credentials for '{user_id}' have no access token"
            ))
        })?;

    let expires_at = stored
        .token_expiry
        .as_deref()
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    AppError::Credentials(format!(
                        "stored credentials for '{user_id}' have invalid token_expiry '{raw}'"
                    ))
                })
        })
        .transpose()?;

    if let Some(expiry) = expires_at
        && expiry <= now
    {
        return Err(AppError::Credentials(format!(
            "stored credentials for '{user_id}' expired at {}; re-run authorization",
            expiry.to_rfc3339()
        )));
    }

    Ok(Credentials {
        user_id: user_id.to_owned(),
        access_token: SecretString::new(access_token.into()),
        expires_at,
    })
}

//! `read_gmail_emails`: bounded Gmail search, newest first
//!
//! Arguments are decoded into [`ReadEmailsInput`] and validated before any
//! provider call. The provider's ordering is returned as-is; nothing is
//! re-sorted, de-duplicated, or paginated past the first page.

use std::sync::Arc;

use futures::future::BoxFuture;
use rmcp::model::JsonObject;

use super::{ToolHandler, decode_args};
use crate::credentials::CredentialStore;
use crate::errors::{AppError, AppResult};
use crate::gmail::MailProvider;
use crate::models::{
    ContentItem, MAX_MAX_RESULTS, MIN_MAX_RESULTS, ReadEmailsInput, ToolDescription,
};

pub const TOOL_NAME: &str = "read_gmail_emails";

const DESCRIPTION: &str = "Reads Gmail emails based on an optional search query. Returns emails in reverse chronological order (newest first).";

/// Longest accepted search query in bytes
const MAX_QUERY_LEN: usize = 2048;

pub struct ReadEmailsTool {
    credentials: Arc<dyn CredentialStore>,
    provider: Arc<dyn MailProvider>,
}

/// Search parameters after defaulting and validation
#[derive(Debug, Clone, PartialEq)]
struct SearchRequest {
    query: Option<String>,
    max_results: u32,
}

impl ReadEmailsTool {
    pub fn new(credentials: Arc<dyn CredentialStore>, provider: Arc<dyn MailProvider>) -> Self {
        Self {
            credentials,
            provider,
        }
    }

    async fn run(&self, args: JsonObject) -> AppResult<Vec<ContentItem>> {
        let input = decode_args::<ReadEmailsInput>(TOOL_NAME, args)?;
        let request = validate_input(input)?;

        let credentials = self.credentials.stored_credentials().await?;
        let emails = self
            .provider
            .search_messages(&credentials, request.query.as_deref(), request.max_results)
            .await?;
        tracing::debug!(
            query = request.query.as_deref().unwrap_or(""),
            max_results = request.max_results,
            returned = emails.len(),
            "gmail search completed"
        );
        Ok(vec![ContentItem::json_text(&emails)?])
    }
}

impl ToolHandler for ReadEmailsTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription::for_input::<ReadEmailsInput>(TOOL_NAME, DESCRIPTION)
    }

    fn invoke(&self, args: JsonObject) -> BoxFuture<'_, AppResult<Vec<ContentItem>>> {
        Box::pin(self.run(args))
    }
}

/// Apply defaults and enforce the advertised bounds
fn validate_input(input: ReadEmailsInput) -> AppResult<SearchRequest> {
    if !(MIN_MAX_RESULTS..=MAX_MAX_RESULTS).contains(&input.max_results) {
        return Err(AppError::InvalidInput(format!(
            "max_results must be within {MIN_MAX_RESULTS}..={MAX_MAX_RESULTS}, got {}",
            input.max_results
        )));
    }
    let max_results = u32::try_from(input.max_results)
        .map_err(|_| AppError::invalid("max_results does not fit in u32"))?;

    let query = match input.query {
        Some(q) if !q.trim().is_empty() => {
            validate_query(&q)?;
            Some(q)
        }
        _ => None,
    };

    Ok(SearchRequest { query, max_results })
}

/// Validate search query bounds and characters
fn validate_query(query: &str) -> AppResult<()> {
    if query.len() > MAX_QUERY_LEN {
        return Err(AppError::InvalidInput(format!(
            "query must be at most {MAX_QUERY_LEN} bytes"
        )));
    }
    if query.chars().any(char::is_control) {
        return Err(AppError::invalid("query must not contain control characters"));
    }
    Ok(())
}

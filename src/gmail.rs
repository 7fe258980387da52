//! Gmail REST and OAuth2 userinfo client
//!
//! Provides the two provider calls the tools need: identity lookup and a
//! bounded message search. Every request carries the stored bearer token and
//! the configured timeout. Nothing is retried.

use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ServerConfig;
use crate::credentials::Credentials;
use crate::errors::{AppError, AppResult};
use crate::models::{EmailSummary, UserInfo};

/// Headers requested for each message in a search result
const METADATA_HEADERS: [&str; 5] = ["Subject", "From", "To", "Cc", "Date"];

/// Mail provider operations used by the tools
pub trait MailProvider: Send + Sync {
    /// Look up the identity behind `credentials`
    fn user_info<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, AppResult<UserInfo>>;

    /// Search messages, newest first, returning at most `max_results` records
    ///
    /// `query` of `None` means no filter.
    fn search_messages<'a>(
        &'a self,
        credentials: &'a Credentials,
        query: Option<&'a str>,
        max_results: u32,
    ) -> BoxFuture<'a, AppResult<Vec<EmailSummary>>>;
}

/// Gmail API client
///
/// Owns a pooled `reqwest::Client`; shared by both tools through `Arc`.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    api_base: String,
    userinfo_url: String,
}

impl GmailClient {
    /// Build a client using the configured endpoints and timeout
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &ServerConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    async fn fetch_user_info(&self, credentials: &Credentials) -> AppResult<UserInfo> {
        let request = self.http.get(&self.userinfo_url);
        send_json(request, credentials, "userinfo").await
    }

    async fn search(
        &self,
        credentials: &Credentials,
        query: Option<&str>,
        max_results: u32,
    ) -> AppResult<Vec<EmailSummary>> {
        let mut params = vec![("maxResults", max_results.to_string())];
        if let Some(q) = query {
            params.push(("q", q.to_owned()));
        }
        let request = self
            .http
            .get(format!("{}/users/me/messages", self.api_base))
            .query(&params);
        let list: ListMessagesResponse = send_json(request, credentials, "messages.list").await?;

        let refs = list.messages.unwrap_or_default();
        tracing::debug!(
            matched = refs.len(),
            estimate = ?list.result_size_estimate,
            "gmail message list returned"
        );

        let mut summaries = Vec::with_capacity(refs.len());
        for message in refs.iter().take(max_results as usize) {
            let detail = self.fetch_metadata(credentials, &message.id).await?;
            summaries.push(summarize_message(detail));
        }
        Ok(summaries)
    }

    async fn fetch_metadata(
        &self,
        credentials: &Credentials,
        id: &str,
    ) -> AppResult<GmailMessage> {
        let mut params = vec![("format", "metadata")];
        params.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
        let request = self
            .http
            .get(format!(
                "{}/users/me/messages/{}",
                self.api_base,
                urlencoding::encode(id)
            ))
            .query(&params);
        send_json(request, credentials, "messages.get").await
    }
}

impl MailProvider for GmailClient {
    fn user_info<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, AppResult<UserInfo>> {
        Box::pin(self.fetch_user_info(credentials))
    }

    fn search_messages<'a>(
        &'a self,
        credentials: &'a Credentials,
        query: Option<&'a str>,
        max_results: u32,
    ) -> BoxFuture<'a, AppResult<Vec<EmailSummary>>> {
        Box::pin(self.search(credentials, query, max_results))
    }
}

/// Send an authorized request and decode a JSON success body
///
/// # Errors
///
/// - `Timeout` if the request times out
/// - `Credentials` for HTTP 401/403
/// - `Provider` for other HTTP or transport failures
/// - `Internal` if the success body cannot be decoded
async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    credentials: &Credentials,
    operation: &str,
) -> AppResult<T> {
    let response = request
        .bearer_auth(credentials.access_token.expose_secret())
        .send()
        .await
        .map_err(|e| transport_error(operation, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(operation, status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Internal(format!("{operation}: cannot decode response: {e}")))
}

fn transport_error(operation: &str, e: &reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(format!("{operation} request timed out"))
    } else {
        AppError::Provider(format!("{operation} request failed: {e}"))
    }
}

/// Map a non-success HTTP status to an error kind
fn status_error(operation: &str, status: StatusCode, body: &str) -> AppError {
    let detail = google_error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    });
    let msg = format!("{operation} returned {}: {detail}", status.as_u16());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Credentials(msg),
        _ => AppError::Provider(msg),
    }
}

/// Extract the message from a Google API error body
///
/// Handles both `{"error": {"message": ...}}` and the OAuth2 form
/// `{"error": "...", "error_description": ...}`.
fn google_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    if let Some(msg) = error.get("message").and_then(|m| m.as_str()) {
        return Some(msg.to_owned());
    }
    let code = error.as_str()?;
    match value.get("error_description").and_then(|d| d.as_str()) {
        Some(desc) => Some(format!("{code}: {desc}")),
        None => Some(code.to_owned()),
    }
}

/// Convert Gmail message metadata into the tool's record shape
fn summarize_message(message: GmailMessage) -> EmailSummary {
    let headers = message.payload.map(|p| p.headers).unwrap_or_default();
    EmailSummary {
        id: message.id,
        thread_id: message.thread_id,
        label_ids: message.label_ids,
        snippet: message.snippet,
        internal_date: message.internal_date,
        size_estimate: message.size_estimate,
        subject: header_value(&headers, "subject"),
        from: header_value(&headers, "from"),
        to: header_value(&headers, "to"),
        cc: header_value(&headers, "cc"),
        date: header_value(&headers, "date"),
    }
}

/// Get header value by case-insensitive name
fn header_value(headers: &[MessageHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find_map(|h| h.name.eq_ignore_ascii_case(name).then(|| h.value.clone()))
}

/// `users.messages.list` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    messages: Option<Vec<MessageRef>>,
    result_size_estimate: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRef {
    id: String,
}

/// `users.messages.get` response in `metadata` format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    thread_id: Option<String>,
    #[serde(default)]
    label_ids: Vec<String>,
    snippet: Option<String>,
    internal_date: Option<String>,
    size_estimate: Option<u64>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

//! MCP server wiring the tool registry into rmcp
//!
//! Implements `ServerHandler` by hand: `tools/list` is answered from each
//! tool's `describe()`, and `tools/call` is dispatched through the registry
//! by name. Errors are mapped via [`AppError::to_error_data`].

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData, JsonObject, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};

use crate::config::ServerConfig;
use crate::credentials::FileCredentialStore;
use crate::errors::{AppError, AppResult};
use crate::gmail::GmailClient;
use crate::models::ContentItem;
use crate::tools::ToolRegistry;

/// Gmail MCP server
///
/// Holds the immutable tool registry. Cheap to clone; every clone shares the
/// same handlers and collaborators.
#[derive(Clone)]
pub struct GmailMcpServer {
    registry: Arc<ToolRegistry>,
}

impl GmailMcpServer {
    /// Create a server over an existing registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Build the production server: file credentials plus the Gmail client
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the HTTP client cannot be built.
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let credentials = Arc::new(FileCredentialStore::from_config(config));
        let provider = Arc::new(GmailClient::new(config)?);
        tracing::info!(
            user = %config.user_id,
            credentials = %config.credentials_path().display(),
            "gmail mcp server configured"
        );
        Ok(Self::new(ToolRegistry::with_default_tools(credentials, provider)))
    }

    /// Run one tool call and convert the outcome to MCP types
    async fn call(&self, name: &str, args: JsonObject) -> Result<CallToolResult, ErrorData> {
        let started = Instant::now();
        let result = self.registry.invoke(name, args).await;
        let duration_ms = duration_ms(started);
        match result {
            Ok(items) => {
                tracing::info!(
                    tool = %name,
                    duration_ms,
                    kinds = ?items.iter().map(ContentItem::kind).collect::<Vec<_>>(),
                    "tool call succeeded"
                );
                Ok(CallToolResult::success(
                    items.into_iter().map(ContentItem::into_content).collect(),
                ))
            }
            Err(e) => {
                log_failure(name, duration_ms, &e);
                Err(e.to_error_data())
            }
        }
    }
}

/// MCP server handler implementation
impl ServerHandler for GmailMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Gmail MCP server. Use get_gmail_user_info to identify the connected account and read_gmail_emails to search messages (newest first) with Gmail query syntax.".to_owned(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        let tools = self
            .registry
            .descriptions()
            .into_iter()
            .map(|d| d.into_tool())
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        let name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        async move { self.call(&name, args).await }
    }
}

/// Calculate elapsed milliseconds
fn duration_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

fn log_failure(tool: &str, duration_ms: u64, error: &AppError) {
    match error {
        AppError::InvalidInput(_) | AppError::UnknownTool(_) => {
            tracing::info!(
                tool = %tool,
                duration_ms,
                code = error.code(),
                %error,
                "tool call rejected"
            );
        }
        _ => {
            tracing::warn!(
                tool = %tool,
                duration_ms,
                code = error.code(),
                %error,
                "tool call failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rmcp::model::{ErrorCode, JsonObject, RawContent};
    use serde_json::json;

    use super::GmailMcpServer;
    use crate::models::EmailSummary;
    use crate::tools::ToolRegistry;
    use crate::tools::fakes::{FakeProvider, FakeStore};

    fn server(provider: FakeProvider) -> GmailMcpServer {
        GmailMcpServer::new(ToolRegistry::with_default_tools(
            Arc::new(FakeStore::with_token("t")),
            Arc::new(provider),
        ))
    }

    #[tokio::test]
    async fn call_wraps_items_as_text_content() {
        let provider = FakeProvider {
            emails: vec![EmailSummary {
                id: "m1".to_owned(),
                ..EmailSummary::default()
            }],
            ..FakeProvider::default()
        };
        let result = server(provider)
            .call("read_gmail_emails", JsonObject::new())
            .await
            .expect("must succeed");

        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);
        let RawContent::Text(text) = &result.content[0].raw else {
            panic!("expected text content");
        };
        let parsed: serde_json::Value = serde_json::from_str(&text.text).expect("valid json");
        assert_eq!(parsed[0]["id"], json!("m1"));
    }

    #[tokio::test]
    async fn call_maps_errors_to_error_data() {
        let err = server(FakeProvider::default())
            .call("no_such_tool", JsonObject::new())
            .await
            .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.data.expect("data")["code"], json!("unknown_tool"));
    }
}

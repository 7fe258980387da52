//! Tool handler contract and name-keyed registry
//!
//! Every tool implements [`ToolHandler`]: `describe` advertises its name and
//! input schema, `invoke` decodes arguments at the boundary, performs the
//! provider call, and returns content items. The MCP server only ever talks
//! to the [`ToolRegistry`].

mod read_emails;
mod user_info;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use rmcp::model::JsonObject;
use serde::de::DeserializeOwned;

use crate::credentials::CredentialStore;
use crate::errors::{AppError, AppResult};
use crate::gmail::MailProvider;
use crate::models::{ContentItem, ToolDescription};

pub use read_emails::ReadEmailsTool;
pub use user_info::GetUserInfoTool;

/// A named, self-describing tool
pub trait ToolHandler: Send + Sync {
    /// Name, description, and input schema; pure and deterministic
    fn describe(&self) -> ToolDescription;

    /// Execute with caller-supplied arguments
    ///
    /// Keys the tool does not document are ignored.
    fn invoke(&self, args: JsonObject) -> BoxFuture<'_, AppResult<Vec<ContentItem>>>;
}

/// Lookup table of tools keyed by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding both Gmail tools over shared collaborators
    pub fn with_default_tools(
        credentials: Arc<dyn CredentialStore>,
        provider: Arc<dyn MailProvider>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(GetUserInfoTool::new(
            Arc::clone(&credentials),
            Arc::clone(&provider),
        ));
        registry.register(ReadEmailsTool::new(credentials, provider));
        registry
    }

    /// Register a tool under its described name, replacing any previous one
    pub fn register<H: ToolHandler + 'static>(&mut self, handler: H) {
        let name = handler.describe().name;
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::warn!(tool = %name, "replaced previously registered tool");
        }
    }

    /// Descriptions of all registered tools, ordered by name
    pub fn descriptions(&self) -> Vec<ToolDescription> {
        self.handlers.values().map(|h| h.describe()).collect()
    }

    /// Dispatch a call to the named tool
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` if nothing is registered under `name`, otherwise
    /// whatever the tool returns.
    pub async fn invoke(&self, name: &str, args: JsonObject) -> AppResult<Vec<ContentItem>> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| AppError::UnknownTool(name.to_owned()))?;
        handler.invoke(args).await
    }
}

/// Decode a generic argument map into a tool's input type
fn decode_args<T: DeserializeOwned>(tool: &str, args: JsonObject) -> AppResult<T> {
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| AppError::InvalidInput(format!("invalid arguments for {tool}: {e}")))
}

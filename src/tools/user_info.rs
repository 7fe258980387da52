//! `get_gmail_user_info`: identity of the account behind the stored credentials

use std::sync::Arc;

use futures::future::BoxFuture;
use rmcp::model::JsonObject;

use super::{ToolHandler, decode_args};
use crate::credentials::CredentialStore;
use crate::errors::AppResult;
use crate::gmail::MailProvider;
use crate::models::{ContentItem, GetUserInfoInput, ToolDescription};

pub const TOOL_NAME: &str = "get_gmail_user_info";

pub struct GetUserInfoTool {
    credentials: Arc<dyn CredentialStore>,
    provider: Arc<dyn MailProvider>,
}

impl GetUserInfoTool {
    pub fn new(credentials: Arc<dyn CredentialStore>, provider: Arc<dyn MailProvider>) -> Self {
        Self {
            credentials,
            provider,
        }
    }

    async fn run(&self, args: JsonObject) -> AppResult<Vec<ContentItem>> {
        let GetUserInfoInput {} = decode_args::<GetUserInfoInput>(TOOL_NAME, args)?;
        let credentials = self.credentials.stored_credentials().await?;
        let user_info = self.provider.user_info(&credentials).await?;
        tracing::debug!(user = %credentials.user_id, "fetched gmail user info");
        Ok(vec![ContentItem::json_text(&user_info)?])
    }
}

impl ToolHandler for GetUserInfoTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription::for_input::<GetUserInfoInput>(TOOL_NAME, "Returns the gmail user info.")
    }

    fn invoke(&self, args: JsonObject) -> BoxFuture<'_, AppResult<Vec<ContentItem>>> {
        Box::pin(self.run(args))
    }
}

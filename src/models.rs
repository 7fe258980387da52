//! Tool contract DTOs, tool inputs, and provider record shapes
//!
//! Tool inputs derive `JsonSchema` so the advertised input schema is
//! generated from the same type the arguments are decoded into.

use std::sync::Arc;

use rmcp::model::{Content, JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::errors::{AppError, AppResult};

/// Default number of messages returned by `read_gmail_emails`
pub const DEFAULT_MAX_RESULTS: i64 = 100;
/// Smallest accepted `max_results`
pub const MIN_MAX_RESULTS: i64 = 1;
/// Largest accepted `max_results` (one Gmail list page)
pub const MAX_MAX_RESULTS: i64 = 500;

/// Self-description of a tool, shown to the agent before invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescription {
    /// Unique tool name, used for dispatch
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema object describing accepted arguments
    pub input_schema: JsonObject,
}

impl ToolDescription {
    /// Build a description whose input schema is generated from `T`
    pub fn for_input<T: JsonSchema>(name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            input_schema: input_schema_for::<T>(),
        }
    }

    /// Convert into the MCP `Tool` listing entry
    pub fn into_tool(self) -> Tool {
        Tool::new(self.name, self.description, Arc::new(self.input_schema))
    }
}

/// Generate an object schema for a tool input type
///
/// Drops the `$schema`/`title` decoration and guarantees `properties` is
/// present so argument-free tools still advertise an empty object.
fn input_schema_for<T: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(T);
    let mut object = schema.as_object().cloned().unwrap_or_default();
    object.remove("$schema");
    object.remove("title");
    object.insert("type".to_owned(), Value::from("object"));
    object
        .entry("properties")
        .or_insert_with(|| Value::Object(JsonObject::new()));
    object
}

/// Typed unit of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    /// Text payload (JSON-encoded for both tools)
    Text { text: String },
}

impl ContentItem {
    /// Serialize `value` as 2-space indented JSON text
    pub fn json_text<T: Serialize + ?Sized>(value: &T) -> AppResult<Self> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Internal(format!("serialization failure: {e}")))?;
        Ok(Self::Text { text })
    }

    /// Discriminant as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
        }
    }

    /// Convert into MCP content
    pub fn into_content(self) -> Content {
        match self {
            Self::Text { text } => Content::text(text),
        }
    }
}

/// Input: `get_gmail_user_info` takes no arguments
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetUserInfoInput {}

/// Input: search messages
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadEmailsInput {
    /// Gmail search query (optional). Examples:
    /// - 'is:unread' for unread emails
    /// - 'from:example@gmail.com' for emails from a specific sender
    /// - 'newer_than:2d' for emails from last 2 days
    /// - 'has:attachment' for emails with attachments
    /// If not provided, returns recent emails without filtering.
    #[serde(default)]
    pub query: Option<String>,
    /// Maximum number of emails to retrieve (1-500)
    #[serde(
        default = "default_max_results",
        deserialize_with = "deserialize_max_results"
    )]
    #[schemars(with = "i64", range(min = 1, max = 500))]
    pub max_results: i64,
}

impl Default for ReadEmailsInput {
    fn default() -> Self {
        Self {
            query: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

/// Decode `max_results`, treating `null` as absent
///
/// Integral floats such as `5.0` are valid JSON Schema integers and are
/// accepted; fractional values are rejected. Range is checked later.
fn deserialize_max_results<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(DEFAULT_MAX_RESULTS),
        Some(n) => integral_value(&n)
            .ok_or_else(|| D::Error::custom(format!("invalid value: {n}, expected an integer"))),
    }
}

fn integral_value(n: &Number) -> Option<i64> {
    if let Some(v) = n.as_i64() {
        return Some(v);
    }
    // u64 above i64::MAX and large floats saturate and fail the range check
    let f = n.as_f64()?;
    (f.fract() == 0.0).then_some(f as i64)
}

/// Google account identity from the OAuth2 userinfo endpoint
///
/// Fields Google adds beyond the typed ones are kept in `extra` and written
/// back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Hosted domain for Workspace accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<String>,
    /// Any other userinfo fields (e.g. `link`)
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Message record returned by `read_gmail_emails`
///
/// Built from Gmail message metadata; bodies are never fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    /// Gmail message id
    pub id: String,
    /// Gmail thread id
    pub thread_id: Option<String>,
    /// Label ids (e.g. `INBOX`, `UNREAD`)
    #[serde(default)]
    pub label_ids: Vec<String>,
    /// Short plain-text preview supplied by Gmail
    pub snippet: Option<String>,
    /// Internal receive time, epoch milliseconds as a string
    pub internal_date: Option<String>,
    /// Estimated message size in bytes
    pub size_estimate: Option<u64>,
    /// Subject header
    pub subject: Option<String>,
    /// From header
    pub from: Option<String>,
    /// To header
    pub to: Option<String>,
    /// Cc header
    pub cc: Option<String>,
    /// Date header
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ContentItem, GetUserInfoInput, ReadEmailsInput, ToolDescription, UserInfo};

    #[test]
    fn argument_free_schema_is_an_empty_object() {
        let desc = ToolDescription::for_input::<GetUserInfoInput>("t", "d");
        assert_eq!(desc.input_schema["type"], json!("object"));
        assert_eq!(desc.input_schema["properties"], json!({}));
        assert!(
            desc.input_schema
                .get("required")
                .and_then(|r| r.as_array())
                .is_none_or(|r| r.is_empty())
        );
    }

    #[test]
    fn read_emails_schema_advertises_default_and_bounds() {
        let desc = ToolDescription::for_input::<ReadEmailsInput>("t", "d");
        let props = desc.input_schema["properties"]
            .as_object()
            .expect("properties must be an object");
        assert!(props.contains_key("query"));
        let max = &props["max_results"];
        assert_eq!(max["type"], json!("integer"));
        assert_eq!(max["default"], json!(100));
        assert_eq!(max["minimum"], json!(1));
        assert_eq!(max["maximum"], json!(500));
        assert!(
            props["query"]["description"]
                .as_str()
                .is_some_and(|d| d.contains("is:unread"))
        );
    }

    #[test]
    fn json_text_is_indented_and_round_trips() {
        let value = json!([
            { "id": "a", "size": 12, "labels": ["INBOX", "UNREAD"] },
            { "id": "b", "size": 7, "nested": { "k": "v" } }
        ]);
        let item = ContentItem::json_text(&value).expect("must serialize");
        assert_eq!(item.kind(), "text");
        let ContentItem::Text { text } = item;
        assert!(text.contains("\n  {"));
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed, value);
    }

    #[test]
    fn content_item_serializes_with_type_tag() {
        let item = ContentItem::Text {
            text: "{}".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&item).expect("must serialize"),
            json!({ "type": "text", "text": "{}" })
        );
    }

    #[test]
    fn user_info_keeps_fields_it_does_not_model() {
        let body = json!({
            "id": "1077",
            "email": "alice@example.com",
            "verified_email": true,
            "link": "https://plus.google.com/1077",
            "locale": "en",
            "custom": { "tier": 2, "tags": ["a", "b"] }
        });
        let info: UserInfo = serde_json::from_value(body.clone()).expect("valid userinfo");
        assert_eq!(info.email.as_deref(), Some("alice@example.com"));
        assert_eq!(info.extra["link"], json!("https://plus.google.com/1077"));
        assert!(!info.extra.contains_key("email"));

        let ContentItem::Text { text } = ContentItem::json_text(&info).expect("must serialize");
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed, body);
    }
}

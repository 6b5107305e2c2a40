//! Anakin chatbot API wire format.
//!
//! The upstream accepts a single text blob per call rather than a structured
//! message list, so conversations are flattened into `role: content` lines.

use crate::api::models::Message;
use serde::Serialize;
use serde_json::Value;

/// Body of `POST /v1/chatbots/{appId}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnakinRequest {
    pub content: String,
    pub stream: bool,
}

impl AnakinRequest {
    pub fn new(messages: &[Message], stream: bool) -> Self {
        Self {
            content: flatten_messages(messages),
            stream,
        }
    }
}

/// Collapse a conversation into newline-joined `role: content` lines.
///
/// Turn order is preserved; trailing whitespace of the result is trimmed.
pub fn flatten_messages(messages: &[Message]) -> String {
    let mut content = String::new();
    for message in messages {
        content.push_str(&message.role);
        content.push_str(": ");
        content.push_str(&message.content);
        content.push('\n');
    }
    content.truncate(content.trim_end().len());
    content
}

/// Extract the `content` field from an upstream JSON document.
///
/// Missing or null content yields an empty string; non-string scalars are
/// rendered as their JSON text.
pub fn extract_content(value: &Value) -> String {
    match value.get("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse one upstream payload (a full response body or a stream fragment)
/// and return its text content.
pub fn parse_content(data: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(data)?;
    Ok(extract_content(&value))
}

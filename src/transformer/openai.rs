//! Translation of upstream payloads into OpenAI Chat Completions objects.

use crate::api::models::{
    ChatCompletionChunk, ChatCompletionResponse, Choice, Delta, Message, StreamChoice, Usage,
    FINISH_REASON_STOP, OBJECT_CHAT_COMPLETION, OBJECT_CHAT_COMPLETION_CHUNK, ROLE_ASSISTANT,
};
use crate::transformer::anakin::parse_content;
use crate::transformer::stream::{format_sse_data, format_sse_done};

/// Generate an OpenAI-style completion id (`chatcmpl-<uuid>`).
pub fn generate_completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4())
}

fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Builds OpenAI responses for one request's model name.
#[derive(Debug, Clone)]
pub struct ResponseTranslator {
    model: String,
}

impl ResponseTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Wrap a complete upstream answer into a `chat.completion` object.
    ///
    /// Every call gets a fresh id and timestamp. Usage is zero because the
    /// upstream does not count tokens.
    pub fn to_response(&self, answer: Option<&str>) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: generate_completion_id(),
            object: OBJECT_CHAT_COMPLETION.to_string(),
            created: unix_timestamp(),
            model: self.model.clone(),
            usage: Usage::default(),
            choices: vec![Choice {
                index: 0,
                message: Message::new(ROLE_ASSISTANT, answer.unwrap_or_default()),
                finish_reason: Some(FINISH_REASON_STOP.to_string()),
            }],
        }
    }

    /// Wrap one content delta into a `chat.completion.chunk`.
    ///
    /// The id is regenerated per chunk, matching what the upstream adapter
    /// has always sent.
    pub fn to_chunk(&self, content: String) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: generate_completion_id(),
            object: OBJECT_CHAT_COMPLETION_CHUNK.to_string(),
            created: unix_timestamp(),
            model: self.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta: Delta { content },
            }],
        }
    }

    /// Translate one raw upstream fragment into an outbound SSE frame.
    pub fn fragment_to_frame(&self, data: &str) -> Result<String, serde_json::Error> {
        let content = parse_content(data)?;
        let chunk = self.to_chunk(content);
        Ok(format_sse_data(&serde_json::to_string(&chunk)?))
    }

    /// Terminal frame of a successful stream.
    pub fn done_frame(&self) -> String {
        format_sse_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn frame_json(frame: &str) -> Value {
        let body = frame
            .strip_prefix("data: ")
            .and_then(|f| f.strip_suffix("\n\n"))
            .expect("frame is data-prefixed and blank-line terminated");
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_to_response() {
        let response = ResponseTranslator::new("gpt-4o").to_response(Some("hello"));

        assert!(response.id.starts_with("chatcmpl-"));
        assert_eq!(response.object, "chat.completion");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.usage, Usage::default());
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].index, 0);
        assert_eq!(response.choices[0].message.role, "assistant");
        assert_eq!(response.choices[0].message.content, "hello");
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(response.created > 0);
    }

    #[test]
    fn test_to_response_without_answer() {
        let response = ResponseTranslator::new("gpt-4o").to_response(None);
        assert_eq!(response.choices[0].message.content, "");
    }

    #[test]
    fn test_to_response_ids_differ_content_equal() {
        let translator = ResponseTranslator::new("gpt-4o");
        let a = translator.to_response(Some("same"));
        let b = translator.to_response(Some("same"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.choices[0].message, b.choices[0].message);
    }

    #[test]
    fn test_fragment_to_frame() {
        let frame = ResponseTranslator::new("gpt-4o")
            .fragment_to_frame(r#"{"content":"A"}"#)
            .unwrap();

        let json = frame_json(&frame);
        assert_eq!(json["object"], "chat.completion.chunk");
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["choices"][0]["index"], 0);
        assert_eq!(json["choices"][0]["delta"]["content"], "A");
        assert!(json["id"].as_str().unwrap().starts_with("chatcmpl-"));
    }

    #[test]
    fn test_fragment_without_content_still_emits_chunk() {
        let frame = ResponseTranslator::new("gpt-4o")
            .fragment_to_frame(r#"{"thread_id":"t-1"}"#)
            .unwrap();
        assert_eq!(frame_json(&frame)["choices"][0]["delta"]["content"], "");
    }

    #[test]
    fn test_fragment_malformed_json() {
        assert!(ResponseTranslator::new("gpt-4o")
            .fragment_to_frame("not-json")
            .is_err());
    }

    #[test]
    fn test_chunk_ids_are_regenerated() {
        let translator = ResponseTranslator::new("gpt-4o");
        let a = translator.to_chunk("A".to_string());
        let b = translator.to_chunk("B".to_string());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_done_frame() {
        assert_eq!(ResponseTranslator::new("m").done_frame(), "data: [DONE]\n\n");
    }
}

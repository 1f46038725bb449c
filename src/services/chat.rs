//! Types and trait for the assistant chat collaborator.
//!
//! A provider answers either with a single JSON body or with a stream of
//! `data: {...}` frames terminated by `data: [DONE]`. [`decode_stream`] and
//! [`decode_reply`] turn either shape into a [`ChatReply`].

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn reply(&self, request: &ChatRequest) -> Result<ChatReply>;
}

const DONE_FRAME: &str = "[DONE]";

/// Concatenates the content fragments of a streamed body in arrival order.
///
/// Blank lines and frames that are not JSON are skipped. Nothing after
/// `data: [DONE]` is read.
pub fn decode_stream(body: &str) -> String {
    let mut content = String::new();

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame = line.strip_prefix("data:").map_or(line, str::trim_start);
        if frame == DONE_FRAME {
            break;
        }
        let Ok(payload) = serde_json::from_str::<Value>(frame) else {
            continue;
        };
        if let Some(text) = fragment(&payload) {
            content.push_str(text);
        }
    }

    content
}

/// Reads a non-streamed reply: `{content}` or an OpenAI-style completion.
pub fn decode_reply(body: &str) -> Result<ChatReply> {
    let payload: Value = serde_json::from_str(body)?;

    payload["content"]
        .as_str()
        .or_else(|| payload["choices"][0]["message"]["content"].as_str())
        .map(|content| ChatReply {
            content: content.to_string(),
        })
        .ok_or_else(|| anyhow!("reply carries no content"))
}

fn fragment(payload: &Value) -> Option<&str> {
    payload["content"]
        .as_str()
        .or_else(|| payload["choices"][0]["delta"]["content"].as_str())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stream_concatenates_in_order() {
        let body = "data: {\"content\": \"Hel\"}\n\ndata: {\"content\": \"lo\"}\ndata: [DONE]\n";
        assert_eq!(decode_stream(body), "Hello");
    }

    #[test]
    fn test_decode_stream_openai_delta_shape() {
        let body = concat!(
            "data: {\"choices\": [{\"delta\": {\"role\": \"assistant\"}}]}\n",
            "data: {\"choices\": [{\"delta\": {\"content\": \"Trail \"}}]}\n",
            "data: {\"choices\": [{\"delta\": {\"content\": \"counts\"}}]}\n",
            "data: [DONE]\n",
        );
        assert_eq!(decode_stream(body), "Trail counts");
    }

    #[test]
    fn test_decode_stream_skips_garbage_and_stops_at_done() {
        let body = concat!(
            ": keep-alive\n",
            "data: not json\n",
            "data: {\"content\": \"a\"}\n",
            "data: [DONE]\n",
            "data: {\"content\": \"b\"}\n",
        );
        assert_eq!(decode_stream(body), "a");
    }

    #[test]
    fn test_decode_stream_empty_body() {
        assert_eq!(decode_stream(""), "");
    }

    #[test]
    fn test_decode_reply_shapes() {
        assert_eq!(decode_reply(r#"{"content": "hi"}"#).unwrap().content, "hi");
        assert_eq!(
            decode_reply(r#"{"choices": [{"message": {"role": "assistant", "content": "yo"}}]}"#)
                .unwrap()
                .content,
            "yo"
        );
        assert!(decode_reply(r#"{"choices": []}"#).is_err());
        assert!(decode_reply("nope").is_err());
    }

    #[test]
    fn test_request_omits_missing_system_prompt() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            stream: true,
            system_prompt: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("system_prompt").is_none());
    }
}

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use count_unify::fetch::{BasicClient, HttpClient, auth::ApiKey, post_json};

use super::{checked_body, parse_timeout, transport_error};
use crate::services::chat::{ChatMessage, ChatProvider, ChatReply, ChatRequest, decode_reply, decode_stream};

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CHAT_TIMEOUT_SECONDS: u64 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `CHAT_*` settings; the key falls back to `OPENAI_API_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = match lookup("CHAT_TIMEOUT_SECONDS") {
            Some(v) => parse_timeout("CHAT_TIMEOUT_SECONDS", &v)?,
            None => Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECONDS),
        };

        Ok(Self {
            base_url: lookup("CHAT_BASE_URL").unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            model: lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            timeout,
            api_key: lookup("CHAT_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .filter(|k| !k.trim().is_empty()),
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    stream: bool,
}

pub struct OpenAiChat<C = ApiKey<BasicClient>> {
    client: C,
    config: ChatConfig,
}

impl OpenAiChat {
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("CHAT_API_KEY or OPENAI_API_KEY must be set"))?;
        let client = ApiKey::bearer(BasicClient::new(), key)?;
        Ok(Self::with_client(client, config))
    }
}

impl<C> OpenAiChat<C> {
    pub fn with_client(client: C, config: ChatConfig) -> Self {
        Self { client, config }
    }
}

/// Puts the system prompt first and drops messages missing a role or content.
fn prepare_messages(request: &ChatRequest) -> Vec<ChatMessage> {
    let system = request
        .system_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| ChatMessage {
            role: "system".to_string(),
            content: p.to_string(),
        });

    system
        .into_iter()
        .chain(
            request
                .messages
                .iter()
                .filter(|m| !m.role.trim().is_empty() && !m.content.trim().is_empty())
                .cloned(),
        )
        .collect()
}

#[async_trait]
impl<C: HttpClient> ChatProvider for OpenAiChat<C> {
    #[tracing::instrument(skip_all, fields(model = %self.config.model, stream = request.stream))]
    async fn reply(&self, request: &ChatRequest) -> Result<ChatReply> {
        let messages = prepare_messages(request);
        if messages.is_empty() {
            return Err(anyhow!("chat request has no messages"));
        }

        let body = CompletionRequest {
            model: &self.config.model,
            messages: messages.iter().collect(),
            stream: request.stream,
        };
        debug!(messages = messages.len(), "Sending chat request");

        let response = post_json(&self.client, &self.config.base_url, &body, self.config.timeout)
            .await
            .map_err(transport_error)?;
        let text = checked_body(response).await?;

        let reply = if request.stream {
            ChatReply {
                content: decode_stream(&text),
            }
        } else {
            decode_reply(&text)?
        };

        info!(chars = reply.content.len(), "Chat reply assembled");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::StubClient;
    use crate::services::ProviderError;
    use std::collections::HashMap;

    fn config() -> ChatConfig {
        ChatConfig::from_lookup(|_| None).unwrap()
    }

    fn request(stream: bool, system_prompt: Option<&str>) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::user("How many counts on the trail?"),
                ChatMessage {
                    role: "assistant".to_string(),
                    content: " ".to_string(),
                },
            ],
            stream,
            system_prompt: system_prompt.map(str::to_string),
        }
    }

    #[test]
    fn test_config_defaults_and_key_fallback() {
        let defaults = config();
        assert_eq!(defaults.base_url, DEFAULT_CHAT_URL);
        assert_eq!(defaults.model, DEFAULT_CHAT_MODEL);
        assert_eq!(defaults.timeout, Duration::from_secs(20));
        assert_eq!(defaults.api_key, None);

        let env: HashMap<&str, &str> = [("OPENAI_API_KEY", "sk-openai"), ("CHAT_MODEL", "m")]
            .into_iter()
            .collect();
        let config = ChatConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.model, "m");
    }

    #[test]
    fn test_prepare_messages_system_first() {
        let messages = prepare_messages(&request(false, Some("Be brief.")));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");

        assert_eq!(prepare_messages(&request(false, Some("  "))).len(), 1);
    }

    #[tokio::test]
    async fn test_reply_non_stream() {
        let stub = StubClient::new(200, r#"{"choices": [{"message": {"content": "About 1200."}}]}"#);
        let chat = OpenAiChat::with_client(ApiKey::bearer(&stub, "sk-chat").unwrap(), config());

        let reply = chat.reply(&request(false, None)).await.unwrap();
        assert_eq!(reply.content, "About 1200.");

        let sent = stub.last();
        assert_eq!(sent.authorization.as_deref(), Some("Bearer sk-chat"));
        assert_eq!(sent.body["model"], DEFAULT_CHAT_MODEL);
        assert_eq!(sent.body["stream"], false);
        assert_eq!(sent.body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_stream() {
        let body = "data: {\"choices\": [{\"delta\": {\"content\": \"About \"}}]}\n\
                    data: {\"choices\": [{\"delta\": {\"content\": \"1200.\"}}]}\n\
                    data: [DONE]\n";
        let chat = OpenAiChat::with_client(StubClient::new(200, body), config());

        let reply = chat.reply(&request(true, Some("Be brief."))).await.unwrap();
        assert_eq!(reply.content, "About 1200.");
        assert_eq!(chat.client.last().body["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_reply_rate_limited() {
        let chat = OpenAiChat::with_client(StubClient::new(429, ""), config());
        let err = chat.reply(&request(false, None)).await.unwrap_err();
        assert_eq!(err.downcast_ref::<ProviderError>(), Some(&ProviderError::RateLimited));
    }
}

use crate::ai::client::{
    CompletionRequest, Defaults, LlmClient, http_client, non_empty, send_json, split_system,
};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    defaults: Defaults,
}

/// Messages API body. Bedrock accepts the same body without `model`
/// and with `anthropic_version` set.
#[derive(Debug, Serialize)]
pub(crate) struct MessagesBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_version: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<MessagesTurn<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessagesTurn<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Concatenates the text blocks of the reply.
    pub fn text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

pub(crate) fn messages_body<'a>(
    defaults: &'a Defaults,
    request: &'a CompletionRequest,
) -> MessagesBody<'a> {
    let (system, turns) = split_system(&request.messages);
    MessagesBody {
        anthropic_version: None,
        model: Some(defaults.model(request)),
        max_tokens: defaults.max_tokens(request),
        temperature: defaults.temperature(request),
        system,
        messages: turns
            .into_iter()
            .map(|m| MessagesTurn {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
    }
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            http: http_client(config)?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            defaults: Defaults::from_config(config),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn default_model(&self) -> &str {
        &self.defaults.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let response: MessagesResponse = send_json(
            ProviderKind::Anthropic,
            self.http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&messages_body(&self.defaults, request)),
        )
        .await?;

        non_empty(ProviderKind::Anthropic, response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::Message;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_messages_body_lifts_system_prompt() {
        let config = ProviderConfig::new(ProviderKind::Anthropic);
        let defaults = Defaults::from_config(&config);
        let request =
            CompletionRequest::new(vec![Message::system("rules"), Message::user("text")]);

        let body = serde_json::to_value(messages_body(&defaults, &request)).unwrap();
        assert_eq!(body["system"], "rules");
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("anthropic_version").is_none());
    }

    #[tokio::test]
    async fn test_complete_joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"system": "rules"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "{\"label\": "},
                    {"type": "text", "text": "true}"}
                ]
            })))
            .mount(&server)
            .await;

        let config = ProviderConfig::new(ProviderKind::Anthropic)
            .with_api_key("sk-ant")
            .with_base_url(server.uri());
        let client = AnthropicClient::new(&config).unwrap();
        let request =
            CompletionRequest::new(vec![Message::system("rules"), Message::user("text")]);

        assert_eq!(client.complete(&request).await.unwrap(), "{\"label\": true}");
    }
}

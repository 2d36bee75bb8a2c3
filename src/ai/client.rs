use crate::ai::anthropic::AnthropicClient;
use crate::ai::bedrock::BedrockClient;
use crate::ai::gemini::GeminiClient;
use crate::ai::openai::OpenAiClient;
use crate::ai::openrouter::OpenRouterClient;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single chat completion call. Unset fields fall back to the client's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Empty model names select the client's default model.
    pub fn with_model(mut self, model: &str) -> Self {
        let model = model.trim();
        self.model = (!model.is_empty()).then(|| model.to_string());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Structured-text completion capability shared by every provider.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn default_model(&self) -> &str;

    /// Returns the text of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Builds the client for the configured provider.
pub fn build_client(config: &ProviderConfig) -> Result<Arc<dyn LlmClient>> {
    config.validate()?;

    let client: Arc<dyn LlmClient> = match config.provider {
        ProviderKind::Bedrock => Arc::new(BedrockClient::new(config)?),
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(config)?),
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(config)?),
        ProviderKind::Gemini => Arc::new(GeminiClient::new(config)?),
        ProviderKind::OpenRouter => Arc::new(OpenRouterClient::new(config)?),
    };

    tracing::info!(
        provider = %client.provider(),
        model = client.default_model(),
        "LLM client ready"
    );
    Ok(client)
}

/// Settings every HTTP-backed provider resolves the same way.
#[derive(Debug, Clone)]
pub(crate) struct Defaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Defaults {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            model: config.model_or_default(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model<'a>(&'a self, request: &'a CompletionRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&self.model)
    }

    pub fn temperature(&self, request: &CompletionRequest) -> f32 {
        request.temperature.unwrap_or(self.temperature)
    }

    pub fn max_tokens(&self, request: &CompletionRequest) -> u32 {
        request.max_tokens.unwrap_or(self.max_tokens)
    }
}

pub(crate) fn http_client(config: &ProviderConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::configuration(format!("failed to build HTTP client: {}", e)))
}

/// Sends the request and decodes a successful JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderKind,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::provider(provider, format!("request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::provider(provider, format!("failed to read response body: {}", e)))?;

    if !status.is_success() {
        return Err(Error::provider(provider, format!("status {}: {}", status, body)));
    }

    serde_json::from_str(&body).map_err(|e| {
        Error::provider(
            provider,
            format!("unexpected response format: {}\nBody: {}", e, body),
        )
    })
}

/// Joins all system messages into one prompt and returns the rest in order.
/// Anthropic, Bedrock and Gemini take the system prompt outside the message list.
pub(crate) fn split_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let rest = messages.iter().filter(|m| m.role != Role::System).collect();

    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, rest)
}

pub(crate) fn non_empty(provider: ProviderKind, text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(Error::provider(provider, "no completion text received"))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::Mutex;

/// Test client that answers from a script instead of a remote model.
///
/// Each request is matched against the rules in order; the first rule whose
/// needle occurs in the last user message answers it. Requests are recorded.
#[cfg(test)]
pub struct ScriptedClient {
    rules: Vec<(String, Result<String>)>,
    fallback: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

#[cfg(test)]
impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer any request whose user message contains `needle`.
    pub fn on(mut self, needle: &str, response: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(response.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str, error: Error) -> Self {
        self.rules.push((needle.to_string(), Err(error)));
        self
    }

    /// Responses handed out in order when no rule matches.
    pub fn then(self, response: &str) -> Self {
        self.fallback.lock().unwrap().push_back(response.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[cfg(test)]
fn clone_error(error: &Error) -> Error {
    match error {
        Error::Configuration(m) => Error::Configuration(m.clone()),
        Error::Provider { provider, message } => Error::provider(*provider, message.clone()),
        Error::Parse {
            context,
            message,
            raw,
        } => Error::Parse {
            context: context.clone(),
            message: message.clone(),
            raw: raw.clone(),
        },
        Error::OutcomeMismatch {
            sentences,
            outcomes,
        } => Error::OutcomeMismatch {
            sentences: *sentences,
            outcomes: *outcomes,
        },
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());

        let user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        for (needle, response) in &self.rules {
            if user.contains(needle.as_str()) {
                return match response {
                    Ok(text) => Ok(text.clone()),
                    Err(e) => Err(clone_error(e)),
                };
            }
        }

        self.fallback.lock().unwrap().pop_front().ok_or_else(|| {
            Error::provider(
                ProviderKind::OpenAi,
                format!("no scripted response for: {}", user),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AwsCredentials;

    #[test]
    fn test_split_system_joins_system_messages() {
        let messages = vec![
            Message::system("first"),
            Message::user("question"),
            Message::system("second"),
            Message::assistant("answer"),
        ];
        let (system, rest) = split_system(&messages);
        assert_eq!(system.as_deref(), Some("first\n\nsecond"));
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].role, Role::User);
        assert_eq!(rest[1].role, Role::Assistant);
    }

    #[test]
    fn test_split_system_without_system_prompt() {
        let messages = vec![Message::user("hi")];
        let (system, rest) = split_system(&messages);
        assert!(system.is_none());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_request_with_blank_model_uses_default() {
        let request = CompletionRequest::new(vec![]).with_model("  ");
        assert!(request.model.is_none());

        let request = CompletionRequest::new(vec![]).with_model("gpt-4o");
        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_defaults_prefer_request_values() {
        let config = ProviderConfig::new(ProviderKind::OpenAi).with_max_tokens(100);
        let defaults = Defaults::from_config(&config);

        let mut request = CompletionRequest::new(vec![]);
        assert_eq!(defaults.model(&request), "gpt-4o-mini");
        assert_eq!(defaults.max_tokens(&request), 100);

        request.model = Some("gpt-4o".to_string());
        request.max_tokens = Some(7);
        request.temperature = Some(0.5);
        assert_eq!(defaults.model(&request), "gpt-4o");
        assert_eq!(defaults.max_tokens(&request), 7);
        assert_eq!(defaults.temperature(&request), 0.5);
    }

    #[test]
    fn test_build_client_requires_credentials() {
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::Anthropic,
            ProviderKind::Gemini,
            ProviderKind::OpenRouter,
            ProviderKind::Bedrock,
        ] {
            let result = build_client(&ProviderConfig::new(kind));
            assert!(
                matches!(result, Err(Error::Configuration(_))),
                "{} should require credentials",
                kind
            );
        }
    }

    #[test]
    fn test_build_client_selects_provider() {
        let client = build_client(
            &ProviderConfig::new(ProviderKind::Anthropic).with_api_key("sk-ant-test"),
        )
        .unwrap();
        assert_eq!(client.provider(), ProviderKind::Anthropic);
        assert_eq!(client.default_model(), "claude-sonnet-4-20250514");

        let client = build_client(
            &ProviderConfig::new(ProviderKind::Bedrock).with_aws_credentials(AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            }),
        )
        .unwrap();
        assert_eq!(client.provider(), ProviderKind::Bedrock);
    }

    #[tokio::test]
    async fn test_scripted_client_matches_rules_then_fallback() {
        let client = ScriptedClient::new().on("apple", "red").then("default");

        let apple = CompletionRequest::new(vec![Message::user("what colour is an apple?")]);
        assert_eq!(client.complete(&apple).await.unwrap(), "red");

        let other = CompletionRequest::new(vec![Message::user("what else?")]);
        assert_eq!(client.complete(&other).await.unwrap(), "default");
        assert!(client.complete(&other).await.is_err());
        assert_eq!(client.request_count(), 3);
    }
}

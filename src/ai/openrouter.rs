use crate::ai::client::{CompletionRequest, Defaults, LlmClient, non_empty};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{Error, Result};
use openrouter_api::{
    models::provider_preferences::ProviderPreferences,
    models::provider_preferences::ProviderSort,
    types::chat::{ChatCompletionRequest, Message},
};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1/";

/// Routes completions through OpenRouter, preferring the highest-throughput upstream.
#[derive(Debug)]
pub struct OpenRouterClient {
    client: openrouter_api::OpenRouterClient<openrouter_api::Ready>,
    defaults: Defaults,
}

impl OpenRouterClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let base_url = config.base_url.as_deref().unwrap_or(OPENROUTER_BASE_URL);

        let client = openrouter_api::OpenRouterClient::new()
            .with_base_url(base_url)
            .map_err(|e| Error::configuration(format!("invalid OpenRouter base URL: {}", e)))?
            .with_api_key(api_key)
            .map_err(|e| {
                Error::configuration(format!("failed to create OpenRouter client: {}", e))
            })?;

        Ok(Self {
            client,
            defaults: Defaults::from_config(config),
        })
    }

    fn chat_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| Message::text(m.role.as_str(), &m.content))
            .collect();

        let provider = ProviderPreferences::new().with_sort(ProviderSort::Throughput);

        ChatCompletionRequest {
            model: self.defaults.model(request).to_string(),
            messages,
            provider: Some(provider),
            stream: None,
            response_format: None,
            tools: None,
            tool_choice: None,
            models: None,
            transforms: None,
            route: None,
            user: None,
            max_tokens: Some(self.defaults.max_tokens(request)),
            temperature: Some(self.defaults.temperature(request)),
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            repetition_penalty: None,
            min_p: None,
            top_a: None,
            seed: None,
            stop: None,
            logit_bias: None,
            logprobs: None,
            top_logprobs: None,
            prediction: None,
            parallel_tool_calls: None,
            verbosity: None,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenRouterClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn default_model(&self) -> &str {
        &self.defaults.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .chat()
            .map_err(|e| Error::provider(ProviderKind::OpenRouter, e.to_string()))?
            .chat_completion(self.chat_request(request))
            .await
            .map_err(|e| Error::provider(ProviderKind::OpenRouter, format!("API error: {}", e)))?;

        let Some(choice) = response.choices.first() else {
            return Err(Error::provider(
                ProviderKind::OpenRouter,
                "no response choices received",
            ));
        };

        let text = match &choice.message.content {
            openrouter_api::MessageContent::Text(text) => text.clone(),
            openrouter_api::MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| {
                    if let openrouter_api::ContentPart::Text(tc) = p {
                        Some(tc.text.clone())
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        };
        non_empty(ProviderKind::OpenRouter, text)
    }
}

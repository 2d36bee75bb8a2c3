use crate::ai::client::{
    CompletionRequest, Defaults, LlmClient, Role, http_client, non_empty, send_json,
    split_system,
};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    defaults: Defaults,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            http: http_client(config)?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            defaults: Defaults::from_config(config),
        })
    }
}

fn generate_body<'a>(
    defaults: &Defaults,
    request: &'a CompletionRequest,
    system: Option<&'a str>,
) -> GenerateBody<'a> {
    let contents = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| Content {
            // Gemini calls the assistant side "model".
            role: Some(if m.role == Role::Assistant { "model" } else { "user" }),
            parts: vec![Part { text: &m.content }],
        })
        .collect();

    GenerateBody {
        contents,
        system_instruction: system.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        generation_config: GenerationConfig {
            temperature: defaults.temperature(request),
            max_output_tokens: defaults.max_tokens(request),
            response_mime_type: request.json_output.then_some("application/json"),
        },
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn default_model(&self) -> &str {
        &self.defaults.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let (system, _) = split_system(&request.messages);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.defaults.model(request)
        );

        let response: GenerateResponse = send_json(
            ProviderKind::Gemini,
            self.http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&generate_body(&self.defaults, request, system.as_deref())),
        )
        .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        non_empty(ProviderKind::Gemini, text)
    }
}

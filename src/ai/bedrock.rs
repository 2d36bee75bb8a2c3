use crate::ai::anthropic::{MessagesResponse, messages_body};
use crate::ai::client::{CompletionRequest, Defaults, LlmClient, http_client, non_empty, send_json};
use crate::ai::sigv4::{self, SigningRequest};
use crate::config::{AwsCredentials, ProviderConfig, ProviderKind};
use crate::error::{Error, Result};
use chrono::Utc;

pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const SERVICE: &str = "bedrock";

/// Anthropic models served through the Bedrock runtime `InvokeModel` endpoint.
#[derive(Debug)]
pub struct BedrockClient {
    http: reqwest::Client,
    credentials: AwsCredentials,
    region: String,
    endpoint: reqwest::Url,
    defaults: Defaults,
}

impl BedrockClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let credentials = config.require_aws_credentials()?.clone();
        let region = config.region.trim().to_string();
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", region));
        let endpoint = reqwest::Url::parse(&endpoint).map_err(|e| {
            Error::configuration(format!("invalid Bedrock endpoint {}: {}", endpoint, e))
        })?;

        Ok(Self {
            http: http_client(config)?,
            credentials,
            region,
            endpoint,
            defaults: Defaults::from_config(config),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Model ids carry `:` (e.g. `...-v1:0`), so the id is encoded as one path segment.
    fn invoke_path(model: &str) -> String {
        format!("/model/{}/invoke", sigv4::uri_encode(model, true))
    }

    fn host(&self) -> Result<String> {
        let host = self.endpoint.host_str().ok_or_else(|| {
            Error::configuration(format!("Bedrock endpoint has no host: {}", self.endpoint))
        })?;
        Ok(match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for BedrockClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Bedrock
    }

    fn default_model(&self) -> &str {
        &self.defaults.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let model = self.defaults.model(request);
        let mut body = messages_body(&self.defaults, request);
        body.model = None;
        body.anthropic_version = Some(BEDROCK_ANTHROPIC_VERSION);
        let payload = serde_json::to_vec(&body).map_err(|e| {
            Error::provider(ProviderKind::Bedrock, format!("failed to encode body: {}", e))
        })?;

        let path = Self::invoke_path(model);
        let now = Utc::now();
        let amz_date = sigv4::amz_date(&now);

        let mut headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("host".to_string(), self.host()?),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let authorization = sigv4::authorization(
            &SigningRequest {
                method: "POST",
                path: &path,
                query: "",
                headers: headers.clone(),
                payload: &payload,
            },
            &self.credentials,
            &self.region,
            SERVICE,
            &now,
        );

        let url = format!(
            "{}{}",
            self.endpoint.as_str().trim_end_matches('/'),
            path
        );
        let mut builder = self
            .http
            .post(&url)
            .header("authorization", authorization)
            .header("accept", "application/json");
        // reqwest derives Host from the URL itself.
        for (name, value) in headers.into_iter().filter(|(name, _)| name != "host") {
            builder = builder.header(name, value);
        }

        tracing::debug!(model, region = %self.region, "invoking Bedrock model");
        let response: MessagesResponse =
            send_json(ProviderKind::Bedrock, builder.body(payload)).await?;

        non_empty(ProviderKind::Bedrock, response.text())
    }
}

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BEDROCK_MODEL: &str = "global.anthropic.claude-sonnet-4-5-20250929-v1:0";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";

pub const DEFAULT_AWS_REGION: &str = "ap-southeast-1";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Bedrock,
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Bedrock,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Bedrock => "bedrock",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Bedrock => DEFAULT_BEDROCK_MODEL,
            ProviderKind::OpenAi => DEFAULT_OPENAI_MODEL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            ProviderKind::Gemini => DEFAULT_GEMINI_MODEL,
            ProviderKind::OpenRouter => DEFAULT_OPENROUTER_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "unsupported provider: {}. Supported providers are: bedrock, openai, anthropic, gemini, openrouter",
                    s
                ))
            })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

// Secrets stay out of debug output.
impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything the client factory needs, filled in by the calling application.
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub aws: Option<AwsCredentials>,
    pub region: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("aws", &self.aws)
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: None,
            api_key: None,
            aws: None,
            region: DEFAULT_AWS_REGION.to_string(),
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_aws_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.aws = Some(credentials);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_or_default(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    /// Returns the API key, or a configuration error naming the provider.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::configuration(format!(
                "{} API key not found. Pass it in the provider configuration",
                self.provider
            ))),
        }
    }

    pub fn require_aws_credentials(&self) -> Result<&AwsCredentials> {
        match &self.aws {
            Some(creds)
                if !creds.access_key_id.trim().is_empty()
                    && !creds.secret_access_key.trim().is_empty() =>
            {
                Ok(creds)
            }
            _ => Err(Error::configuration(
                "AWS credentials not found. Both an access key id and a secret access key are required",
            )),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::configuration(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(Error::configuration("max_tokens must be greater than zero"));
        }
        if self.provider == ProviderKind::Bedrock && self.region.trim().is_empty() {
            return Err(Error::configuration("AWS region must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("bedrock".parse::<ProviderKind>().unwrap(), ProviderKind::Bedrock);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" gemini ".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(
            "openrouter".parse::<ProviderKind>().unwrap(),
            ProviderKind::OpenRouter
        );
    }

    #[test]
    fn test_provider_kind_parse_unknown() {
        let err = "azure".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("azure"));
    }

    #[test]
    fn test_provider_kind_roundtrips_through_display() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_model_defaults() {
        let config = ProviderConfig::new(ProviderKind::Anthropic);
        assert_eq!(config.model_or_default(), DEFAULT_ANTHROPIC_MODEL);

        let config = ProviderConfig::new(ProviderKind::OpenAi).with_model("gpt-4o");
        assert_eq!(config.model_or_default(), "gpt-4o");

        let config = ProviderConfig::new(ProviderKind::Gemini).with_model("  ");
        assert_eq!(config.model_or_default(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_require_api_key() {
        let config = ProviderConfig::new(ProviderKind::OpenAi);
        assert!(matches!(
            config.require_api_key(),
            Err(Error::Configuration(_))
        ));

        let config = config.with_api_key("sk-test");
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_require_aws_credentials() {
        let credentials = AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: String::new(),
            session_token: None,
        };
        let config = ProviderConfig::new(ProviderKind::Bedrock).with_aws_credentials(credentials);
        assert!(config.require_aws_credentials().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ProviderConfig::new(ProviderKind::OpenAi).with_temperature(3.5);
        assert!(config.validate().is_err());

        let config = ProviderConfig::new(ProviderKind::OpenAi).with_max_tokens(0);
        assert!(config.validate().is_err());

        assert!(ProviderConfig::new(ProviderKind::OpenAi).validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig::new(ProviderKind::Bedrock)
            .with_api_key("sk-secret")
            .with_aws_credentials(AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "very-secret".to_string(),
                session_token: Some("token".to_string()),
            });
        let text = format!("{:?}", config);
        assert!(!text.contains("sk-secret"));
        assert!(!text.contains("very-secret"));
        assert!(text.contains("AKID"));
    }
}

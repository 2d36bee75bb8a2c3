use crate::config::ProviderKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing credentials, unknown provider identifier or an invalid setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote call failed: transport, status code, or an empty completion.
    #[error("{provider} provider error: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },

    /// The completion did not match the expected structured shape.
    #[error("failed to parse {context}: {message}\nRaw: {raw}")]
    Parse {
        context: String,
        message: String,
        raw: String,
    },

    #[error("{sentences} sentences but {outcomes} verification outcomes")]
    OutcomeMismatch { sentences: usize, outcomes: usize },
}

impl Error {
    pub fn provider(provider: ProviderKind, message: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}

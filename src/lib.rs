pub mod ai;
pub mod classify;
pub mod config;
pub mod csv;
pub mod error;
pub mod eval;
pub mod logger;
pub mod prompts;
pub mod questions;
pub mod report;
pub mod simplify;

// Re-exports for convenience
pub use ai::{CompletionRequest, LlmClient, Message, Role, build_client};
pub use classify::{ClassificationResult, Judged, Scores, classify, judge};
pub use config::{AwsCredentials, ProviderConfig, ProviderKind};
pub use error::{Error, Result};
pub use eval::{
    EvalMethod, EvalPair, evaluate, evaluate_batch, evaluate_direct, evaluate_limited, evaluate_with,
};
pub use questions::{VerificationQuestion, generate_question, verify_question};
pub use simplify::text_simplifier;

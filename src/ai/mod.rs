pub mod anthropic;
pub mod bedrock;
pub mod client;
pub mod gemini;
pub mod openai;
pub mod openrouter;
pub mod sigv4;
pub mod structured;

// Public API exports
pub use client::{CompletionRequest, LlmClient, Message, Role, build_client};
pub use structured::{clean_json_response, complete_json, parse_json};

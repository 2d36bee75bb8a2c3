use crate::ai::{CompletionRequest, LlmClient, Message, complete_json};
use crate::error::Result;
use crate::prompts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TextSimplify {
    simplified_sentences: Vec<String>,
}

/// Splits `text` into single-clause sentences, in source order.
///
/// Blank input yields no sentences without calling the model.
pub async fn text_simplifier(
    text: &str,
    model_name: &str,
    client: &dyn LlmClient,
) -> Result<Vec<String>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let request = CompletionRequest::new(vec![
        Message::system(prompts::SIMPLIFY_SYSTEM),
        Message::user(prompts::simplify_user(text)),
    ])
    .with_model(model_name)
    .json();

    let parsed: TextSimplify = complete_json(client, &request, "simplified sentences").await?;

    let sentences: Vec<String> = parsed
        .simplified_sentences
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    tracing::debug!(count = sentences.len(), "text simplified");
    Ok(sentences)
}

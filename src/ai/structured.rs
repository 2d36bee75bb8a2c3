use crate::ai::client::{CompletionRequest, LlmClient};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;

/// Strips markdown fences and any prose around the outermost JSON object.
pub fn clean_json_response(response: &str) -> String {
    let mut cleaned = response.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        // Drop the info string (```json) and the closing fence.
        let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        cleaned = rest.trim_end().strip_suffix("```").unwrap_or(rest).trim();
    }

    if let Some(start) = cleaned.find('{')
        && let Some(end) = cleaned.rfind('}')
        && start < end
    {
        cleaned = &cleaned[start..=end];
    }

    cleaned.trim().to_string()
}

/// Deserializes a completion into `T`; `context` names the expected shape in errors.
pub fn parse_json<T: DeserializeOwned>(raw: &str, context: &str) -> Result<T> {
    let cleaned = clean_json_response(raw);
    serde_json::from_str(&cleaned).map_err(|e| Error::Parse {
        context: context.to_string(),
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

pub async fn complete_json<T: DeserializeOwned>(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    context: &str,
) -> Result<T> {
    let raw = client.complete(request).await?;
    tracing::debug!(provider = %client.provider(), context, raw = %raw, "raw completion");
    parse_json(&raw, context)
}

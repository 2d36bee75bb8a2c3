use crate::ai::{CompletionRequest, LlmClient, Message, complete_json};
use crate::error::{Error, Result};
use crate::prompts;
use serde::{Deserialize, Serialize};

/// A yes/no question derived from exactly one simplified sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationQuestion {
    pub sentence: String,
    pub question: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    question: String,
}

#[derive(Debug, Deserialize)]
struct QuestionLabel {
    label: bool,
}

pub async fn generate_question(
    sentence: &str,
    model_name: &str,
    client: &dyn LlmClient,
) -> Result<VerificationQuestion> {
    let request = CompletionRequest::new(vec![
        Message::system(prompts::QUESTION_SYSTEM),
        Message::user(prompts::question_user(sentence)),
    ])
    .with_model(model_name)
    .json();

    let generated: GeneratedQuestion =
        complete_json(client, &request, "verification question").await?;

    let question = generated.question.trim().to_string();
    if question.is_empty() {
        return Err(Error::Parse {
            context: "verification question".to_string(),
            message: "question is empty".to_string(),
            raw: generated.question,
        });
    }

    Ok(VerificationQuestion {
        sentence: sentence.to_string(),
        question,
    })
}

/// True when `reference` supports answering the question with yes.
pub async fn verify_question(
    question: &VerificationQuestion,
    reference: &str,
    model_name: &str,
    client: &dyn LlmClient,
) -> Result<bool> {
    let request = CompletionRequest::new(vec![
        Message::system(prompts::VERIFY_SYSTEM),
        Message::user(prompts::verify_user(&question.question, reference)),
    ])
    .with_model(model_name)
    .json();

    let label: QuestionLabel = complete_json(client, &request, "verification label").await?;
    tracing::debug!(question = %question.question, supported = label.label, "question verified");
    Ok(label.label)
}

/// Question generation followed by verification against `reference`.
pub async fn check_sentence(
    sentence: &str,
    reference: &str,
    model_name: &str,
    client: &dyn LlmClient,
) -> Result<bool> {
    let question = generate_question(sentence, model_name, client).await?;
    verify_question(&question, reference, model_name, client).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::ScriptedClient;

    #[tokio::test]
    async fn test_generate_question_keeps_source_sentence() {
        let client = ScriptedClient::new().on(
            "SENTENCE: Birds can fly.",
            r#"{"question": " Can birds fly? "}"#,
        );
        let q = generate_question("Birds can fly.", "", &client).await.unwrap();
        assert_eq!(q.sentence, "Birds can fly.");
        assert_eq!(q.question, "Can birds fly?");
    }

    #[tokio::test]
    async fn test_generate_question_rejects_empty_question() {
        let client = ScriptedClient::new().then(r#"{"question": ""}"#);
        let err = generate_question("Birds can fly.", "", &client).await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[tokio::test]
    async fn test_verify_question_reads_label() {
        let client = ScriptedClient::new()
            .on("QUESTION: Can birds fly?", r#"{"label": true}"#)
            .on("QUESTION: Is the sky green?", r#"```json
{"label": false}
```"#);

        let yes = VerificationQuestion {
            sentence: "Birds can fly.".to_string(),
            question: "Can birds fly?".to_string(),
        };
        let no = VerificationQuestion {
            sentence: "The sky is green.".to_string(),
            question: "Is the sky green?".to_string(),
        };
        assert!(verify_question(&yes, "Birds can fly.", "", &client).await.unwrap());
        assert!(!verify_question(&no, "Birds can fly.", "", &client).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_sentence_passes_reference_text() {
        let client = ScriptedClient::new()
            .on("SENTENCE: Water is wet.", r#"{"question": "Is water wet?"}"#)
            .on("ANSWER_TEXT: Water is wet.", r#"{"label": true}"#);

        assert!(check_sentence("Water is wet.", "Water is wet.", "", &client).await.unwrap());

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let verify_user = &requests[1].messages[1].content;
        assert!(verify_user.contains("QUESTION: Is water wet?"));
    }
}

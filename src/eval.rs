use crate::ai::{CompletionRequest, LlmClient, Message, complete_json};
use crate::classify::{ClassificationResult, Judged, classify, judge};
use crate::error::{Error, Result};
use crate::prompts;
use crate::questions::check_sentence;
use crate::simplify::text_simplifier;
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Question/verification chains one `evaluate` call keeps in flight.
pub const DEFAULT_SENTENCE_CONCURRENCY: usize = 8;

/// One claim / ground-truth pair of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalPair {
    pub claim: String,
    pub ground_truth: String,
}

impl EvalPair {
    pub fn new(claim: impl Into<String>, ground_truth: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            ground_truth: ground_truth.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvalMethod {
    /// Simplify, question and verify every sentence in both directions.
    #[default]
    Questions,
    /// Ask one completion to label the sentences directly.
    Direct,
}

/// Compares `claim` against `ground_truth` sentence by sentence.
///
/// Both texts are simplified, every simplified sentence is turned into a yes/no
/// question and verified against the opposite text, and the outcomes are
/// bucketed into TP / FP / FN. Any failing call fails the whole evaluation.
pub async fn evaluate(
    claim: &str,
    ground_truth: &str,
    client: &dyn LlmClient,
    model_name: &str,
) -> Result<ClassificationResult> {
    evaluate_limited(
        claim,
        ground_truth,
        client,
        model_name,
        DEFAULT_SENTENCE_CONCURRENCY,
    )
    .await
}

/// [`evaluate`] with at most `max_in_flight` sentence chains running at once,
/// across both sides.
pub async fn evaluate_limited(
    claim: &str,
    ground_truth: &str,
    client: &dyn LlmClient,
    model_name: &str,
    max_in_flight: usize,
) -> Result<ClassificationResult> {
    tracing::info!(provider = %client.provider(), "evaluating claim");

    let (claim_sentences, truth_sentences) = futures::try_join!(
        text_simplifier(claim, model_name, client),
        text_simplifier(ground_truth, model_name, client),
    )?;

    // Claim sentences are checked against the ground truth and vice versa.
    let checks = claim_sentences
        .iter()
        .map(|s| (s, ground_truth))
        .chain(truth_sentences.iter().map(|s| (s, claim)));

    let mut outcomes: Vec<bool> = stream::iter(checks.map(|(sentence, reference)| {
        check_sentence(sentence, reference, model_name, client)
    }))
    .buffered(max_in_flight.max(1))
    .try_collect()
    .await?;

    let truth_outcomes = outcomes.split_off(claim_sentences.len().min(outcomes.len()));
    let claim_side: Vec<Judged> = judge(claim_sentences, outcomes)?;
    let truth_side: Vec<Judged> = judge(truth_sentences, truth_outcomes)?;

    let result = classify(&claim_side, &truth_side);
    tracing::info!(
        tp = result.true_positives.len(),
        fp = result.false_positives.len(),
        fn_ = result.false_negatives.len(),
        f1 = result.f1_score,
        "evaluation complete"
    );
    Ok(result)
}

#[derive(Debug, Deserialize)]
struct DirectLabels {
    #[serde(rename = "TP")]
    tp: Vec<String>,
    #[serde(rename = "FP")]
    fp: Vec<String>,
    #[serde(rename = "FN")]
    fn_: Vec<String>,
}

impl DirectLabels {
    /// A sentence may carry only one label.
    fn check_disjoint(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for bucket in [&self.tp, &self.fp, &self.fn_] {
            let distinct: HashSet<&str> = bucket.iter().map(|s| s.trim()).collect();
            for sentence in distinct {
                if !seen.insert(sentence) {
                    return Err(Error::Parse {
                        context: "sentence labels".to_string(),
                        message: format!("sentence labelled more than once: {}", sentence),
                        raw: format!("TP: {:?}, FP: {:?}, FN: {:?}", self.tp, self.fp, self.fn_),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Single-completion variant: the model labels the sentences of the raw
/// texts itself and the scores are computed locally from the returned buckets.
pub async fn evaluate_direct(
    claim: &str,
    ground_truth: &str,
    client: &dyn LlmClient,
    model_name: &str,
) -> Result<ClassificationResult> {
    let request = CompletionRequest::new(vec![
        Message::system(prompts::DIRECT_CLASSIFY_SYSTEM),
        Message::user(prompts::direct_classify_user(claim, ground_truth)),
    ])
    .with_model(model_name)
    .json();

    let labels: DirectLabels = complete_json(client, &request, "sentence labels").await?;
    labels.check_disjoint()?;
    Ok(ClassificationResult::from_buckets(labels.tp, labels.fp, labels.fn_))
}

pub async fn evaluate_with(
    method: EvalMethod,
    pair: &EvalPair,
    client: &dyn LlmClient,
    model_name: &str,
) -> Result<ClassificationResult> {
    match method {
        EvalMethod::Questions => {
            evaluate(&pair.claim, &pair.ground_truth, client, model_name).await
        }
        EvalMethod::Direct => {
            evaluate_direct(&pair.claim, &pair.ground_truth, client, model_name).await
        }
    }
}

/// Evaluates independent pairs with at most `concurrency` in flight.
///
/// Every pair gets its own result, in input order; one failing pair does not
/// affect the others.
pub async fn evaluate_batch(
    pairs: &[EvalPair],
    method: EvalMethod,
    client: &dyn LlmClient,
    model_name: &str,
    concurrency: usize,
) -> Vec<Result<ClassificationResult>> {
    stream::iter(pairs.iter().enumerate().map(|(index, pair)| async move {
        let result = evaluate_with(method, pair, client, model_name).await;
        if let Err(e) = &result {
            tracing::warn!(index, error = %e, "pair evaluation failed");
        }
        result
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}

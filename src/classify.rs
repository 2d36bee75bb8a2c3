//! Sentence bucketing and precision/recall/F1 scoring.
//!
//! Everything here is pure: the verification outcomes are gathered first, then
//! bucketed in one pass. Claim sentences become TP or FP depending on whether
//! the ground truth supports them. Ground-truth sentences the claim does not
//! support become FN; supported ones are already represented on the claim side
//! and are not counted again.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A simplified sentence with its verification outcome against the opposite text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judged {
    pub sentence: String,
    pub supported: bool,
}

/// Pairs sentences with their outcomes; the counts must match.
pub fn judge(sentences: Vec<String>, outcomes: Vec<bool>) -> Result<Vec<Judged>> {
    if sentences.len() != outcomes.len() {
        return Err(Error::OutcomeMismatch {
            sentences: sentences.len(),
            outcomes: outcomes.len(),
        });
    }

    Ok(sentences
        .into_iter()
        .zip(outcomes)
        .map(|(sentence, supported)| Judged {
            sentence,
            supported,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Scores {
    /// Empty denominators score 0.0.
    pub fn from_counts(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "TP")]
    pub true_positives: Vec<String>,
    #[serde(rename = "FP")]
    pub false_positives: Vec<String>,
    #[serde(rename = "FN")]
    pub false_negatives: Vec<String>,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl ClassificationResult {
    pub fn from_buckets(
        true_positives: Vec<String>,
        false_positives: Vec<String>,
        false_negatives: Vec<String>,
    ) -> Self {
        let scores = Scores::from_counts(
            true_positives.len(),
            false_positives.len(),
            false_negatives.len(),
        );

        Self {
            true_positives,
            false_positives,
            false_negatives,
            precision: scores.precision,
            recall: scores.recall,
            f1_score: scores.f1_score,
        }
    }

    pub fn scores(&self) -> Scores {
        Scores {
            precision: self.precision,
            recall: self.recall,
            f1_score: self.f1_score,
        }
    }
}

/// `claim_side` holds claim sentences judged against the ground truth,
/// `truth_side` ground-truth sentences judged against the claim.
pub fn classify(claim_side: &[Judged], truth_side: &[Judged]) -> ClassificationResult {
    let (supported, unsupported): (Vec<&Judged>, Vec<&Judged>) =
        claim_side.iter().partition(|j| j.supported);

    let sentences = |judged: Vec<&Judged>| -> Vec<String> {
        judged.into_iter().map(|j| j.sentence.clone()).collect()
    };

    let false_negatives = truth_side
        .iter()
        .filter(|j| !j.supported)
        .map(|j| j.sentence.clone())
        .collect();

    ClassificationResult::from_buckets(
        sentences(supported),
        sentences(unsupported),
        false_negatives,
    )
}

use crate::classify::ClassificationResult;
use crate::error::Result as EvalResult;
use crate::eval::EvalPair;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One JSON line of a batch report.
#[derive(Debug, Serialize)]
pub struct ReportEntry<'a> {
    pub index: usize,
    pub claim: &'a str,
    pub ground_truth: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a ClassificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub evaluated_at: String,
}

/// Mean scores over the pairs that evaluated successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub evaluated: usize,
    pub failed: usize,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_f1: f64,
}

impl Summary {
    pub fn from_results(results: &[EvalResult<ClassificationResult>]) -> Self {
        let ok: Vec<&ClassificationResult> =
            results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let failed = results.len() - ok.len();

        if ok.is_empty() {
            return Self {
                failed,
                ..Default::default()
            };
        }

        let n = ok.len() as f64;
        let mean = |f: fn(&ClassificationResult) -> f64| ok.iter().map(|r| f(r)).sum::<f64>() / n;

        Self {
            evaluated: ok.len(),
            failed,
            mean_precision: mean(|r| r.precision),
            mean_recall: mean(|r| r.recall),
            mean_f1: mean(|r| r.f1_score),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluated {} pair(s), {} failed | precision {:.3} | recall {:.3} | f1 {:.3}",
            self.evaluated, self.failed, self.mean_precision, self.mean_recall, self.mean_f1
        )
    }
}

/// Writes one JSON object per pair, in input order.
pub fn write_jsonl<W: Write>(
    mut out: W,
    pairs: &[EvalPair],
    results: &[EvalResult<ClassificationResult>],
) -> io::Result<()> {
    let evaluated_at = chrono::Utc::now().to_rfc3339();

    for (index, (pair, result)) in pairs.iter().zip(results).enumerate() {
        let entry = ReportEntry {
            index,
            claim: &pair.claim,
            ground_truth: &pair.ground_truth,
            result: result.as_ref().ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
            evaluated_at: evaluated_at.clone(),
        };
        serde_json::to_writer(&mut out, &entry)?;
        writeln!(out)?;
    }

    out.flush()
}

pub fn write_report(
    path: &Path,
    pairs: &[EvalPair],
    results: &[EvalResult<ClassificationResult>],
) -> io::Result<Summary> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = BufWriter::new(File::create(path)?);
    write_jsonl(file, pairs, results)?;
    Ok(Summary::from_results(results))
}

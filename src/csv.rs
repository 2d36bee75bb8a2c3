use crate::eval::EvalPair;
use ::csv::{ReaderBuilder, StringRecord};
use std::io::{self, Read};
use std::path::Path;

const HEADER: (&str, &str) = ("claim", "ground_truth");

/// Loads `claim,ground_truth` rows. Rows with a blank field and a leading
/// header row are skipped.
pub fn load_pairs(path: &Path) -> io::Result<Vec<EvalPair>> {
    let file = std::fs::File::open(path)?;
    read_pairs(file)
}

/// Reads whole RFC 4180 records, so quoted fields may span several lines.
pub fn read_pairs<R: Read>(input: R) -> io::Result<Vec<EvalPair>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut pairs = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(io::Error::other)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let Some((claim, ground_truth)) = split_record(&record) else {
            tracing::warn!(line, "skipping row without two fields");
            continue;
        };

        if index == 0
            && claim.eq_ignore_ascii_case(HEADER.0)
            && ground_truth.eq_ignore_ascii_case(HEADER.1)
        {
            continue;
        }

        if !claim.is_empty() && !ground_truth.is_empty() {
            pairs.push(EvalPair {
                claim,
                ground_truth,
            });
        }
    }

    Ok(pairs)
}

/// First field is the claim. Any unquoted commas after the separator belong
/// to the ground truth.
fn split_record(record: &StringRecord) -> Option<(String, String)> {
    if record.len() < 2 {
        return None;
    }
    let claim = record.get(0)?.trim().to_string();
    let ground_truth = record.iter().skip(1).collect::<Vec<_>>().join(",");
    Some((claim, ground_truth.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn read(content: &str) -> Vec<EvalPair> {
        read_pairs(content.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_simple_row() {
        let pairs = read("The sky is blue.,The sky is blue.\n");
        assert_eq!(pairs, vec![EvalPair::new("The sky is blue.", "The sky is blue.")]);
    }

    #[test]
    fn test_read_commas_in_quotes() {
        let pairs = read(
            "\"Feynman was born in 1918, in Malaysia\",\"Feynman was born in 1918, in America\"\n",
        );
        assert_eq!(pairs[0].claim, "Feynman was born in 1918, in Malaysia");
        assert_eq!(pairs[0].ground_truth, "Feynman was born in 1918, in America");
    }

    #[test]
    fn test_read_escaped_quotes() {
        let pairs = read("\"He said \"\"hi\"\".\",\"He said \"\"hello\"\".\"\n");
        assert_eq!(pairs[0].claim, "He said \"hi\".");
        assert_eq!(pairs[0].ground_truth, "He said \"hello\".");
    }

    #[test]
    fn test_read_unquoted_second_field_keeps_commas() {
        let pairs = read("A,B, C\n");
        assert_eq!(pairs, vec![EvalPair::new("A", "B, C")]);
    }

    #[test]
    fn test_read_rows_without_separator_are_skipped() {
        let pairs = read("just one field\nA,B\n");
        assert_eq!(pairs, vec![EvalPair::new("A", "B")]);
    }

    #[test]
    fn test_load_multiline_quoted_claim() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "claim,ground_truth").unwrap();
        writeln!(
            file,
            "\"Feynman was a physicist.\nHe won a Nobel Prize.\",Feynman won a Nobel Prize."
        )
        .unwrap();
        writeln!(file, "A,B").unwrap();

        let pairs = load_pairs(file.path()).unwrap();
        assert_eq!(
            pairs,
            vec![
                EvalPair::new(
                    "Feynman was a physicist.\nHe won a Nobel Prize.",
                    "Feynman won a Nobel Prize."
                ),
                EvalPair::new("A", "B"),
            ]
        );
    }

    #[test]
    fn test_load_pairs_skips_header_and_blank_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "claim,ground_truth").unwrap();
        writeln!(file, "Birds can fly.,Birds can fly. The ocean is salty.").unwrap();
        writeln!(file).unwrap();
        writeln!(file, ",missing claim").unwrap();
        writeln!(file, "no separator here").unwrap();
        writeln!(file, "\"Water boils at 100°C, at sea level.\",Water boils at 100°C.").unwrap();

        let pairs = load_pairs(file.path()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].claim, "Birds can fly.");
        assert_eq!(pairs[0].ground_truth, "Birds can fly. The ocean is salty.");
        assert_eq!(pairs[1].claim, "Water boils at 100°C, at sea level.");
    }

    #[test]
    fn test_load_pairs_keeps_first_row_when_not_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "A,B").unwrap();
        let pairs = load_pairs(file.path()).unwrap();
        assert_eq!(pairs, vec![EvalPair::new("A", "B")]);
    }

    #[test]
    fn test_load_pairs_missing_file() {
        assert!(load_pairs(Path::new("/definitely/not/here.csv")).is_err());
    }
}

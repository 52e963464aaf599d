use super::{content_lines, parse_error};
use crate::error::Result;
use crate::model::DissimilarityModel;

/// Parses genetic sequences, either FASTA (`>label` headers followed by sequence lines) or one
/// bare sequence per line.
pub fn parse_str(text: &str) -> Result<DissimilarityModel> {
    let mut labels: Vec<String> = Vec::new();
    let mut sequences: Vec<String> = Vec::new();
    let mut fasta = None;

    for (line, raw) in content_lines(text) {
        let raw = raw.trim();
        let header = raw.strip_prefix('>');
        match (fasta, header) {
            (None, Some(label)) | (Some(true), Some(label)) => {
                fasta = Some(true);
                labels.push(label.trim().to_string());
                sequences.push(String::new());
            }
            (None, None) | (Some(false), None) => {
                fasta = Some(false);
                sequences.push(raw.to_string());
            }
            (Some(true), None) => {
                if let Some(current) = sequences.last_mut() {
                    current.push_str(raw);
                }
            }
            (Some(false), Some(_)) => {
                return Err(parse_error(line, "FASTA header in a plain sequence list"));
            }
        }
    }

    let model = DissimilarityModel::from_sequences(sequences);
    if fasta == Some(true) {
        model.with_labels(labels)
    } else {
        Ok(model)
    }
}

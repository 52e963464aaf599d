use super::{content_lines, parse_error, split_fields};
use crate::error::Result;
use crate::model::DissimilarityModel;

/// Parses one numeric vector per line (comma or whitespace separated). All vectors must have
/// the same length.
pub fn parse_str(text: &str) -> Result<DissimilarityModel> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line, raw) in content_lines(text) {
        let row = split_fields(raw, None)
            .into_iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| parse_error(line, format!("not a number: {t:?}")))
            })
            .collect::<Result<Vec<f64>>>()?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(parse_error(
                    line,
                    format!("expected {} components, found {}", first.len(), row.len()),
                ));
            }
        }
        rows.push(row);
    }
    DissimilarityModel::from_vectors(rows)
}

use super::{content_lines, parse_error, split_fields};
use crate::error::Result;
use crate::metric::packed_len;
use crate::model::DissimilarityModel;

#[derive(Debug, Clone, Default)]
pub struct TriangleOptions {
    /// Each row starts with a label token.
    pub labels: bool,
    /// Field separator; commas and whitespace when unset.
    pub delimiter: Option<char>,
}

/// Parses a lower-triangular distance matrix. Row `i` (0-based) holds the `i + 1` distances
/// `d(0,i) .. d(i,i)`.
///
/// ```
/// let text = "0\n1 0\n2 3 0\n";
/// let model = shoal_core::load::triangle::parse_str(text, &Default::default())?;
/// assert_eq!(model.distance(2, 1)?, 3.0);
/// # Ok::<(), shoal_core::Error>(())
/// ```
pub fn parse_str(text: &str, options: &TriangleOptions) -> Result<DissimilarityModel> {
    let mut labels = Vec::new();
    let mut packed = Vec::new();
    let mut items = 0usize;
    for (line, raw) in content_lines(text) {
        let mut tokens = split_fields(raw, options.delimiter);
        if options.labels {
            if tokens.is_empty() {
                return Err(parse_error(line, "missing row label"));
            }
            labels.push(tokens.remove(0).to_string());
        }
        if tokens.len() != items + 1 {
            return Err(parse_error(
                line,
                format!(
                    "row {items} must hold {} distances, found {}",
                    items + 1,
                    tokens.len()
                ),
            ));
        }
        for token in tokens {
            let value: f64 = token
                .parse()
                .map_err(|_| parse_error(line, format!("not a number: {token:?}")))?;
            packed.push(value);
        }
        items += 1;
    }
    debug_assert_eq!(packed.len(), packed_len(items));

    let model = DissimilarityModel::from_lower_triangle(items, packed)?;
    if options.labels {
        model.with_labels(labels)
    } else {
        Ok(model)
    }
}

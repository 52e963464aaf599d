//! Text loaders producing a populated [`DissimilarityModel`].

pub mod sequences;
pub mod table;
pub mod triangle;
pub mod vectors;

use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::DissimilarityModel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Delimited text with a header row.
    #[default]
    Table,
    /// Packed lower-triangular distances, diagonal included.
    Triangle,
    /// Numeric vectors compared by cosine distance.
    Vectors,
    /// FASTA-style or line-per-sequence genetic data.
    Sequences,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "csv" => Ok(Self::Table),
            "triangle" | "lower-triangle" => Ok(Self::Triangle),
            "vectors" | "corpus" => Ok(Self::Vectors),
            "sequences" | "fasta" => Ok(Self::Sequences),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Parses `text` with default options for `format`.
pub fn parse_str(text: &str, format: Format) -> Result<DissimilarityModel> {
    match format {
        Format::Table => table::parse_str(text, &table::TableOptions::default()),
        Format::Triangle => triangle::parse_str(text, &triangle::TriangleOptions::default()),
        Format::Vectors => vectors::parse_str(text),
        Format::Sequences => sequences::parse_str(text),
    }
}

pub fn read_path(path: impl AsRef<Path>, format: Format) -> Result<DissimilarityModel> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, format)
}

/// Tokens that stand for a missing value.
pub(crate) fn is_missing(token: &str) -> bool {
    matches!(token, "" | "NaN" | "?")
}

/// Splits on `delimiter`, or on commas and whitespace when none is given. Surrounding quotes
/// are stripped.
pub(crate) fn split_fields(line: &str, delimiter: Option<char>) -> Vec<&str> {
    fn unquote(t: &str) -> &str {
        let t = t.trim();
        t.strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(t)
    }

    match delimiter {
        Some(d) => line.split(d).map(unquote).collect(),
        None => line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(unquote)
            .collect(),
    }
}

/// Non-blank, non-comment lines with their 1-based line numbers.
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
}

pub(crate) fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

use chrono::{NaiveDate, NaiveDateTime};

use super::{content_lines, is_missing, parse_error, split_fields};
use crate::builder::TableBuilder;
use crate::error::Result;
use crate::model::DissimilarityModel;
use crate::value::{ColumnType, Value};

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub delimiter: char,
    /// First column holds record labels rather than data.
    pub row_labels: bool,
    pub detect_sequences: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            row_labels: false,
            detect_sequences: true,
        }
    }
}

/// Parses delimited text with a header row, inferring each column's type from its values:
/// INTEGER, then DOUBLE, then DATE, falling back to STRING.
pub fn parse_str(text: &str, options: &TableOptions) -> Result<DissimilarityModel> {
    let mut lines = content_lines(text);
    let Some((header_line, header)) = lines.next() else {
        return Err(parse_error(1, "missing header row"));
    };
    let mut fields = split_fields(header, Some(options.delimiter));
    if options.row_labels {
        if fields.is_empty() {
            return Err(parse_error(header_line, "header has no label column"));
        }
        fields.remove(0);
    }
    let width = fields.len();

    let mut labels = Vec::new();
    let mut rows: Vec<(usize, Vec<&str>)> = Vec::new();
    for (line, raw) in lines {
        let mut tokens = split_fields(raw, Some(options.delimiter));
        if options.row_labels {
            if tokens.is_empty() {
                return Err(parse_error(line, "missing row label"));
            }
            labels.push(tokens.remove(0).to_string());
        }
        if tokens.len() != width {
            return Err(parse_error(
                line,
                format!("expected {width} fields, found {}", tokens.len()),
            ));
        }
        rows.push((line, tokens));
    }

    let kinds: Vec<ColumnType> = (0..width)
        .map(|c| infer_type(rows.iter().map(|(_, t)| t[c])))
        .collect();
    let mut builder = TableBuilder::new(fields.iter().map(|f| f.to_string()).zip(kinds.clone()))
        .map_err(|e| parse_error(header_line, e.to_string()))?
        .detect_sequences(options.detect_sequences);

    for (i, (line, tokens)) in rows.into_iter().enumerate() {
        let values: Vec<Value> = tokens
            .iter()
            .zip(&kinds)
            .map(|(t, &k)| parse_value(t, k))
            .collect();
        let pushed = match labels.get(i) {
            Some(label) => builder.push_labelled(label.clone(), values),
            None => builder.push_record(values),
        };
        pushed.map_err(|e| parse_error(line, e.to_string()))?;
    }
    Ok(builder.build())
}

fn infer_type<'a>(tokens: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut present = tokens.filter(|t| !is_missing(t));
    if present.clone().next().is_none() {
        return ColumnType::Double;
    }
    if present.clone().all(|t| t.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.clone().all(|t| t.parse::<f64>().is_ok()) {
        ColumnType::Double
    } else if present.all(|t| parse_date(t).is_some()) {
        ColumnType::Date
    } else {
        ColumnType::String
    }
}

fn parse_value(token: &str, kind: ColumnType) -> Value {
    if is_missing(token) {
        return Value::Missing;
    }
    let value = match kind {
        ColumnType::Integer => token.parse().ok().map(Value::Integer),
        ColumnType::Double => token.parse().ok().map(Value::Double),
        ColumnType::Date => parse_date(token).map(Value::Date),
        ColumnType::String => Some(Value::Str(token.to_string())),
    };
    value.unwrap_or(Value::Missing)
}

pub(crate) fn parse_date(token: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(token, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

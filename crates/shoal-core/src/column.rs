use chrono::NaiveDateTime;
use serde::Serialize;

use crate::value::{ColumnType, Value, date_to_millis};

/// Column-major storage for one typed column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnData {
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDateTime>>),
    Integer(Vec<Option<i64>>),
    Double(Vec<Option<f64>>),
}

impl ColumnData {
    pub(crate) fn with_capacity(kind: ColumnType, capacity: usize) -> Self {
        match kind {
            ColumnType::String => ColumnData::Text(Vec::with_capacity(capacity)),
            ColumnType::Date => ColumnData::Date(Vec::with_capacity(capacity)),
            ColumnType::Integer => ColumnData::Integer(Vec::with_capacity(capacity)),
            ColumnType::Double => ColumnData::Double(Vec::with_capacity(capacity)),
        }
    }

    pub(crate) fn kind(&self) -> ColumnType {
        match self {
            ColumnData::Text(_) => ColumnType::String,
            ColumnData::Date(_) => ColumnType::Date,
            ColumnData::Integer(_) => ColumnType::Integer,
            ColumnData::Double(_) => ColumnType::Double,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Double(v) => v.len(),
        }
    }

    /// Returns whether `value` can be stored in this column. Integers widen into DOUBLE columns.
    pub(crate) fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Missing)
                | (ColumnData::Text(_), Value::Str(_))
                | (ColumnData::Date(_), Value::Date(_))
                | (ColumnData::Integer(_), Value::Integer(_))
                | (ColumnData::Double(_), Value::Double(_) | Value::Integer(_))
        )
    }

    /// Appends a value previously checked with [`ColumnData::accepts`].
    pub(crate) fn push(&mut self, value: Value) {
        match (self, value) {
            (ColumnData::Text(v), Value::Str(s)) => v.push(Some(s)),
            (ColumnData::Date(v), Value::Date(d)) => v.push(Some(d)),
            (ColumnData::Integer(v), Value::Integer(i)) => v.push(Some(i)),
            (ColumnData::Double(v), Value::Double(d)) => v.push(Some(d)),
            (ColumnData::Double(v), Value::Integer(i)) => v.push(Some(i as f64)),
            (ColumnData::Text(v), _) => v.push(None),
            (ColumnData::Date(v), _) => v.push(None),
            (ColumnData::Integer(v), _) => v.push(None),
            (ColumnData::Double(v), _) => v.push(None),
        }
    }

    pub(crate) fn value(&self, row: usize) -> Value {
        let value = match self {
            ColumnData::Text(v) => v[row].clone().map(Value::Str),
            ColumnData::Date(v) => v[row].map(Value::Date),
            ColumnData::Integer(v) => v[row].map(Value::Integer),
            ColumnData::Double(v) => v[row].map(Value::Double),
        };
        value.unwrap_or(Value::Missing)
    }

    /// Numeric view of a cell; text cells and missing values have none.
    pub(crate) fn numeric(&self, row: usize) -> Option<f64> {
        match self {
            ColumnData::Text(_) => None,
            ColumnData::Date(v) => v[row].as_ref().map(date_to_millis),
            ColumnData::Integer(v) => v[row].map(|i| i as f64),
            ColumnData::Double(v) => v[row],
        }
    }

    pub(crate) fn text(&self, row: usize) -> Option<&str> {
        match self {
            ColumnData::Text(v) => v[row].as_deref(),
            _ => None,
        }
    }

    pub(crate) fn select_rows(&self, rows: &[usize]) -> Self {
        match self {
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&r| v[r].clone()).collect()),
            ColumnData::Date(v) => ColumnData::Date(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Integer(v) => ColumnData::Integer(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Double(v) => ColumnData::Double(rows.iter().map(|&r| v[r]).collect()),
        }
    }
}

/// Per-column statistics used for z-score scaling and reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub min: Value,
    pub max: Value,
    pub average: f64,
    pub sigma: f64,
    /// Number of non-missing values.
    pub present: usize,
}

impl ColumnStats {
    pub(crate) fn compute(data: &ColumnData) -> Self {
        let (min, max) = extremes(data);
        if let ColumnData::Text(v) = data {
            return Self {
                min,
                max,
                average: 0.0,
                sigma: 0.0,
                present: v.iter().flatten().count(),
            };
        }

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut present = 0usize;
        for v in (0..data.len()).filter_map(|row| data.numeric(row)) {
            sum += v;
            sum_sq += v * v;
            present += 1;
        }
        let (average, sigma) = if present == 0 {
            (0.0, 0.0)
        } else {
            let n = present as f64;
            let average = sum / n;
            (average, (sum_sq / n - average * average).max(0.0).sqrt())
        };
        Self {
            min,
            max,
            average,
            sigma,
            present,
        }
    }
}

fn extremes(data: &ColumnData) -> (Value, Value) {
    fn fold<T: Clone + PartialOrd>(values: &[Option<T>]) -> Option<(T, T)> {
        let mut out: Option<(T, T)> = None;
        for v in values.iter().flatten() {
            out = Some(match out {
                None => (v.clone(), v.clone()),
                Some((lo, hi)) => (
                    if *v < lo { v.clone() } else { lo },
                    if *v > hi { v.clone() } else { hi },
                ),
            });
        }
        out
    }

    let pair = match data {
        ColumnData::Text(v) => fold(v).map(|(a, b)| (Value::Str(a), Value::Str(b))),
        ColumnData::Date(v) => fold(v).map(|(a, b)| (Value::Date(a), Value::Date(b))),
        ColumnData::Integer(v) => fold(v).map(|(a, b)| (Value::Integer(a), Value::Integer(b))),
        ColumnData::Double(v) => fold(v).map(|(a, b)| (Value::Double(a), Value::Double(b))),
    };
    pair.unwrap_or((Value::Missing, Value::Missing))
}

/// Typed, column-major record table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub(crate) names: Vec<String>,
    pub(crate) columns: Vec<ColumnData>,
    pub(crate) stats: Vec<ColumnStats>,
    pub(crate) rows: usize,
}

impl Table {
    pub(crate) fn new(names: Vec<String>, columns: Vec<ColumnData>, rows: usize) -> Self {
        let stats = columns.iter().map(ColumnStats::compute).collect();
        Self {
            names,
            columns,
            stats,
            rows,
        }
    }

    /// Copies the selected rows and columns. Statistics are inherited from `self`.
    pub(crate) fn select(&self, rows: Option<&[usize]>, columns: Option<&[usize]>) -> Self {
        let all_columns: Vec<usize>;
        let columns = match columns {
            Some(c) => c,
            None => {
                all_columns = (0..self.columns.len()).collect();
                &all_columns
            }
        };
        let data = columns
            .iter()
            .map(|&c| match rows {
                Some(rows) => self.columns[c].select_rows(rows),
                None => self.columns[c].clone(),
            })
            .collect();
        Self {
            names: columns.iter().map(|&c| self.names[c].clone()).collect(),
            columns: data,
            stats: columns.iter().map(|&c| self.stats[c].clone()).collect(),
            rows: rows.map_or(self.rows, <[usize]>::len),
        }
    }
}

use indexmap::IndexSet;

use crate::column::{ColumnData, Table};
use crate::error::{Error, Result};
use crate::model::DissimilarityModel;
use crate::value::{ColumnType, Value};

/// Incrementally builds a typed-table collection.
///
/// ```
/// use shoal_core::{ColumnType, TableBuilder, Value};
///
/// let mut b = TableBuilder::new([("x", ColumnType::Double), ("y", ColumnType::Double)])?;
/// b.push_record([Value::Double(0.0), Value::Double(1.0)])?;
/// b.push_record([Value::Double(1.0), Value::Missing])?;
/// let model = b.build();
/// assert_eq!(model.len(), 2);
/// # Ok::<(), shoal_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    names: IndexSet<String>,
    columns: Vec<ColumnData>,
    labels: Vec<Option<String>>,
    rows: usize,
    detect_sequences: bool,
}

impl TableBuilder {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let mut names = IndexSet::new();
        let mut columns = Vec::new();
        for (name, kind) in fields {
            let name = name.into();
            if !names.insert(name.clone()) {
                return Err(Error::DuplicateField { name });
            }
            columns.push(ColumnData::with_capacity(kind, 0));
        }
        Ok(Self {
            names,
            columns,
            labels: Vec::new(),
            rows: 0,
            detect_sequences: true,
        })
    }

    /// Whether a single STRING column is treated as sequence data (Hamming distance).
    /// Enabled by default.
    pub fn detect_sequences(mut self, detect: bool) -> Self {
        self.detect_sequences = detect;
        self
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn push_record<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.push(None, values.into_iter().collect())
    }

    pub fn push_labelled<I>(&mut self, label: impl Into<String>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.push(Some(label.into()), values.into_iter().collect())
    }

    fn push(&mut self, label: Option<String>, values: Vec<Value>) -> Result<()> {
        let row = self.rows;
        if values.len() != self.columns.len() {
            return Err(Error::RecordWidth {
                row,
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        // Validate the whole record before storing any of it.
        for (column, (data, value)) in self.columns.iter().zip(&values).enumerate() {
            if !data.accepts(value) {
                return Err(Error::TypeMismatch {
                    row,
                    column,
                    field: self.names[column].clone(),
                    expected: data.kind(),
                    found: value.kind_name(),
                });
            }
        }
        for (data, value) in self.columns.iter_mut().zip(values) {
            data.push(value);
        }
        self.labels.push(label);
        self.rows += 1;
        Ok(())
    }

    pub fn build(self) -> DissimilarityModel {
        let has_labels = self.labels.iter().any(Option::is_some);
        let table = Table::new(self.names.into_iter().collect(), self.columns, self.rows);
        let mut model = DissimilarityModel::from_table(table, self.detect_sequences);
        if has_labels {
            model.labels = Some(
                self.labels
                    .into_iter()
                    .enumerate()
                    .map(|(row, l)| l.unwrap_or_else(|| row.to_string()))
                    .collect(),
            );
        }
        model
    }
}

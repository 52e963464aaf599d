use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::model::{DissimilarityModel, Storage};

impl DissimilarityModel {
    /// New collection holding the listed records, in the listed order.
    pub fn subset_rows(&self, rows: &[usize]) -> Result<Self> {
        self.subset(Some(rows), None)
    }

    /// New collection holding only the listed columns.
    pub fn subset_columns(&self, columns: &[usize]) -> Result<Self> {
        self.subset(None, Some(columns))
    }

    /// New collection restricted to `rows` and/or `columns` (`None` keeps everything).
    ///
    /// The parent is never modified. Column statistics and the metric are inherited rather than
    /// recomputed, so distances inside the subset match the parent's. A normalised parent yields
    /// a normalised child that can still be reverted.
    pub fn subset(&self, rows: Option<&[usize]>, columns: Option<&[usize]>) -> Result<Self> {
        if let Some(rows) = rows {
            for &r in rows {
                self.check_index(r)?;
            }
        }
        let columns = match columns {
            Some(_) if self.metric == Metric::LowerTriangle => None,
            Some(columns) => {
                let selection = self.select(columns)?;
                selection.columns().map(<[usize]>::to_vec)
            }
            None => None,
        };
        let columns = columns.as_deref();

        let storage = match &self.storage {
            Storage::Table(t) => Storage::Table(t.select(rows, columns)),
            Storage::Vectors(v) => Storage::Vectors(v.select(rows, columns)),
            Storage::Triangle(t) => {
                let all: Vec<usize>;
                let rows = match rows {
                    Some(r) => r,
                    None => {
                        all = (0..t.items).collect();
                        &all
                    }
                };
                Storage::Triangle(t.select(rows))
            }
        };

        let mut child = Self {
            storage,
            metric: self.metric,
            lanes: Default::default(),
            transform: self.transform,
            labels: self.labels.as_ref().map(|labels| match rows {
                Some(rows) => rows.iter().map(|&r| labels[r].clone()).collect(),
                None => labels.clone(),
            }),
            ids: match rows {
                Some(rows) => rows.iter().map(|&r| self.ids[r]).collect(),
                None => self.ids.clone(),
            },
            original: self.original.as_ref().map(|t| t.select(rows, columns)),
        };
        child.rebuild_lanes();
        tracing::debug!(
            records = child.len(),
            columns = child.column_count(),
            "derived sub-collection"
        );
        Ok(child)
    }
}

/// Counts of set bits in a binary collection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BinaryFrequencies {
    /// Records with a 1 in each column.
    pub per_column: Vec<usize>,
    /// Columns set to 1 in each record.
    pub per_record: Vec<usize>,
}

impl BinaryFrequencies {
    pub fn column_range(&self) -> Option<(usize, usize)> {
        min_max(&self.per_column)
    }

    pub fn record_range(&self) -> Option<(usize, usize)> {
        min_max(&self.per_record)
    }
}

fn min_max(values: &[usize]) -> Option<(usize, usize)> {
    Some((*values.iter().min()?, *values.iter().max()?))
}

impl DissimilarityModel {
    pub fn binary_frequencies(&self) -> Result<BinaryFrequencies> {
        let (Metric::Jaccard, Storage::Table(table)) = (self.metric, &self.storage) else {
            return Err(Error::NotBinary);
        };
        let mut per_column = vec![0usize; table.columns.len()];
        let mut per_record = vec![0usize; table.rows];
        for (c, data) in table.columns.iter().enumerate() {
            for (r, count) in per_record.iter_mut().enumerate() {
                if data.numeric(r).is_some_and(|v| v > 0.0) {
                    per_column[c] += 1;
                    *count += 1;
                }
            }
        }
        Ok(BinaryFrequencies {
            per_column,
            per_record,
        })
    }
}

use crate::column::{ColumnData, ColumnStats, Table};
use crate::error::{Error, Result};
use crate::model::{DissimilarityModel, Storage};
use crate::value::Value;

impl DissimilarityModel {
    /// Rescales every column into `[0, 1]` (`true`) or restores the values, types and extrema
    /// recorded before normalising (`false`).
    ///
    /// Only collections made entirely of INTEGER/DOUBLE columns can be normalised. For any
    /// other collection `set_normalised(true)` returns an error and leaves the data untouched.
    /// Repeating the current state is a no-op.
    pub fn set_normalised(&mut self, normalised: bool) -> Result<()> {
        if normalised == self.is_normalised() {
            return Ok(());
        }

        if !normalised {
            if let Some(original) = self.original.take() {
                self.storage = Storage::Table(original);
                self.rebuild_lanes();
                tracing::debug!(metric = %self.metric, "normalisation reverted");
            }
            return Ok(());
        }

        let Storage::Table(table) = &mut self.storage else {
            return Err(Error::NormalisationUnsupported {
                metric: self.metric.name(),
            });
        };
        for (column, data) in table.columns.iter().enumerate() {
            if !data.kind().is_numeric() {
                return Err(Error::NotNormalisable {
                    column,
                    field: table.names[column].clone(),
                    kind: data.kind(),
                });
            }
        }

        let scaled = normalised_table(table);
        self.original = Some(std::mem::replace(table, scaled));
        self.rebuild_lanes();
        tracing::debug!(metric = %self.metric, columns = self.column_count(), "normalised to [0, 1]");
        Ok(())
    }
}

fn normalised_table(table: &Table) -> Table {
    let mut columns = Vec::with_capacity(table.columns.len());
    let mut stats = Vec::with_capacity(table.columns.len());
    for (data, old) in table.columns.iter().zip(&table.stats) {
        let min = old.min.as_f64().unwrap_or(0.0);
        let max = old.max.as_f64().unwrap_or(0.0);
        let range = max - min;
        let values = (0..table.rows)
            .map(|row| {
                data.numeric(row).map(|v| {
                    if v == min || range == 0.0 {
                        0.0
                    } else {
                        (v - min) / range
                    }
                })
            })
            .collect();
        let column = ColumnData::Double(values);
        let mut s = ColumnStats::compute(&column);
        s.min = Value::Double(0.0);
        s.max = Value::Double(1.0);
        columns.push(column);
        stats.push(s);
    }
    Table {
        names: table.names.clone(),
        columns,
        stats,
        rows: table.rows,
    }
}

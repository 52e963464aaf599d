use serde::Serialize;

use crate::column::{ColumnData, ColumnStats, Table};
use crate::error::{Error, Result};
use crate::metric::{
    self, DistanceTransform, Lanes, Metric, Triangle, UNRELATED, VectorSet, packed_len,
};
use crate::selection::ColumnSelection;
use crate::value::{ColumnType, Value};

/// Characteristics of a collection, fixed when it is built (except `normalised`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    pub binary: bool,
    pub sequence: bool,
    pub text_corpus: bool,
    pub lower_triangular: bool,
    pub normalised: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Storage {
    Table(Table),
    Vectors(VectorSet),
    Triangle(Triangle),
}

/// A record collection together with the pairwise dissimilarity it defines.
///
/// The distance strategy ([`Metric`]) is selected once at construction and never changes.
/// Models are read-only apart from [`DissimilarityModel::set_normalised`]; sub-collections are
/// derived by copy (see `subset_*`).
#[derive(Debug, Clone)]
pub struct DissimilarityModel {
    pub(crate) storage: Storage,
    pub(crate) metric: Metric,
    pub(crate) lanes: Lanes,
    pub(crate) transform: DistanceTransform,
    pub(crate) labels: Option<Vec<String>>,
    pub(crate) ids: Vec<usize>,
    /// Table as it was before normalisation; restored by replacement.
    pub(crate) original: Option<Table>,
}

impl DissimilarityModel {
    pub(crate) fn from_parts(storage: Storage, metric: Metric) -> Self {
        let lanes = match &storage {
            Storage::Table(table) => Lanes::prepare(metric, table),
            Storage::Vectors(_) | Storage::Triangle(_) => Lanes::default(),
        };
        let len = match &storage {
            Storage::Table(t) => t.rows,
            Storage::Vectors(v) => v.rows.len(),
            Storage::Triangle(t) => t.items,
        };
        tracing::debug!(metric = %metric, records = len, "dissimilarity model built");
        Self {
            storage,
            metric,
            lanes,
            transform: DistanceTransform::Identity,
            labels: None,
            ids: (0..len).collect(),
            original: None,
        }
    }

    /// Chooses the metric for a typed table: a single STRING column is sequence data (when
    /// `detect_sequences` is set), numeric data holding only 0 and 1 is binary, anything else
    /// is mixed.
    pub(crate) fn from_table(table: Table, detect_sequences: bool) -> Self {
        let metric = if detect_sequences
            && table.columns.len() == 1
            && table.columns[0].kind() == ColumnType::String
        {
            Metric::Hamming
        } else if is_binary(&table) {
            Metric::Jaccard
        } else {
            Metric::Euclidean
        };
        Self::from_parts(Storage::Table(table), metric)
    }

    /// Raw numeric vectors (for example term-frequency vectors of a text corpus), compared by
    /// cosine distance.
    pub fn from_vectors(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dims = rows.first().map_or(0, Vec::len);
        let names = (0..dims).map(|d| format!("dim{d}")).collect();
        Self::from_named_vectors(names, rows)
    }

    pub fn from_named_vectors(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for (row, v) in rows.iter().enumerate() {
            if v.len() != names.len() {
                return Err(Error::VectorLength {
                    row,
                    expected: names.len(),
                    found: v.len(),
                });
            }
        }
        Ok(Self::from_parts(
            Storage::Vectors(VectorSet::new(names, rows)),
            Metric::Cosine,
        ))
    }

    /// Genetic sequences compared by normalised Hamming distance.
    pub fn from_sequences<I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Option<String>> = sequences.into_iter().map(|s| Some(s.into())).collect();
        let rows = values.len();
        let table = Table::new(vec!["sequence".to_string()], vec![ColumnData::Text(values)], rows);
        Self::from_parts(Storage::Table(table), Metric::Hamming)
    }

    /// Precomputed distances for `items` items, packed row by row with the diagonal:
    /// `d(0,0), d(0,1), d(1,1), d(0,2), d(1,2), d(2,2), ...`.
    pub fn from_lower_triangle(items: usize, packed: Vec<f64>) -> Result<Self> {
        let expected = packed_len(items);
        if packed.len() != expected {
            return Err(Error::TriangleLength {
                items,
                expected,
                found: packed.len(),
            });
        }
        let triangle = Triangle { items, packed };
        for j in 0..items {
            for i in 0..=j {
                let value = triangle.get(i, j);
                if !value.is_finite() {
                    return Err(Error::NonFiniteDissimilarity {
                        left: i,
                        right: j,
                        value,
                    });
                }
            }
        }
        Ok(Self::from_parts(
            Storage::Triangle(triangle),
            Metric::LowerTriangle,
        ))
    }

    /// Packs `f(i, j)` for every pair `i < j` into a lower-triangular model with a zero diagonal.
    pub fn from_fn(items: usize, mut f: impl FnMut(usize, usize) -> f64) -> Result<Self> {
        let mut packed = vec![0.0; packed_len(items)];
        for j in 0..items {
            for i in 0..j {
                packed[metric::packed_index(i, j)] = f(i, j);
            }
        }
        Self::from_lower_triangle(items, packed)
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.len() {
            return Err(Error::LabelCount {
                expected: self.len(),
                found: labels.len(),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn with_transform(mut self, transform: DistanceTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn transform(&self) -> DistanceTransform {
        self.transform
    }

    pub fn flags(&self) -> Flags {
        Flags {
            binary: self.metric == Metric::Jaccard,
            sequence: self.metric == Metric::Hamming,
            text_corpus: self.metric == Metric::Cosine,
            lower_triangular: self.metric == Metric::LowerTriangle,
            normalised: self.original.is_some(),
        }
    }

    pub fn is_normalised(&self) -> bool {
        self.original.is_some()
    }

    /// Distance used for pairs without any comparable data.
    pub fn unrelated_distance(&self) -> f64 {
        UNRELATED
    }

    pub fn column_count(&self) -> usize {
        match &self.storage {
            Storage::Table(t) => t.columns.len(),
            Storage::Vectors(v) => v.dims(),
            Storage::Triangle(_) => 0,
        }
    }

    pub fn fields(&self) -> &[String] {
        match &self.storage {
            Storage::Table(t) => &t.names,
            Storage::Vectors(v) => &v.names,
            Storage::Triangle(_) => &[],
        }
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        match &self.storage {
            Storage::Table(t) => t.columns.iter().map(ColumnData::kind).collect(),
            Storage::Vectors(v) => vec![ColumnType::Double; v.dims()],
            Storage::Triangle(_) => Vec::new(),
        }
    }

    pub fn column_stats(&self) -> &[ColumnStats] {
        match &self.storage {
            Storage::Table(t) => &t.stats,
            Storage::Vectors(v) => &v.stats,
            Storage::Triangle(_) => &[],
        }
    }

    pub fn stats(&self, column: usize) -> Result<&ColumnStats> {
        self.column_stats()
            .get(column)
            .ok_or_else(|| Error::ColumnOutOfRange {
                index: column,
                len: self.column_count(),
            })
    }

    pub fn min(&self, column: usize) -> Result<&Value> {
        self.stats(column).map(|s| &s.min)
    }

    pub fn max(&self, column: usize) -> Result<&Value> {
        self.stats(column).map(|s| &s.max)
    }

    pub fn average(&self) -> Vec<f64> {
        self.column_stats().iter().map(|s| s.average).collect()
    }

    pub fn sigma(&self) -> Vec<f64> {
        self.column_stats().iter().map(|s| s.sigma).collect()
    }

    pub fn value(&self, row: usize, column: usize) -> Result<Value> {
        self.check_index(row)?;
        if column >= self.column_count() {
            return Err(Error::ColumnOutOfRange {
                index: column,
                len: self.column_count(),
            });
        }
        Ok(match &self.storage {
            Storage::Table(t) => t.columns[column].value(row),
            Storage::Vectors(v) => Value::Double(v.rows[row][column]),
            Storage::Triangle(_) => Value::Missing,
        })
    }

    /// The numeric vector of a record in a cosine collection.
    pub fn vector(&self, row: usize) -> Option<&[f64]> {
        match &self.storage {
            Storage::Vectors(v) => v.rows.get(row).map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn label(&self, row: usize) -> Option<&str> {
        self.labels.as_ref()?.get(row).map(String::as_str)
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Record ids relative to the collection this one was derived from (`0..len` for a
    /// collection built directly).
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Validates a list of active columns. Indices are sorted and deduplicated.
    ///
    /// Lower-triangular collections have no columns to restrict, so every selection resolves to
    /// all columns there.
    pub fn select(&self, columns: &[usize]) -> Result<ColumnSelection> {
        if self.metric == Metric::LowerTriangle {
            return Ok(ColumnSelection::all());
        }
        if columns.is_empty() {
            return Err(Error::EmptySelection);
        }
        let width = self.column_count();
        let mut sorted = columns.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&bad) = sorted.iter().find(|&&c| c >= width) {
            return Err(Error::ColumnOutOfRange {
                index: bad,
                len: width,
            });
        }
        Ok(ColumnSelection::only(sorted, width))
    }

    /// Dissimilarity between records `i` and `j` over all columns.
    pub fn distance(&self, i: usize, j: usize) -> Result<f64> {
        self.distance_with(i, j, &ColumnSelection::all())
    }

    /// Dissimilarity between records `i` and `j` over the listed columns.
    pub fn distance_on(&self, i: usize, j: usize, columns: &[usize]) -> Result<f64> {
        let selection = self.select(columns)?;
        self.distance_with(i, j, &selection)
    }

    /// Dissimilarity between records `i` and `j` over a validated selection.
    pub fn distance_with(&self, i: usize, j: usize, selection: &ColumnSelection) -> Result<f64> {
        self.check_index(i)?;
        self.check_index(j)?;
        let raw = match &self.storage {
            Storage::Triangle(t) => t.get(i, j),
            Storage::Vectors(v) => metric::cosine(v, i, j, selection),
            Storage::Table(t) => match self.metric {
                Metric::Hamming => {
                    metric::hamming(t.columns[0].text(i), t.columns[0].text(j), i, j)?
                }
                Metric::Jaccard => self.lanes.jaccard(i, j, selection),
                _ => self.lanes.euclidean(i, j, selection, t.columns.len()),
            },
        };
        Ok(self.transform.apply(raw))
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn rebuild_lanes(&mut self) {
        self.lanes = match &self.storage {
            Storage::Table(table) => Lanes::prepare(self.metric, table),
            Storage::Vectors(_) | Storage::Triangle(_) => Lanes::default(),
        };
    }
}

/// Every column INTEGER or DOUBLE and every present value 0 or 1.
fn is_binary(table: &Table) -> bool {
    !table.columns.is_empty()
        && table.columns.iter().all(|c| match c {
            ColumnData::Integer(values) => values.iter().flatten().all(|&v| v == 0 || v == 1),
            ColumnData::Double(values) => values.iter().flatten().all(|&v| v == 0.0 || v == 1.0),
            _ => false,
        })
}

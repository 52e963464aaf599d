//! Distance strategies. Exactly one [`Metric`] is chosen when a collection is built; the
//! per-column work it needs is prepared once into [`Lanes`] so the pairwise loop never inspects
//! value types.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnData, ColumnStats, Table};
use crate::error::{Error, Result};
use crate::selection::ColumnSelection;

/// Distance reported for pairs that share nothing comparable ("unrelated").
pub const UNRELATED: f64 = 5.0;

/// Number of standard deviations spanned by one unit after z-score scaling.
pub const STANDARD_DEVS: f64 = 2.0;

/// Multiplier applied for every string column on which two records agree.
pub const ORD_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Lookup in a precomputed packed lower-triangular array.
    LowerTriangle,
    /// Normalised Hamming distance over equal-length sequences.
    Hamming,
    /// `1 - cosine similarity` over numeric vectors (text corpora).
    Cosine,
    /// `1 - Jaccard` over binary columns.
    Jaccard,
    /// Z-scored Euclidean distance over mixed columns.
    Euclidean,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::LowerTriangle => "lower-triangle",
            Metric::Hamming => "hamming",
            Metric::Cosine => "cosine",
            Metric::Jaccard => "jaccard",
            Metric::Euclidean => "euclidean",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional post-processing of every computed distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceTransform {
    #[default]
    Identity,
    /// `exp(1.4 d) - 1`: a monotone distortion used to check that non-metric layouts recover the
    /// same configuration as the untransformed data.
    MonotonicGaussian,
}

impl DistanceTransform {
    #[inline]
    pub fn apply(self, d: f64) -> f64 {
        match self {
            DistanceTransform::Identity => d,
            DistanceTransform::MonotonicGaussian => (1.4 * d).exp() - 1.0,
        }
    }
}

/// Index into a packed lower-triangular array (diagonal included) for the unordered pair `(i, j)`.
#[inline]
pub fn packed_index(i: usize, j: usize) -> usize {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    ((lo + 1) + ((hi + 1) * hi) / 2) - 1
}

/// Number of packed values for `items` items, diagonal included.
#[inline]
pub fn packed_len(items: usize) -> usize {
    items * (items + 1) / 2
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Triangle {
    pub(crate) items: usize,
    pub(crate) packed: Vec<f64>,
}

impl Triangle {
    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        self.packed[packed_index(i, j)]
    }

    pub(crate) fn select(&self, rows: &[usize]) -> Self {
        let mut packed = vec![0.0; packed_len(rows.len())];
        for (b, &rb) in rows.iter().enumerate() {
            for (a, &ra) in rows.iter().enumerate().take(b + 1) {
                packed[packed_index(a, b)] = self.get(ra, rb);
            }
        }
        Self {
            items: rows.len(),
            packed,
        }
    }
}

/// Row-major numeric vectors (one component per column).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VectorSet {
    pub(crate) names: Vec<String>,
    pub(crate) rows: Vec<Vec<f64>>,
    pub(crate) stats: Vec<ColumnStats>,
}

impl VectorSet {
    pub(crate) fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        let stats = (0..names.len())
            .map(|c| {
                let column = ColumnData::Double(rows.iter().map(|r| Some(r[c])).collect());
                ColumnStats::compute(&column)
            })
            .collect();
        Self { names, rows, stats }
    }

    pub(crate) fn dims(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn select(&self, rows: Option<&[usize]>, columns: Option<&[usize]>) -> Self {
        let columns: Vec<usize> = match columns {
            Some(c) => c.to_vec(),
            None => (0..self.dims()).collect(),
        };
        let pick = |r: &Vec<f64>| columns.iter().map(|&c| r[c]).collect::<Vec<f64>>();
        let data = match rows {
            Some(rows) => rows.iter().map(|&r| pick(&self.rows[r])).collect(),
            None => self.rows.iter().map(pick).collect(),
        };
        Self {
            names: columns.iter().map(|&c| self.names[c].clone()).collect(),
            rows: data,
            stats: columns.iter().map(|&c| self.stats[c].clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct NumericLane {
    column: usize,
    scaled: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct OrdinalLane {
    column: usize,
    symbols: Vec<Option<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct BinaryLane {
    column: usize,
    bits: Vec<Option<bool>>,
}

/// Per-column data prepared for one metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Lanes {
    numeric: Vec<NumericLane>,
    ordinal: Vec<OrdinalLane>,
    binary: Vec<BinaryLane>,
}

impl Lanes {
    pub(crate) fn prepare(metric: Metric, table: &Table) -> Self {
        match metric {
            Metric::Euclidean => Self::euclidean_lanes(table),
            Metric::Jaccard => Self::binary_lanes(table),
            Metric::LowerTriangle | Metric::Hamming | Metric::Cosine => Self::default(),
        }
    }

    fn euclidean_lanes(table: &Table) -> Self {
        let mut lanes = Self::default();
        for (column, (data, stats)) in table.columns.iter().zip(&table.stats).enumerate() {
            if let ColumnData::Text(values) = data {
                lanes.ordinal.push(OrdinalLane {
                    column,
                    symbols: intern(values),
                });
                continue;
            }
            // Columns without spread stay unscaled.
            let scale = (stats.sigma != 0.0 && !stats.sigma.is_nan())
                .then(|| STANDARD_DEVS * stats.sigma);
            let scaled = (0..table.rows)
                .map(|row| {
                    data.numeric(row).map(|v| match scale {
                        Some(s) => (v - stats.average) / s,
                        None => v,
                    })
                })
                .collect();
            lanes.numeric.push(NumericLane { column, scaled });
        }
        lanes
    }

    fn binary_lanes(table: &Table) -> Self {
        let binary = table
            .columns
            .iter()
            .enumerate()
            .map(|(column, data)| BinaryLane {
                column,
                bits: (0..table.rows)
                    .map(|row| data.numeric(row).map(|v| v != 0.0))
                    .collect(),
            })
            .collect();
        Self {
            binary,
            ..Self::default()
        }
    }

    pub(crate) fn euclidean(
        &self,
        i: usize,
        j: usize,
        selection: &ColumnSelection,
        total_columns: usize,
    ) -> f64 {
        let mut sum = 0.0;
        let mut ord = 1.0;
        let mut compared = 0usize;

        for lane in &self.numeric {
            if !selection.includes(lane.column) {
                continue;
            }
            if let (Some(a), Some(b)) = (lane.scaled[i], lane.scaled[j]) {
                let diff = a - b;
                sum += diff * diff;
                compared += 1;
            }
        }
        for lane in &self.ordinal {
            if !selection.includes(lane.column) {
                continue;
            }
            if let (Some(a), Some(b)) = (lane.symbols[i], lane.symbols[j]) {
                if a == b {
                    ord *= ORD_FACTOR;
                }
                compared += 1;
            }
        }

        if compared == 0 {
            return UNRELATED;
        }
        sum.sqrt() * ord * (total_columns as f64 / compared as f64)
    }

    pub(crate) fn jaccard(&self, i: usize, j: usize, selection: &ColumnSelection) -> f64 {
        let (mut a, mut b, mut c) = (0usize, 0usize, 0usize);
        for lane in &self.binary {
            if !selection.includes(lane.column) {
                continue;
            }
            match (lane.bits[i], lane.bits[j]) {
                (Some(true), Some(true)) => a += 1,
                (Some(true), Some(false)) => b += 1,
                (Some(false), Some(true)) => c += 1,
                _ => {}
            }
        }
        if a == 0 {
            return UNRELATED;
        }
        1.0 - a as f64 / (a + b + c) as f64
    }
}

fn intern(values: &[Option<String>]) -> Vec<Option<u32>> {
    let mut table: FxHashMap<&str, u32> = FxHashMap::default();
    values
        .iter()
        .map(|v| {
            v.as_deref().map(|s| {
                let next = table.len() as u32;
                *table.entry(s).or_insert(next)
            })
        })
        .collect()
}

pub(crate) fn cosine(vectors: &VectorSet, i: usize, j: usize, selection: &ColumnSelection) -> f64 {
    if i == j {
        return 0.0;
    }
    let (left, right) = (&vectors.rows[i], &vectors.rows[j]);
    let mut dot = 0.0;
    let mut left_sq = 0.0;
    let mut right_sq = 0.0;
    for (c, (&l, &r)) in left.iter().zip(right).enumerate() {
        if !selection.includes(c) {
            continue;
        }
        dot += l * r;
        left_sq += l * l;
        right_sq += r * r;
    }
    match (left_sq == 0.0, right_sq == 0.0) {
        (true, true) => 0.0,
        (true, false) | (false, true) => UNRELATED,
        (false, false) => (1.0 - dot / (left_sq.sqrt() * right_sq.sqrt())).max(0.0),
    }
}

pub(crate) fn hamming(
    left: Option<&str>,
    right: Option<&str>,
    i: usize,
    j: usize,
) -> Result<f64> {
    let (Some(left), Some(right)) = (left, right) else {
        return Ok(UNRELATED);
    };
    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len != right_len {
        return Err(Error::SequenceLengthMismatch {
            left: i,
            right: j,
            left_len,
            right_len,
        });
    }
    if left_len == 0 {
        return Ok(0.0);
    }
    let mismatches = left
        .chars()
        .zip(right.chars())
        .filter(|(a, b)| a != b)
        .count();
    Ok(mismatches as f64 / left_len as f64)
}

#[cfg(test)]
mod tests {
    use super::{packed_index, packed_len};

    #[test]
    fn packed_index_walks_rows_of_the_lower_triangle() {
        // Row-major with the diagonal: (0,0) (0,1) (1,1) (0,2) (1,2) (2,2) ...
        assert_eq!(packed_index(0, 0), 0);
        assert_eq!(packed_index(0, 1), 1);
        assert_eq!(packed_index(1, 1), 2);
        assert_eq!(packed_index(0, 2), 3);
        assert_eq!(packed_index(1, 2), 4);
        assert_eq!(packed_index(2, 2), 5);
        assert_eq!(packed_index(2, 1), packed_index(1, 2));
        assert_eq!(packed_len(3), 6);
    }

    #[test]
    fn packed_index_is_dense() {
        let n = 17;
        let mut seen = vec![false; packed_len(n)];
        for j in 0..n {
            for i in 0..=j {
                let idx = packed_index(i, j);
                assert!(!seen[idx], "duplicate slot for ({i}, {j})");
                seen[idx] = true;
            }
        }
        assert!(seen.into_iter().all(|s| s));
    }
}

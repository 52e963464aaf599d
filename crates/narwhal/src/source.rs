use crate::error::{Error, Result};
use crate::geom::Point;

pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pairwise "desired distance" oracle driving a layout.
///
/// Implementations must be symmetric (`dissimilarity(i, j) == dissimilarity(j, i)`) and
/// deterministic for the lifetime of a run.
pub trait Dissimilarity: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dissimilarity(&self, i: usize, j: usize) -> std::result::Result<f64, SourceError>;
}

/// Looks up a dissimilarity, rejecting errors and non-finite values.
pub(crate) fn desired(source: &dyn Dissimilarity, i: usize, j: usize) -> Result<f64> {
    let value = source
        .dissimilarity(i, j)
        .map_err(|source| Error::Source { i, j, source })?;
    if !value.is_finite() {
        return Err(Error::NonFiniteDissimilarity { i, j, value });
    }
    Ok(value)
}

/// Dense symmetric dissimilarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds the matrix from `f(i, j)` evaluated for `i < j`; the diagonal is zero.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = f(i, j);
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }
        Self { n, values }
    }

    /// Euclidean distances between `points`.
    pub fn from_points(points: &[Point]) -> Self {
        Self::from_fn(points.len(), |i, j| points[i].distance(points[j]))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}

impl Dissimilarity for DistanceMatrix {
    fn len(&self) -> usize {
        self.n
    }

    fn dissimilarity(&self, i: usize, j: usize) -> std::result::Result<f64, SourceError> {
        if i >= self.n || j >= self.n {
            return Err(format!("pair ({i}, {j}) outside a {n}x{n} matrix", n = self.n).into());
        }
        Ok(self.get(i, j))
    }
}

/// Every pair `i < j` of a source, fetched once.
#[derive(Debug, Clone)]
pub(crate) struct Condensed {
    n: usize,
    values: Vec<f64>,
}

impl Condensed {
    pub(crate) fn fetch(source: &dyn Dissimilarity) -> Result<Self> {
        let n = source.len();
        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                values.push(desired(source, i, j)?);
            }
        }
        Ok(Self { n, values })
    }

    pub(crate) fn n(&self) -> usize {
        self.n
    }

    /// Position of pair `i < j` in [`Condensed::values`].
    #[inline]
    pub(crate) fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.n);
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.values[self.index(i, j)],
            std::cmp::Ordering::Greater => self.values[self.index(j, i)],
        }
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Pairs in storage order.
    pub(crate) fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.n;
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
    }
}

impl Dissimilarity for Condensed {
    fn len(&self) -> usize {
        self.n
    }

    fn dissimilarity(&self, i: usize, j: usize) -> std::result::Result<f64, SourceError> {
        Ok(self.get(i, j))
    }
}

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::Point;
use crate::rng::XorShift64Star;
use crate::source::{Condensed, Dissimilarity};
use crate::state::LayoutState;

const EIGEN_TOLERANCE: f64 = 1e-9;

/// Where a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialLayout {
    /// Uniform in `[-0.5, 0.5)` on both axes.
    Random { seed: u64 },
    /// Torgerson classical scaling of the dissimilarities; random (with `seed`) if the data has
    /// fewer than two positive dimensions.
    Classical { seed: u64 },
    Explicit(Vec<Point>),
    /// Continue from a stopped run, velocities included.
    Resume(LayoutState),
}

impl Default for InitialLayout {
    fn default() -> Self {
        InitialLayout::Random { seed: 0 }
    }
}

impl InitialLayout {
    /// Builds the starting state for `n` items. `pairs` are reused by classical scaling when the
    /// caller already fetched them.
    pub(crate) fn materialise(
        &self,
        source: &dyn Dissimilarity,
        pairs: Option<&Condensed>,
    ) -> Result<LayoutState> {
        let n = source.len();
        let check = |found: usize| {
            if found == n {
                Ok(())
            } else {
                Err(Error::InitialLayoutSize { expected: n, found })
            }
        };
        match self {
            InitialLayout::Random { seed } => Ok(LayoutState::at_rest(random(n, *seed))),
            InitialLayout::Classical { seed } => {
                let fetched;
                let pairs = match pairs {
                    Some(p) => p,
                    None => {
                        fetched = Condensed::fetch(source)?;
                        &fetched
                    }
                };
                let positions = classical(pairs).unwrap_or_else(|| {
                    tracing::warn!(items = n, "classical scaling degenerate; using random start");
                    random(n, *seed)
                });
                Ok(LayoutState::at_rest(positions))
            }
            InitialLayout::Explicit(points) => {
                check(points.len())?;
                Ok(LayoutState::at_rest(points.clone()))
            }
            InitialLayout::Resume(state) => {
                check(state.positions.len())?;
                check(state.velocities.len())?;
                Ok(state.clone())
            }
        }
    }
}

pub(crate) fn random(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = XorShift64Star::new(seed);
    (0..n)
        .map(|_| {
            let x = rng.next_f64_unit() - 0.5;
            let y = rng.next_f64_unit() - 0.5;
            Point::new(x, y)
        })
        .collect()
}

/// Top two principal coordinates of the double-centred squared dissimilarities.
pub(crate) fn classical(pairs: &Condensed) -> Option<Vec<Point>> {
    let n = pairs.n();
    if n < 3 {
        return None;
    }

    let mut b = DMatrix::<f64>::zeros(n, n);
    for (k, (i, j)) in pairs.pairs().enumerate() {
        let d = pairs.values()[k];
        b[(i, j)] = d * d;
        b[(j, i)] = d * d;
    }
    let row_means: Vec<f64> = (0..n).map(|i| b.row(i).sum() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;
    for i in 0..n {
        for j in 0..n {
            b[(i, j)] = -0.5 * (b[(i, j)] - row_means[i] - row_means[j] + grand_mean);
        }
    }

    let eigen = nalgebra::linalg::SymmetricEigen::new(b);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &c| eigen.eigenvalues[c].total_cmp(&eigen.eigenvalues[a]));

    let largest = eigen.eigenvalues[order[0]];
    if !(largest.is_finite() && largest > 0.0) {
        return None;
    }
    let axes: Vec<(usize, f64)> = order
        .iter()
        .take(2)
        .map(|&k| (k, eigen.eigenvalues[k]))
        .filter(|&(_, lambda)| lambda > EIGEN_TOLERANCE * largest)
        .collect();
    if axes.len() < 2 {
        return None;
    }

    let coord = |axis: (usize, f64), i: usize| eigen.eigenvectors[(i, axis.0)] * axis.1.sqrt();
    let points: Vec<Point> = (0..n)
        .map(|i| Point::new(coord(axes[0], i), coord(axes[1], i)))
        .collect();
    points.iter().all(|p| p.is_finite()).then_some(points)
}

#[cfg(test)]
mod tests {
    use super::{InitialLayout, classical, random};
    use crate::geom::Point;
    use crate::source::{Condensed, DistanceMatrix};

    #[test]
    fn random_start_is_seeded_and_bounded() {
        let a = random(20, 7);
        assert_eq!(a, random(20, 7));
        assert_ne!(a, random(20, 8));
        assert!(a.iter().all(|p| (-0.5..0.5).contains(&p.x) && (-0.5..0.5).contains(&p.y)));
    }

    #[test]
    fn classical_scaling_recovers_planar_distances() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 1.0),
            Point::new(-1.0, 2.0),
            Point::new(0.5, -2.0),
        ];
        let m = DistanceMatrix::from_points(&pts);
        let pairs = Condensed::fetch(&m).unwrap();
        let out = classical(&pairs).unwrap();
        for i in 0..pts.len() {
            for j in 0..pts.len() {
                let want = pts[i].distance(pts[j]);
                let got = out[i].distance(out[j]);
                assert!((want - got).abs() < 1e-6, "pair ({i}, {j}): {got} vs {want}");
            }
        }
    }

    #[test]
    fn collinear_data_falls_back_to_random() {
        let pts: Vec<Point> = (0..5).map(|i| Point::new(i as f64, 0.0)).collect();
        let m = DistanceMatrix::from_points(&pts);
        let state = InitialLayout::Classical { seed: 3 }
            .materialise(&m, None)
            .unwrap();
        assert_eq!(state.positions(), random(5, 3).as_slice());
    }

    #[test]
    fn explicit_layouts_must_match_the_item_count() {
        let m = DistanceMatrix::from_fn(3, |_, _| 1.0);
        let err = InitialLayout::Explicit(vec![Point::ORIGIN; 2])
            .materialise(&m, None)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InitialLayoutSize {
                expected: 3,
                found: 2
            }
        ));
    }
}

//! Layout quality measures comparing layout distances (`low`) with dissimilarities (`high`).

use crate::error::Result;
use crate::geom::Point;
use crate::rng::XorShift64Star;
use crate::source::{Dissimilarity, desired};

/// Random pairs drawn per item by [`sampled_stress`].
pub const SAMPLES_PER_ITEM: usize = 50;

#[derive(Debug, Default, Clone, Copy)]
struct Sums {
    squared_error: f64,
    squared_low: f64,
    absolute_error: f64,
    pairs: usize,
}

impl Sums {
    fn add(&mut self, low: f64, high: f64) {
        let diff = low - high;
        self.squared_error += diff * diff;
        self.squared_low += low * low;
        self.absolute_error += diff.abs();
        self.pairs += 1;
    }

    fn stress(&self) -> f64 {
        // All items at one point: nothing to normalise by.
        if self.squared_low > 0.0 {
            self.squared_error / self.squared_low
        } else {
            self.squared_error
        }
    }
}

fn all_pairs(source: &dyn Dissimilarity, positions: &[Point]) -> Result<Sums> {
    let mut sums = Sums::default();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            sums.add(positions[i].distance(positions[j]), desired(source, i, j)?);
        }
    }
    Ok(sums)
}

/// `sum((low - high)^2) / sum(low^2)` over every pair.
pub fn normalized_stress(source: &dyn Dissimilarity, positions: &[Point]) -> Result<f64> {
    Ok(all_pairs(source, positions)?.stress())
}

/// Mean `|low - high|` over every pair.
pub fn average_error(source: &dyn Dissimilarity, positions: &[Point]) -> Result<f64> {
    let sums = all_pairs(source, positions)?;
    if sums.pairs == 0 {
        return Ok(0.0);
    }
    Ok(sums.absolute_error / sums.pairs as f64)
}

/// [`normalized_stress`] estimated from [`SAMPLES_PER_ITEM`] random partners per item.
pub fn sampled_stress(source: &dyn Dissimilarity, positions: &[Point], seed: u64) -> Result<f64> {
    let n = positions.len();
    let mut sums = Sums::default();
    if n < 2 {
        return Ok(0.0);
    }
    let mut rng = XorShift64Star::new(seed);
    for i in 0..n {
        for _ in 0..SAMPLES_PER_ITEM {
            let j = rng.next_usize(n);
            if j == i {
                continue;
            }
            sums.add(positions[i].distance(positions[j]), desired(source, i, j)?);
        }
    }
    Ok(sums.stress())
}

/// Mean velocity magnitude.
pub fn mean_speed(velocities: &[Point]) -> f64 {
    if velocities.is_empty() {
        return 0.0;
    }
    velocities.iter().map(|v| v.norm()).sum::<f64>() / velocities.len() as f64
}

/// `(dissimilarity, layout distance)` for every pair, for a Shepard diagram.
pub fn shepard_points(source: &dyn Dissimilarity, positions: &[Point]) -> Result<Vec<(f64, f64)>> {
    let n = positions.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push((desired(source, i, j)?, positions[i].distance(positions[j])));
        }
    }
    Ok(out)
}

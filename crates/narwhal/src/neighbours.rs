//! Neighbour and random-sample sets for large layouts (Chalmers, 1996).
//!
//! Each item keeps a short list of the closest items found so far plus a fresh random sample per
//! iteration. Samples that turn out closer than the farthest neighbour replace it, so the
//! neighbour lists improve as the layout runs while each iteration stays linear in N.

use crate::error::Result;
use crate::rng::XorShift64Star;
use crate::source::{Dissimilarity, desired};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Link {
    pub(crate) item: usize,
    pub(crate) desired: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct NeighbourCache {
    sample_size: usize,
    /// Sorted farthest first.
    neighbours: Vec<Vec<Link>>,
    samples: Vec<Vec<Link>>,
}

impl NeighbourCache {
    /// Whether `n` items leave room for disjoint neighbour and sample sets.
    pub(crate) fn applicable(n: usize, neighbour_size: usize, sample_size: usize) -> bool {
        n > neighbour_size + sample_size
    }

    pub(crate) fn new(
        source: &dyn Dissimilarity,
        neighbour_size: usize,
        sample_size: usize,
        rng: &mut XorShift64Star,
    ) -> Result<Self> {
        let n = source.len();
        debug_assert!(Self::applicable(n, neighbour_size, sample_size));
        let mut neighbours = Vec::with_capacity(n);
        for i in 0..n {
            let mut links: Vec<Link> = Vec::with_capacity(neighbour_size);
            while links.len() < neighbour_size {
                let item = rng.next_usize(n);
                if item == i || links.iter().any(|l| l.item == item) {
                    continue;
                }
                links.push(Link {
                    item,
                    desired: desired(source, i, item)?,
                });
            }
            sort_farthest_first(&mut links);
            neighbours.push(links);
        }
        Ok(Self {
            sample_size,
            neighbours,
            samples: vec![Vec::with_capacity(sample_size); n],
        })
    }

    pub(crate) fn neighbours(&self, i: usize) -> &[Link] {
        &self.neighbours[i]
    }

    pub(crate) fn samples(&self, i: usize) -> &[Link] {
        &self.samples[i]
    }

    /// Draws a new random sample for `i`, disjoint from `i` and its neighbours.
    pub(crate) fn resample(
        &mut self,
        i: usize,
        source: &dyn Dissimilarity,
        rng: &mut XorShift64Star,
    ) -> Result<()> {
        let n = self.neighbours.len();
        let mut sample = std::mem::take(&mut self.samples[i]);
        sample.clear();
        while sample.len() < self.sample_size {
            let item = rng.next_usize(n);
            if item == i
                || self.neighbours[i].iter().any(|l| l.item == item)
                || sample.iter().any(|l| l.item == item)
            {
                continue;
            }
            sample.push(Link {
                item,
                desired: desired(source, i, item)?,
            });
        }
        self.samples[i] = sample;
        Ok(())
    }

    /// Moves sampled items that are closer than the farthest neighbour into the neighbour set.
    pub(crate) fn promote(&mut self, i: usize) {
        let neighbours = &mut self.neighbours[i];
        for s in &self.samples[i] {
            match neighbours.first() {
                Some(farthest) if s.desired < farthest.desired => {
                    neighbours[0] = *s;
                    sort_farthest_first(neighbours);
                }
                _ => {}
            }
        }
    }
}

fn sort_farthest_first(links: &mut [Link]) {
    links.sort_by(|a, b| b.desired.total_cmp(&a.desired));
}

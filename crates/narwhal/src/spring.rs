//! Metric force-directed layout.
//!
//! Every pair of items is joined by a damped spring whose rest length is the pair's
//! dissimilarity. Small inputs use every pair each iteration; larger ones use each item's
//! neighbour and random-sample sets, which keeps an iteration linear in the item count.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::Point;
use crate::init::InitialLayout;
use crate::neighbours::NeighbourCache;
use crate::params::{LiveParams, SpringParams};
use crate::rng::XorShift64Star;
use crate::solver::{Solver, SolverKind, StepReport};
use crate::source::{Condensed, Dissimilarity};
use crate::state::LayoutState;
use crate::stress;

/// Layout distances below this are treated as this.
pub const EPSILON: f64 = 1e-9;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpringOptions {
    pub params: SpringParams,
    pub initial: InitialLayout,
    /// Integration time step.
    pub delta_time: f64,
    pub neighbour_size: usize,
    pub sample_size: usize,
    /// Largest item count laid out with every pair per iteration.
    pub exhaustive_limit: usize,
    /// Seeds neighbour and sample draws.
    pub seed: u64,
}

impl Default for SpringOptions {
    fn default() -> Self {
        Self {
            params: SpringParams::default(),
            initial: InitialLayout::default(),
            delta_time: 0.3,
            neighbour_size: 6,
            sample_size: 3,
            exhaustive_limit: 64,
            seed: 0,
        }
    }
}

impl SpringOptions {
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if !(self.delta_time.is_finite() && self.delta_time > 0.0 && self.delta_time <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "deltaTime",
                value: self.delta_time,
            });
        }
        if self.neighbour_size + self.sample_size == 0 {
            return Err(Error::InvalidSize {
                name: "neighbourSize + sampleSize",
                value: 0,
                minimum: 1,
            });
        }
        Ok(())
    }
}

enum Pairs {
    Exhaustive(Condensed),
    Sampled(NeighbourCache),
}

pub struct SpringSolver {
    source: Arc<dyn Dissimilarity>,
    params: SpringParams,
    delta_time: f64,
    pairs: Pairs,
    rng: XorShift64Star,
    seed: u64,
    state: LayoutState,
    forces: Vec<Point>,
    iteration: u64,
    quantity: Option<f64>,
}

impl std::fmt::Debug for SpringSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpringSolver")
            .field("items", &self.state.len())
            .field("params", &self.params)
            .field("sampled", &self.is_sampled())
            .field("iteration", &self.iteration)
            .finish_non_exhaustive()
    }
}

impl SpringSolver {
    pub fn new(source: Arc<dyn Dissimilarity>, options: &SpringOptions) -> Result<Self> {
        options.validate()?;
        let n = source.len();
        if n < 2 {
            return Err(Error::TooFewItems {
                found: n,
                minimum: 2,
            });
        }

        let mut rng = XorShift64Star::new(options.seed);
        let sampled = n > options.exhaustive_limit
            && NeighbourCache::applicable(n, options.neighbour_size, options.sample_size);
        let pairs = if sampled {
            Pairs::Sampled(NeighbourCache::new(
                source.as_ref(),
                options.neighbour_size,
                options.sample_size,
                &mut rng,
            )?)
        } else {
            Pairs::Exhaustive(Condensed::fetch(source.as_ref())?)
        };
        let state = match &pairs {
            Pairs::Exhaustive(all) => options.initial.materialise(source.as_ref(), Some(all))?,
            Pairs::Sampled(_) => options.initial.materialise(source.as_ref(), None)?,
        };

        tracing::debug!(
            items = n,
            sampled,
            freeness = options.params.freeness,
            spring_force = options.params.spring_force,
            damping_factor = options.params.damping_factor,
            "spring solver ready"
        );

        Ok(Self {
            source,
            params: options.params,
            delta_time: options.delta_time,
            pairs,
            rng,
            seed: options.seed,
            state,
            forces: vec![Point::ORIGIN; n],
            iteration: 0,
            quantity: None,
        })
    }

    pub fn params(&self) -> SpringParams {
        self.params
    }

    pub fn set_params(&mut self, params: SpringParams) {
        self.params = params;
    }

    /// Whether iterations use neighbour and sample sets instead of every pair.
    pub fn is_sampled(&self) -> bool {
        matches!(self.pairs, Pairs::Sampled(_))
    }

    fn accumulate(&mut self) -> Result<f64> {
        let n = self.state.len();
        self.forces.fill(Point::ORIGIN);
        let law = SpringLaw {
            params: self.params,
            positions: &self.state.positions,
            velocities: &self.state.velocities,
        };
        match &mut self.pairs {
            Pairs::Exhaustive(all) => {
                for ((i, j), &desired) in all.pairs().zip(all.values()) {
                    law.apply(&mut self.forces, i, j, desired);
                }
                Ok(1.0 / (n - 1) as f64)
            }
            Pairs::Sampled(cache) => {
                for i in 0..n {
                    cache.resample(i, self.source.as_ref(), &mut self.rng)?;
                    for link in cache.neighbours(i).iter().chain(cache.samples(i)) {
                        law.apply(&mut self.forces, i, link.item, link.desired);
                    }
                    cache.promote(i);
                }
                let links = cache.neighbours(0).len() + cache.samples(0).len();
                Ok(1.0 / links as f64)
            }
        }
    }
}

struct SpringLaw<'a> {
    params: SpringParams,
    positions: &'a [Point],
    velocities: &'a [Point],
}

impl SpringLaw<'_> {
    /// Adds the spring and damping force between `i` and `j` to both items.
    #[inline]
    fn apply(&self, forces: &mut [Point], i: usize, j: usize, desired: f64) {
        let delta = self.positions[j] - self.positions[i];
        let real = delta.norm();
        let unit = if real >= EPSILON {
            delta * real.recip()
        } else {
            coincident_direction(i, j)
        };
        let real = real.max(EPSILON);

        let spring = self.params.spring_force * (real - desired);
        let damp = self.params.damping_factor * (self.velocities[j] - self.velocities[i]).dot(unit);
        let force = unit * (spring + damp);
        forces[i] += force;
        forces[j] -= force;
    }
}

/// Direction from `i` to `j` used when the two sit on the same spot. Swapping the pair flips it.
fn coincident_direction(i: usize, j: usize) -> Point {
    let (lo, hi, sign) = if i < j { (i, j, 1.0) } else { (j, i, -1.0) };
    let angle = GOLDEN_ANGLE * (lo.wrapping_mul(31).wrapping_add(hi)) as f64;
    Point::new(angle.cos(), angle.sin()) * sign
}

impl Solver for SpringSolver {
    fn kind(&self) -> SolverKind {
        SolverKind::Spring
    }

    fn len(&self) -> usize {
        self.state.len()
    }

    fn iteration(&self) -> u64 {
        self.iteration
    }

    fn step(&mut self) -> Result<StepReport> {
        let scale = self.accumulate()?;
        let iteration = self.iteration + 1;
        let dt = self.delta_time;
        let freeness = self.params.freeness;

        let n = self.state.len();
        let mut positions = Vec::with_capacity(n);
        let mut velocities = Vec::with_capacity(n);
        let mut displacement = 0.0;
        for (item, ((&p, &v), &f)) in self
            .state
            .positions
            .iter()
            .zip(&self.state.velocities)
            .zip(&self.forces)
            .enumerate()
        {
            let v = (v + f * (scale * dt)) * freeness;
            let moved = v * dt;
            let p = p + moved;
            if !(p.is_finite() && v.is_finite()) {
                return Err(Error::NonFinitePosition { iteration, item });
            }
            displacement += moved.norm();
            positions.push(p);
            velocities.push(v);
        }

        self.state = LayoutState {
            positions,
            velocities,
        };
        self.iteration = iteration;
        let quantity = displacement / n as f64;
        self.quantity = Some(quantity);
        tracing::trace!(iteration, quantity, "spring iteration");
        Ok(StepReport {
            iteration,
            quantity,
        })
    }

    fn state(&self) -> &LayoutState {
        &self.state
    }

    fn quantity(&self) -> Option<f64> {
        self.quantity
    }

    fn apply(&mut self, params: &LiveParams) {
        self.params = params.spring;
    }

    fn stress(&self) -> Result<f64> {
        match &self.pairs {
            Pairs::Exhaustive(all) => stress::normalized_stress(all, &self.state.positions),
            Pairs::Sampled(_) => {
                stress::sampled_stress(self.source.as_ref(), &self.state.positions, self.seed)
            }
        }
    }

    fn into_state(self: Box<Self>) -> LayoutState {
        self.state
    }
}

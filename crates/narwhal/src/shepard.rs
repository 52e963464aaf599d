//! Non-metric (Shepard-Kruskal) layout.
//!
//! Only the rank order of the dissimilarities matters. Each iteration fits disparities to the
//! current layout distances by monotone regression and moves every item along the majorisation
//! direction of the resulting stress. Large inputs can first run a cheap local stage that only
//! ranks each item's neighbour and sample sets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::Point;
use crate::init::InitialLayout;
use crate::monotone::{isotonic, rank_departure};
use crate::neighbours::NeighbourCache;
use crate::params::{LiveParams, ShepardParams};
use crate::rng::XorShift64Star;
use crate::solver::{Solver, SolverKind, StepReport};
use crate::source::{Condensed, Dissimilarity};
use crate::state::LayoutState;

/// Local-stage departure at which the global stage takes over.
pub const LOCAL_THRESHOLD: f64 = 0.001;

/// Item count above which the local stage runs, when enabled.
pub const LOCAL_STAGE_MIN_ITEMS: usize = 64;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShepardOptions {
    pub params: ShepardParams,
    pub initial: InitialLayout,
    pub local_stage: bool,
    pub neighbour_size: usize,
    pub sample_size: usize,
    /// Seeds the local stage's neighbour and sample draws.
    pub seed: u64,
}

impl Default for ShepardOptions {
    fn default() -> Self {
        Self {
            params: ShepardParams::default(),
            initial: InitialLayout::Classical { seed: 0 },
            local_stage: true,
            neighbour_size: 6,
            sample_size: 3,
            seed: 0,
        }
    }
}

struct LocalStage {
    cache: NeighbourCache,
    rng: XorShift64Star,
    iterations: u64,
}

pub struct ShepardSolver {
    /// Dissimilarities rescaled to `[0, 1]`.
    high: Condensed,
    sorted_high: Vec<f64>,
    params: ShepardParams,
    /// Velocities hold the previous step, which momentum carries forward.
    state: LayoutState,
    /// Layout distances of `state`, in pair order.
    low: Vec<f64>,
    local: Option<LocalStage>,
    iteration: u64,
    quantity: Option<f64>,
    order: Vec<usize>,
    fitted: Vec<f64>,
}

impl std::fmt::Debug for ShepardSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShepardSolver")
            .field("items", &self.state.len())
            .field("params", &self.params)
            .field("local_stage", &self.local.is_some())
            .field("iteration", &self.iteration)
            .finish_non_exhaustive()
    }
}

impl ShepardSolver {
    /// Explicit and resumed layouts are re-centred and rescaled to a mean pair distance of 1.
    pub fn new(source: Arc<dyn Dissimilarity>, options: &ShepardOptions) -> Result<Self> {
        options.params.validate()?;
        let n = source.len();
        if n < 2 {
            return Err(Error::TooFewItems {
                found: n,
                minimum: 2,
            });
        }

        let mut high = Condensed::fetch(source.as_ref())?;
        standardise(high.values_mut());
        let mut sorted_high = high.values().to_vec();
        sorted_high.sort_by(f64::total_cmp);

        let state = options.initial.materialise(&high, Some(&high))?;

        let local = if options.local_stage
            && n > LOCAL_STAGE_MIN_ITEMS
            && NeighbourCache::applicable(n, options.neighbour_size, options.sample_size)
        {
            if options.neighbour_size + options.sample_size == 0 {
                return Err(Error::InvalidSize {
                    name: "neighbourSize + sampleSize",
                    value: 0,
                    minimum: 1,
                });
            }
            let mut rng = XorShift64Star::new(options.seed);
            let cache = NeighbourCache::new(
                &high,
                options.neighbour_size,
                options.sample_size,
                &mut rng,
            )?;
            Some(LocalStage {
                cache,
                rng,
                iterations: 0,
            })
        } else {
            None
        };

        tracing::debug!(
            items = n,
            local_stage = local.is_some(),
            alpha = options.params.alpha,
            beta = options.params.beta,
            "shepard solver ready"
        );

        let pair_count = high.values().len();
        let mut solver = Self {
            high,
            sorted_high,
            params: options.params,
            state,
            low: vec![0.0; pair_count],
            local,
            iteration: 0,
            quantity: None,
            order: Vec::with_capacity(pair_count),
            fitted: Vec::with_capacity(pair_count),
        };
        solver.normalise();
        if !solver.state.positions.iter().all(|p| p.is_finite()) {
            return Err(Error::NonFinitePosition {
                iteration: 0,
                item: solver.first_non_finite(),
            });
        }
        Ok(solver)
    }

    pub fn params(&self) -> ShepardParams {
        self.params
    }

    pub fn set_params(&mut self, params: ShepardParams) {
        self.params = params;
    }

    /// Whether the next iteration belongs to the local stage.
    pub fn in_local_stage(&self) -> bool {
        self.local.is_some()
    }

    /// Kruskal stress-1 of the current layout against its disparities.
    pub fn kruskal_stress(&self) -> f64 {
        let mut order = Vec::new();
        let mut fitted = Vec::new();
        let mut disparities = vec![0.0; self.low.len()];
        self.fit_disparities(&mut order, &mut fitted, &mut disparities);
        let (num, den) = self
            .low
            .iter()
            .zip(&disparities)
            .fold((0.0, 0.0), |(num, den), (&d, &dhat)| {
                (num + (d - dhat) * (d - dhat), den + d * d)
            });
        if den > 0.0 { (num / den).sqrt() } else { 0.0 }
    }

    /// Rank-image departure of the current layout over every pair.
    pub fn departure(&self) -> f64 {
        let mut order = Vec::new();
        rank_departure(&self.low, self.high.values(), &self.sorted_high, &mut order)
    }

    /// Disparities for `self.low`: monotone regression over pairs ordered by (dissimilarity,
    /// layout distance).
    fn fit_disparities(&self, order: &mut Vec<usize>, fitted: &mut Vec<f64>, out: &mut [f64]) {
        let high = self.high.values();
        let low = &self.low;
        order.clear();
        order.extend(0..low.len());
        order.sort_by(|&a, &b| {
            high[a]
                .total_cmp(&high[b])
                .then_with(|| low[a].total_cmp(&low[b]))
        });
        let ordered: Vec<f64> = order.iter().map(|&k| low[k]).collect();
        isotonic(&ordered, fitted);
        for (&k, &value) in order.iter().zip(fitted.iter()) {
            out[k] = value;
        }
    }

    fn global_step(&mut self, iteration: u64) -> Result<f64> {
        let n = self.state.len();
        let mut order = std::mem::take(&mut self.order);
        let mut fitted = std::mem::take(&mut self.fitted);
        let mut disparities = vec![0.0; self.low.len()];
        self.fit_disparities(&mut order, &mut fitted, &mut disparities);
        self.fitted = fitted;

        let positions = &self.state.positions;
        let mut direction = vec![Point::ORIGIN; n];
        for (k, (i, j)) in self.high.pairs().enumerate() {
            let d = self.low[k].max(EPSILON);
            let pull = (positions[j] - positions[i]) * (1.0 - disparities[k] / d);
            direction[i] += pull;
            direction[j] -= pull;
        }

        let rate = self.params.alpha / (0.2 * n as f64);
        let beta = self.params.beta;
        let mut next = Vec::with_capacity(n);
        let mut steps = Vec::with_capacity(n);
        for (item, ((&p, &previous), &dir)) in positions
            .iter()
            .zip(&self.state.velocities)
            .zip(&direction)
            .enumerate()
        {
            let step = dir * rate + previous * beta;
            let p = p + step;
            if !(p.is_finite() && step.is_finite()) {
                self.order = order;
                return Err(Error::NonFinitePosition { iteration, item });
            }
            next.push(p);
            steps.push(step);
        }

        let previous = std::mem::replace(
            &mut self.state,
            LayoutState {
                positions: next,
                velocities: steps,
            },
        );
        self.normalise();
        if !self.state.positions.iter().all(|p| p.is_finite()) {
            let item = self.first_non_finite();
            self.state = previous;
            self.refresh_distances();
            self.order = order;
            return Err(Error::NonFinitePosition { iteration, item });
        }

        let departure = rank_departure(
            &self.low,
            self.high.values(),
            &self.sorted_high,
            &mut order,
        );
        self.order = order;
        Ok(departure)
    }

    fn local_step(&mut self, iteration: u64) -> Result<f64> {
        let Some(stage) = self.local.as_mut() else {
            return Ok(0.0);
        };
        let n = self.state.len();
        let positions = &self.state.positions;
        let alpha = self.params.alpha;

        let mut moves = vec![Point::ORIGIN; n];
        let mut total = 0.0;
        let mut count = 0usize;
        let mut ranked: Vec<(f64, f64, usize)> = Vec::new();
        let mut images: Vec<f64> = Vec::new();
        for i in 0..n {
            stage.cache.resample(i, &self.high, &mut stage.rng)?;
            ranked.clear();
            for link in stage.cache.neighbours(i).iter().chain(stage.cache.samples(i)) {
                let low = positions[i].distance(positions[link.item]);
                ranked.push((low, link.desired, link.item));
            }
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
            images.clear();
            images.extend(ranked.iter().map(|r| r.1));
            images.sort_by(f64::total_cmp);

            for (&(low, high, j), &image) in ranked.iter().zip(&images) {
                let gap = image - high;
                total += gap * gap;
                count += 1;
                moves[i] += (positions[j] - positions[i]) * (alpha * gap / low.max(EPSILON));
            }
            stage.cache.promote(i);
        }

        let mut next = Vec::with_capacity(n);
        for (item, (&p, &m)) in positions.iter().zip(&moves).enumerate() {
            let p = p + m;
            if !p.is_finite() {
                return Err(Error::NonFinitePosition { iteration, item });
            }
            next.push(p);
        }
        stage.iterations += 1;
        let iterations = stage.iterations;
        let departure = if count == 0 { 0.0 } else { total / count as f64 };
        let finished = departure <= LOCAL_THRESHOLD || iterations >= n as u64;

        self.state = LayoutState {
            positions: next,
            velocities: moves,
        };
        self.refresh_distances();
        if finished {
            tracing::debug!(iterations, departure, "shepard local stage finished");
            self.local = None;
            self.normalise();
        }
        Ok(departure)
    }

    /// Centres the layout and scales it to a mean pair distance of 1, refreshing `low`.
    fn normalise(&mut self) {
        let n = self.state.len();
        let centre = self
            .state
            .positions
            .iter()
            .fold(Point::ORIGIN, |acc, &p| acc + p)
            * (1.0 / n as f64);
        for p in &mut self.state.positions {
            *p -= centre;
        }
        self.refresh_distances();

        let mean = self.low.iter().sum::<f64>() / self.low.len().max(1) as f64;
        if mean.is_finite() && mean > 0.0 {
            let scale = mean.recip();
            for p in &mut self.state.positions {
                *p = *p * scale;
            }
            for v in &mut self.state.velocities {
                *v = *v * scale;
            }
            for d in &mut self.low {
                *d *= scale;
            }
        }
    }

    fn refresh_distances(&mut self) {
        let positions = &self.state.positions;
        for ((i, j), d) in self.high.pairs().zip(self.low.iter_mut()) {
            *d = positions[i].distance(positions[j]);
        }
    }

    fn first_non_finite(&self) -> usize {
        self.state
            .positions
            .iter()
            .position(|p| !p.is_finite())
            .unwrap_or(0)
    }
}

/// Rescales to `[0, 1]`; a constant input becomes all zeros.
fn standardise(values: &mut [f64]) {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    for v in values.iter_mut() {
        *v = if range > 0.0 { (*v - lo) / range } else { 0.0 };
    }
}

impl Solver for ShepardSolver {
    fn kind(&self) -> SolverKind {
        SolverKind::Shepard
    }

    fn len(&self) -> usize {
        self.state.len()
    }

    fn iteration(&self) -> u64 {
        self.iteration
    }

    fn step(&mut self) -> Result<StepReport> {
        let iteration = self.iteration + 1;
        let quantity = if self.local.is_some() {
            self.local_step(iteration)?
        } else {
            self.global_step(iteration)?
        };
        self.iteration = iteration;
        self.quantity = Some(quantity);
        tracing::trace!(iteration, quantity, "shepard iteration");
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
        self.params = params.shepard;
    }

    fn stress(&self) -> Result<f64> {
        Ok(self.kruskal_stress())
    }

    fn into_state(self: Box<Self>) -> LayoutState {
        self.state
    }
}

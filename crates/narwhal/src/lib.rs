#![forbid(unsafe_code)]

//! Headless dissimilarity-driven 2D layout.
//!
//! `narwhal` places N items in the plane so that layout distances reproduce a pairwise
//! [`Dissimilarity`]. Two interchangeable solvers are provided: a damped spring model
//! ([`SpringSolver`], metric) and Shepard-Kruskal non-metric scaling ([`ShepardSolver`]). Both
//! report a convergence quantity once per iteration to a [`ConvergenceMonitor`], take live
//! parameter changes through a [`ParameterChannel`], and can run on a background worker with
//! cooperative cancellation via [`runner::spawn`].

pub mod cancellation;
pub mod convergence;
pub mod error;
pub mod geom;
mod init;
mod monotone;
mod neighbours;
pub mod params;
pub mod runner;
mod rng;
mod shepard;
mod solver;
mod source;
mod spring;
mod state;
pub mod stress;

use std::sync::Arc;

pub use cancellation::{CancellationSource, CancellationToken};
pub use convergence::{ConvergenceMonitor, Observation, Trigger, Verdict};
pub use error::{Error, Result};
pub use geom::Point;
pub use init::InitialLayout;
pub use params::{LiveParams, ParameterChannel, ShepardParams, SpringParams};
pub use runner::{LayoutRun, Observer, Progress, RunOptions, RunOutcome, StopReason};
pub use shepard::{LOCAL_STAGE_MIN_ITEMS, LOCAL_THRESHOLD, ShepardOptions, ShepardSolver};
pub use solver::{Solver, SolverKind, StepReport};
pub use source::{Dissimilarity, DistanceMatrix, SourceError};
pub use spring::{SpringOptions, SpringSolver};
pub use state::LayoutState;

#[derive(Debug, Clone, PartialEq)]
pub enum Algorithm {
    Spring(SpringOptions),
    Shepard(ShepardOptions),
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Spring(SpringOptions::default())
    }
}

impl Algorithm {
    pub fn kind(&self) -> SolverKind {
        match self {
            Algorithm::Spring(_) => SolverKind::Spring,
            Algorithm::Shepard(_) => SolverKind::Shepard,
        }
    }

    /// Builds the solver, fetching whatever dissimilarities its set-up needs.
    pub fn build(&self, source: Arc<dyn Dissimilarity>) -> Result<Box<dyn Solver>> {
        Ok(match self {
            Algorithm::Spring(opts) => Box::new(SpringSolver::new(source, opts)?),
            Algorithm::Shepard(opts) => Box::new(ShepardSolver::new(source, opts)?),
        })
    }
}

/// Headless layout entry point: runs to `trigger` on the calling thread.
pub fn layout(
    source: Arc<dyn Dissimilarity>,
    algorithm: &Algorithm,
    trigger: Trigger,
) -> Result<RunOutcome> {
    runner::run_to_convergence(algorithm.build(source)?, trigger)
}

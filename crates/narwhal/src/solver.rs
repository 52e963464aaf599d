use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::LiveParams;
use crate::state::LayoutState;

/// Outcome of one completed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepReport {
    /// Iterations completed by the solver, this one included.
    pub iteration: u64,
    /// Convergence quantity of the configuration the step produced.
    pub quantity: f64,
}

/// Which family of solver a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Spring,
    Shepard,
}

impl SolverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverKind::Spring => "spring",
            SolverKind::Shepard => "shepard",
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" | "metric" => Ok(SolverKind::Spring),
            "shepard" | "nmds" | "non-metric" => Ok(SolverKind::Shepard),
            other => Err(format!("unknown solver: {other}")),
        }
    }
}

/// An iterative layout solver.
///
/// A solver owns its [`LayoutState`] exclusively. [`Solver::step`] either completes an iteration
/// and replaces the state as a whole, or fails and leaves the previous state in place.
pub trait Solver: Send {
    fn kind(&self) -> SolverKind;

    /// Number of items being laid out.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterations completed so far.
    fn iteration(&self) -> u64;

    fn step(&mut self) -> Result<StepReport>;

    fn state(&self) -> &LayoutState;

    /// Quantity reported by the last completed iteration.
    fn quantity(&self) -> Option<f64>;

    /// Takes the live parameters relevant to this solver. Applied between iterations only.
    fn apply(&mut self, params: &LiveParams);

    /// Stress of the current configuration.
    fn stress(&self) -> Result<f64>;

    fn into_state(self: Box<Self>) -> LayoutState;
}

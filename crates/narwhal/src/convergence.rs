//! Once-per-iteration stop decision shared by all solvers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What stops a run automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "lowercase")]
pub enum Trigger {
    /// Never stops on its own; the run ends only when cancelled.
    #[default]
    Disabled,
    /// Stops once the completed iteration count reaches the threshold.
    Iterations(u64),
    /// Stops once the solver's convergence quantity (mean displacement for the spring solver,
    /// monotonicity departure for the Shepard solver) drops to the threshold or below.
    Quantity(f64),
}

impl Trigger {
    pub fn is_armed(self) -> bool {
        !matches!(self, Trigger::Disabled)
    }

    pub fn validate(self) -> Result<Self> {
        if let Trigger::Quantity(value) = self {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidThreshold { value });
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop,
}

/// Last values fed to [`ConvergenceMonitor::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub iteration: u64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConvergenceMonitor {
    trigger: Trigger,
    last: Option<Observation>,
}

impl ConvergenceMonitor {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            last: None,
        }
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Replaces the trigger. Enabling one kind disarms the other. The observed iteration count
    /// is kept, so a threshold edited mid-run applies to the run's total.
    pub fn set_trigger(&mut self, trigger: Trigger) {
        if trigger != self.trigger {
            tracing::debug!(from = ?self.trigger, to = ?trigger, "convergence trigger changed");
        }
        self.trigger = trigger;
    }

    pub fn disable(&mut self) {
        self.set_trigger(Trigger::Disabled);
    }

    /// Forgets observations; called when a new run starts.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<Observation> {
        self.last
    }

    /// Records the outcome of a completed iteration and decides whether to stop.
    ///
    /// `iteration` is the number of completed iterations in the run.
    pub fn observe(&mut self, iteration: u64, quantity: f64) -> Verdict {
        self.last = Some(Observation {
            iteration,
            quantity,
        });
        let stop = match self.trigger {
            Trigger::Disabled => false,
            Trigger::Iterations(threshold) => iteration >= threshold,
            Trigger::Quantity(threshold) => quantity <= threshold,
        };
        if stop {
            Verdict::Stop
        } else {
            Verdict::Continue
        }
    }
}

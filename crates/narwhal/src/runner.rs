//! Drives a [`Solver`] to completion, either on a background worker or synchronously.
//!
//! Between two iterations the worker, in order: checks for cancellation, drains pending
//! parameter updates, steps, publishes the new positions, consults the convergence monitor,
//! notifies the observer, and yields. The layout is only ever observed between iterations.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::convergence::{ConvergenceMonitor, Trigger, Verdict};
use crate::error::{Error, Result};
use crate::geom::Point;
use crate::params::{LiveParams, ParameterChannel};
use crate::solver::{Solver, SolverKind};
use crate::state::LayoutState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// The convergence trigger fired.
    Converged,
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StopReason::Converged => "converged",
            StopReason::Cancelled => "cancelled",
        })
    }
}

/// Progress of a run as of its last completed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub solver: SolverKind,
    pub iteration: u64,
    pub quantity: Option<f64>,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub solver: SolverKind,
    pub state: LayoutState,
    /// Iterations completed during this run.
    pub iterations: u64,
    pub quantity: Option<f64>,
    pub stress: f64,
    pub reason: StopReason,
}

/// Called on the worker after every completed iteration.
pub type Observer = Box<dyn FnMut(&Progress) + Send>;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Pause after each iteration; zero only yields.
    pub pause: Duration,
    pub thread_name: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pause: Duration::ZERO,
            thread_name: "narwhal-layout".to_string(),
        }
    }
}

/// Progress and positions published together after each iteration.
#[derive(Debug)]
struct Shared {
    latest: Mutex<(Progress, Arc<[Point]>)>,
}

impl Shared {
    fn publish(&self, progress: Progress, positions: &[Point]) {
        let positions = Arc::from(positions);
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = (progress, positions);
    }

    fn snapshot(&self) -> (Progress, Arc<[Point]>) {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        (latest.0, Arc::clone(&latest.1))
    }
}

/// Handle to a layout running on a background worker.
///
/// Dropping the handle cancels the run and waits for the worker.
#[derive(Debug)]
pub struct LayoutRun {
    cancel: CancellationSource,
    channel: ParameterChannel,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<Result<RunOutcome>>>,
}

/// Starts `solver` on a named worker thread.
///
/// The channel's current parameters and trigger are applied before the first iteration; later
/// updates take effect at the next iteration boundary.
pub fn spawn(
    solver: Box<dyn Solver>,
    channel: ParameterChannel,
    observer: Option<Observer>,
    options: RunOptions,
) -> Result<LayoutRun> {
    let cancel = CancellationSource::new();
    let initial = channel.snapshot();
    let progress = Progress {
        solver: solver.kind(),
        iteration: 0,
        quantity: None,
        trigger: initial.trigger,
    };
    let shared = Arc::new(Shared {
        latest: Mutex::new((progress, Arc::from(solver.state().positions()))),
    });

    let worker = Worker {
        token: cancel.token(),
        channel: Some(channel.clone()),
        shared: Some(Arc::clone(&shared)),
        observer,
        pause: options.pause,
    };
    let handle = std::thread::Builder::new()
        .name(options.thread_name)
        .spawn(move || worker.drive(solver, initial))?;

    Ok(LayoutRun {
        cancel,
        channel,
        shared,
        handle: Some(handle),
    })
}

/// Runs `solver` on the calling thread until `trigger` fires.
pub fn run_to_convergence(solver: Box<dyn Solver>, trigger: Trigger) -> Result<RunOutcome> {
    let trigger = trigger.validate()?;
    if !trigger.is_armed() {
        return Err(Error::UnboundedRun);
    }
    let worker = Worker {
        token: CancellationSource::new().token(),
        channel: None,
        shared: None,
        observer: None,
        pause: Duration::ZERO,
    };
    let initial = LiveParams {
        trigger,
        ..LiveParams::default()
    };
    worker.drive(solver, initial)
}

impl LayoutRun {
    /// Requests a stop at the next iteration boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    pub fn progress(&self) -> Progress {
        self.shared.snapshot().0
    }

    /// Positions after the last completed iteration.
    pub fn positions(&self) -> Arc<[Point]> {
        self.shared.snapshot().1
    }

    /// Progress together with the positions it describes.
    pub fn snapshot(&self) -> (Progress, Arc<[Point]>) {
        self.shared.snapshot()
    }

    /// Channel for live parameter changes.
    pub fn parameters(&self) -> &ParameterChannel {
        &self.channel
    }

    /// Waits for the worker and returns how the run ended.
    pub fn join(mut self) -> Result<RunOutcome> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::WorkerPanicked)?,
            None => Err(Error::WorkerPanicked),
        }
    }
}

impl Drop for LayoutRun {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}

struct Worker {
    token: CancellationToken,
    channel: Option<ParameterChannel>,
    shared: Option<Arc<Shared>>,
    observer: Option<Observer>,
    pause: Duration,
}

impl Worker {
    fn drive(mut self, mut solver: Box<dyn Solver>, initial: LiveParams) -> Result<RunOutcome> {
        let kind = solver.kind();
        let span = tracing::debug_span!("layout", solver = %kind, items = solver.len());
        let _entered = span.enter();

        // A synchronous run keeps the solver's own parameters.
        if self.channel.is_some() {
            solver.apply(&initial);
        }
        let mut seen = self.channel.as_ref().map_or(0, |c| c.generation());
        let mut monitor = ConvergenceMonitor::new(initial.trigger);
        monitor.reset();

        let mut iterations = 0u64;
        let mut quantity = None;
        let reason = loop {
            if self.token.is_cancelled() {
                break StopReason::Cancelled;
            }

            if let Some(channel) = &self.channel {
                if let Some(params) = channel.drain(&mut seen) {
                    tracing::debug!(iteration = iterations, ?params, "parameters updated");
                    solver.apply(&params);
                    monitor.set_trigger(params.trigger);
                }
            }

            let report = solver.step()?;
            iterations += 1;
            quantity = Some(report.quantity);

            let progress = Progress {
                solver: kind,
                iteration: iterations,
                quantity,
                trigger: monitor.trigger(),
            };
            if let Some(shared) = &self.shared {
                shared.publish(progress, solver.state().positions());
            }

            let verdict = monitor.observe(iterations, report.quantity);

            if let Some(observer) = self.observer.as_mut() {
                observer(&progress);
            }

            if verdict == Verdict::Stop {
                break if self.token.is_cancelled() {
                    StopReason::Cancelled
                } else {
                    StopReason::Converged
                };
            }

            if self.shared.is_some() {
                if self.pause.is_zero() {
                    std::thread::yield_now();
                } else {
                    self.token.wait_timeout(self.pause);
                }
            }
        };

        let stress = solver.stress()?;
        tracing::info!(%reason, iterations, ?quantity, stress, "layout stopped");
        Ok(RunOutcome {
            solver: kind,
            state: solver.into_state(),
            iterations,
            quantity,
            stress,
            reason,
        })
    }
}

use std::sync::Arc;

use narwhal::{
    LayoutRun, Observer, ParameterChannel, RunOptions, RunOutcome, ShepardSolver, Solver,
    SolverKind, SpringSolver, Trigger, runner,
};
use shoal_core::DissimilarityModel;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::source::ModelSource;

/// Lays out a [`DissimilarityModel`] with either solver, configured by an [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct Engine {
    model: Arc<DissimilarityModel>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(model: impl Into<Arc<DissimilarityModel>>) -> Self {
        Self {
            model: model.into(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &Arc<DissimilarityModel> {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One iteration per record unless configured otherwise.
    pub fn default_trigger(&self) -> Trigger {
        Trigger::Iterations(self.model.len() as u64)
    }

    pub fn trigger(&self) -> Result<Trigger> {
        self.config.trigger(self.default_trigger())
    }

    /// The model over `columns` (all when `None`) as a layout source.
    pub fn source(&self, columns: Option<&[usize]>) -> Result<Arc<ModelSource>> {
        Ok(Arc::new(ModelSource::new(Arc::clone(&self.model), columns)?))
    }

    pub fn spring(&self, columns: Option<&[usize]>) -> Result<SpringSolver> {
        let options = self.config.spring_options()?;
        Ok(SpringSolver::new(self.source(columns)?, &options)?)
    }

    pub fn shepard(&self, columns: Option<&[usize]>) -> Result<ShepardSolver> {
        let options = self.config.shepard_options()?;
        Ok(ShepardSolver::new(self.source(columns)?, &options)?)
    }

    pub fn solver(&self, kind: SolverKind, columns: Option<&[usize]>) -> Result<Box<dyn Solver>> {
        Ok(match kind {
            SolverKind::Spring => Box::new(self.spring(columns)?),
            SolverKind::Shepard => Box::new(self.shepard(columns)?),
        })
    }

    /// A parameter channel holding the configured parameters and trigger. Its restore-defaults
    /// command returns to these values.
    pub fn channel(&self) -> Result<ParameterChannel> {
        Ok(ParameterChannel::new(
            self.config.live_params(self.default_trigger())?,
        ))
    }

    /// Starts a background run.
    pub fn start(
        &self,
        kind: SolverKind,
        columns: Option<&[usize]>,
        observer: Option<Observer>,
    ) -> Result<LayoutRun> {
        let solver = self.solver(kind, columns)?;
        let channel = self.channel()?;
        tracing::debug!(
            solver = %kind,
            records = self.model.len(),
            trigger = ?channel.snapshot().trigger,
            "starting background layout"
        );
        Ok(runner::spawn(solver, channel, observer, RunOptions::default())?)
    }

    /// Runs on the calling thread until the configured trigger fires.
    pub fn run(&self, kind: SolverKind, columns: Option<&[usize]>) -> Result<RunOutcome> {
        let trigger = self.trigger()?;
        let solver = self.solver(kind, columns)?;
        Ok(runner::run_to_convergence(solver, trigger)?)
    }
}

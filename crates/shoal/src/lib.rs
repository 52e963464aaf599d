#![forbid(unsafe_code)]

//! `shoal` projects collections of mixed-type records into two dimensions.
//!
//! A [`DissimilarityModel`] (from `shoal-core`) defines the pairwise desired distance between
//! records; the `narwhal` solvers place one point per record so that layout distances follow
//! it. [`Engine`] ties the two together and reads solver settings from an [`EngineConfig`].
//!
//! ```
//! use shoal::{ColumnType, Engine, SolverKind, TableBuilder, Value};
//!
//! let mut builder = TableBuilder::new([("x", ColumnType::Double), ("y", ColumnType::Double)])?;
//! for (x, y) in [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)] {
//!     builder.push_record([Value::Double(x), Value::Double(y)])?;
//! }
//! let outcome = Engine::new(builder.build()).run(SolverKind::Spring, None)?;
//! assert_eq!(outcome.state.len(), 4);
//! # Ok::<(), shoal::Error>(())
//! ```

pub mod config;
mod engine;
pub mod error;
mod source;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use source::ModelSource;

pub use narwhal::{
    Algorithm, ConvergenceMonitor, Dissimilarity, DistanceMatrix, InitialLayout, LayoutRun,
    LayoutState, LiveParams, Observer, ParameterChannel, Point, Progress, RunOptions, RunOutcome,
    ShepardOptions, ShepardParams, ShepardSolver, Solver, SolverKind, SpringOptions,
    SpringParams, SpringSolver, StopReason, Trigger, Verdict, stress,
};
pub use shoal_core::Error as ModelError;
pub use shoal_core::load;
pub use shoal_core::{
    BinaryFrequencies, ColumnSelection, ColumnStats, ColumnType, DissimilarityModel,
    DistanceTransform, Flags, Metric, TableBuilder, UNRELATED, Value,
};

use crate::source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layout needs at least {minimum} items, found {found}")]
    TooFewItems { found: usize, minimum: usize },

    #[error("dissimilarity between items {i} and {j} failed: {source}")]
    Source {
        i: usize,
        j: usize,
        #[source]
        source: SourceError,
    },

    #[error("non-finite dissimilarity {value} between items {i} and {j}")]
    NonFiniteDissimilarity { i: usize, j: usize, value: f64 },

    #[error("iteration {iteration} produced a non-finite position for item {item}")]
    NonFinitePosition { iteration: u64, item: usize },

    #[error("initial layout has {found} positions for {expected} items")]
    InitialLayoutSize { expected: usize, found: usize },

    #[error("{name} must be a finite value in [0, 1], got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("{name} must be at least {minimum}, got {value}")]
    InvalidSize {
        name: &'static str,
        value: usize,
        minimum: usize,
    },

    #[error("trigger threshold must be finite and non-negative, got {value}")]
    InvalidThreshold { value: f64 },

    #[error("a synchronous run needs an armed convergence trigger")]
    UnboundedRun,

    #[error("layout worker panicked")]
    WorkerPanicked,

    #[error("failed to start layout worker: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

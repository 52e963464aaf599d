#![forbid(unsafe_code)]

//! Dissimilarity model for mixed-type record collections.
//!
//! A [`DissimilarityModel`] turns records (typed columns, raw numeric vectors, genetic
//! sequences or a precomputed lower-triangular distance array) into a pairwise "desired
//! distance" oracle consumed by the layout solvers in `narwhal`.

mod builder;
mod column;
pub mod error;
pub mod load;
mod metric;
mod model;
mod normalise;
mod selection;
mod subset;
mod value;

pub use builder::TableBuilder;
pub use column::ColumnStats;
pub use error::{Error, Result};
pub use metric::{
    DistanceTransform, Metric, ORD_FACTOR, STANDARD_DEVS, UNRELATED, packed_index, packed_len,
};
pub use model::{DissimilarityModel, Flags};
pub use selection::ColumnSelection;
pub use subset::BinaryFrequencies;
pub use value::{ColumnType, Value};

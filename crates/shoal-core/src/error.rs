use crate::value::ColumnType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("record index {index} is outside a collection of {len} records")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("column index {index} is outside a collection of {len} columns")]
    ColumnOutOfRange { index: usize, len: usize },

    #[error("column selection is empty")]
    EmptySelection,

    #[error("duplicate field name: {name}")]
    DuplicateField { name: String },

    #[error(
        "sequences {left} and {right} differ in length ({left_len} vs {right_len}); Hamming distance needs equal lengths"
    )]
    SequenceLengthMismatch {
        left: usize,
        right: usize,
        left_len: usize,
        right_len: usize,
    },

    #[error("record {row} has {found} values, expected {expected}")]
    RecordWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("record {row}, column {column} ({field}): expected a {expected} value, found {found}")]
    TypeMismatch {
        row: usize,
        column: usize,
        field: String,
        expected: ColumnType,
        found: &'static str,
    },

    #[error("cannot normalise: column {column} ({field}) is {kind}, only INTEGER and DOUBLE columns can be normalised")]
    NotNormalisable {
        column: usize,
        field: String,
        kind: ColumnType,
    },

    #[error("cannot normalise a {metric} collection")]
    NormalisationUnsupported { metric: &'static str },

    #[error("lower-triangular data for {items} items needs {expected} values, found {found}")]
    TriangleLength {
        items: usize,
        expected: usize,
        found: usize,
    },

    #[error("non-finite dissimilarity {value} between items {left} and {right}")]
    NonFiniteDissimilarity { left: usize, right: usize, value: f64 },

    #[error("vector {row} has {found} components, expected {expected}")]
    VectorLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{found} labels supplied for {expected} records")]
    LabelCount { expected: usize, found: usize },

    #[error("collection is not binary")]
    NotBinary,

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unknown input format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

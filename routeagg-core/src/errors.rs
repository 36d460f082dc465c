use thiserror::Error;

/// Error type for invalid pairing and aggregation inputs.
///
/// Every variant names the precondition that failed. Errors are raised before any
/// numerical work begins so a partially built outlet map or merged grid is never returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggError {
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Resolution must be a positive finite number of degrees, got {0}")]
    InvalidResolution(f64),
    #[error("Pad must be a non-negative number of cells, got {0}")]
    InvalidPad(i64),
    #[error("Non-finite coordinate in {0}")]
    NonFiniteCoordinate(String),
    #[error("Coordinates out of order: {0}")]
    UnorderedCoordinates(String),
    #[error("Incompatible longitude conventions: {0}")]
    LongitudeConvention(String),
    #[error("Input {what} with shape {shape:?} does not fit output rows {rows:?} and columns {cols:?}. Is it aligned with the target resolution?")]
    PlacementMismatch {
        what: String,
        shape: (usize, usize),
        rows: (usize, usize),
        cols: (usize, usize),
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AggError {
    pub(crate) fn shape(what: &str, expected: &[usize], actual: &[usize]) -> Self {
        AggError::ShapeMismatch {
            what: what.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Convenience type for `Result<T, AggError>`.
pub type AggResult<T> = Result<T, AggError>;

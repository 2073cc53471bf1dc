use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Matrix,
    Vector,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Matrix => f.write_str("matrix"),
            ObjectKind::Vector => f.write_str("vector"),
        }
    }
}

pub type LResult<T> = Result<T, LinalgError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("dimension mismatch in {op}: expected {expected}, got {got}")]
    DimensionMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("index {index} out of range for {kind} {op} (len {len})")]
    OutOfBounds {
        kind: ObjectKind,
        op: &'static str,
        index: usize,
        len: usize,
    },
    #[error("invalid shape {n_row}x{n_col}: dimensions must be positive and their product must fit in usize")]
    InvalidShape { n_row: usize, n_col: usize },
    /// `column` is set when the input is a matrix column, `None` for a vector.
    #[error(
        "degenerate input{}: norm {norm} is numerically zero",
        .column.map(|c| format!(" at column {}", c)).unwrap_or_default()
    )]
    Degenerate { column: Option<usize>, norm: f64 },
    #[error("ownership violation: buffer still has {live_views} live view(s)")]
    OwnershipViolation { live_views: usize },
    #[error("cannot create a view of a view; views must borrow from an owner")]
    ViewOfView,
    #[error("stale handle: buffer {index} is not allocated in this storage")]
    StaleHandle { index: usize },
}

impl From<LinalgError> for String {
    fn from(e: LinalgError) -> Self {
        format!("{}", e)
    }
}

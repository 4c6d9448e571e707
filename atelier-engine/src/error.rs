//! Engine error types.

use thiserror::Error;

/// Structural errors rejected synchronously by the mutation operations.
/// The document is never left changed when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("row index {0} out of range")]
    RowIndexOutOfRange(usize),

    #[error("unknown block id: {0}")]
    UnknownBlock(String),

    #[error("row {row} is full: {capacity} column(s)")]
    RowFull { row: usize, capacity: usize },

    #[error("position {position} out of range for row {row}")]
    PositionOutOfRange { row: usize, position: usize },

    #[error("destination index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("invalid block patch: {0}")]
    InvalidPatch(String),
}

use thiserror::Error;

/// Errors raised by tree model operations and the structural utilities.
///
/// All variants are reported synchronously to the caller of the violating
/// operation; nothing is caught or retried internally.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("element not found: id {0}")]
    ElementNotFound(i32),

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("operation not allowed: {0}")]
    InvalidOperation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid structure at index {index} (id {id}): {reason}")]
    InvalidStructure {
        index: usize,
        id: i32,
        reason: String,
    },

    #[error("internal tree operation failed: {0}")]
    Internal(String),
}

pub type TreeResult<T> = Result<T, TreeError>;

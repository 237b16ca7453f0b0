//! Error types for the deductive database

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatalogError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatalogError {
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("program is not stratifiable: negative recursion through {0}")]
    NegativeRecursion(String),

    #[error("built-in predicate with unbound operands: {0}")]
    UnboundBuiltin(String),
}

//! Unified error types for sextant.

use thiserror::Error;

/// The main error type for sextant operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The CNF input could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A literal is zero or refers to a variable beyond the declared count.
    #[error("Invalid literal {literal} (variable count is {num_vars})")]
    InvalidLiteral { literal: i64, num_vars: usize },

    /// The formula declares no variables.
    #[error("Formula declares zero variables")]
    ZeroVariables,

    /// A clause with no literals was handed to the formula constructor.
    #[error("Clause {index} is empty")]
    EmptyClause { index: usize },

    /// A solver or CLI setting is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine broke one of its own invariants. This is a defect, never a
    /// property of the input, and the solve is aborted.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

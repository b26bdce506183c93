//! Error types surfaced at the crate's construction boundaries.
//!
//! Input validation fails with one of the variants below. Internal invariant
//! violations are programmer errors and are checked with `debug_assert!`
//! instead of being reported through this type.

use std::fmt;

/// The error type for constructing problem data, solutions, evaluators, and
/// search drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The problem instance is malformed (bad index, inverted time window,
    /// non-square matrix, depot referenced as a group member, ...).
    InvalidInstance(String),
    /// A solution references unknown clients, visits a client twice, or uses
    /// more vehicles of a type than are available.
    InvalidSolution(String),
    /// A penalty component passed to the cost evaluator is negative.
    InvalidPenalty(String),
    /// An illegal route mutation: depot placement or index out of range.
    RouteShape(String),
    /// An operator was added whose preconditions do not hold for this
    /// instance.
    UnsupportedOperator(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInstance(msg) => write!(f, "invalid instance: {}", msg),
            Error::InvalidSolution(msg) => write!(f, "invalid solution: {}", msg),
            Error::InvalidPenalty(msg) => write!(f, "invalid penalty: {}", msg),
            Error::RouteShape(msg) => write!(f, "illegal route mutation: {}", msg),
            Error::UnsupportedOperator(msg) => write!(f, "unsupported operator: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

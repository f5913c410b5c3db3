//! Error taxonomy shared by every algorithm in the crate.
//!
//! Fatal conditions are raised as [`CoreError`]. Advisory, non-fatal
//! conditions (a stalled adaptive integration, a plateaued synchronization
//! run) are never part of this enum -- they are carried as a flag on the
//! relevant result type instead, since they do not prevent the caller from
//! using the result.

use thiserror::Error;

/// Fatal errors produced by construction or processing of any algorithm.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Two points, or two ODE states, of different dimensionality were combined.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A grid topology's height/width do not multiply to the oscillator count,
    /// or a connection was requested on an unsupported topology kind.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// An unrecognized solver tag was supplied where one of a known set was expected.
    #[error("unknown solver: {0}")]
    UnknownSolver(String),

    /// An unrecognized initial-phase distribution tag was supplied.
    #[error("unknown initialization: {0}")]
    UnknownInitialization(String),

    /// An unrecognized agglomerative linkage tag was supplied.
    #[error("unknown linkage: {0}")]
    UnknownLinkage(String),

    /// An unrecognized x-means splitting criterion tag was supplied.
    #[error("unknown splitting criterion: {0}")]
    UnknownSplittingCriterion(String),

    /// A parameter was out of its valid domain (negative radius, zero tolerance,
    /// more requested centers than available points, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;

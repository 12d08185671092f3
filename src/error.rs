// src/error.rs

use thiserror::Error;

/// Errors raised while validating the atomistic inputs at setup.
///
/// Nothing is reduced or classified once one of these is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SetupError {
    /// An input array does not match the count it is declared against.
    #[error("length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// An index points outside the collection it refers to.
    #[error("{what} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    /// The same cell appears twice in the process-local cell list.
    #[error("local cell {0} listed more than once")]
    DuplicateLocalCell(usize),

    /// A scalar input is negative, NaN or infinite where that is not allowed.
    #[error("invalid value for {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },
}

/// Errors surfaced by the hysteresis driver.
///
/// Collaborator failures are passed through unchanged.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),

    #[error("integrator failed: {0}")]
    Integrator(String),

    #[error("output failed: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors raised while loading a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

//! Error types for the rate-gate library.

use std::time::Duration;

use thiserror::Error;

/// The main error type for limiter and gate construction.
///
/// The runtime operations (`reserve`, `release`, `admit`, `complete`) never
/// fail; they only ever delay. Errors exist solely for rejecting invalid
/// configuration up front.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Limit must allow at least one slot
    #[error("invalid limit: must be at least 1")]
    InvalidLimit,

    /// Window must be a positive duration
    #[error("invalid window: {0:?} is not a positive duration")]
    InvalidWindow(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GateError::InvalidWindow(Duration::ZERO);
        assert!(error.to_string().contains("positive duration"));
    }
}

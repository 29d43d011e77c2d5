//! Gate configuration.
//!
//! The two limit/window pairs are a deployment parameter, not part of the
//! algorithm, so they live here rather than inside the gate. The defaults
//! match the upstream API policy of 30 requests per second and 300 errors
//! per 3 minutes.

use std::time::Duration;

/// Deployment defaults for [`GateConfig`](crate::GateConfig).
pub mod defaults {
    use std::time::Duration;

    /// Maximum calls per request window.
    pub const REQUEST_LIMIT: usize = 30;
    /// Trailing window for the request limit.
    pub const REQUEST_WINDOW: Duration = Duration::from_secs(1);
    /// Maximum failed calls per error window.
    pub const ERROR_LIMIT: usize = 300;
    /// Trailing window for the error limit.
    pub const ERROR_WINDOW: Duration = Duration::from_secs(180);
}

/// How the gate accounts calls against the error limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorAccounting {
    /// Reserve an error slot for every call before its outcome is known.
    /// A successful call gives the slot back untouched at completion; a
    /// failed call's slot counts until it ages out of the error window.
    #[default]
    Pessimistic,

    /// Bypass the error limiter entirely. For embedders whose call sites may
    /// abort before attempting the throttled action and who account errors
    /// themselves.
    Disabled,
}

/// Configuration for a [`DualGate`](crate::DualGate).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rate_gate::{DualGate, GateConfig};
///
/// let gate = DualGate::with_config(GateConfig {
///     request_limit: 10,
///     request_window: Duration::from_secs(1),
///     ..GateConfig::default()
/// })?;
/// # let _ = gate;
/// # Ok::<(), rate_gate::GateError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Maximum calls per request window. Must be at least 1.
    pub request_limit: usize,
    /// Trailing window for the request limit. Must be positive.
    pub request_window: Duration,
    /// Maximum failed calls per error window. Must be at least 1.
    pub error_limit: usize,
    /// Trailing window for the error limit. Must be positive.
    pub error_window: Duration,
    /// Error accounting policy.
    pub error_accounting: ErrorAccounting,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            request_limit: defaults::REQUEST_LIMIT,
            request_window: defaults::REQUEST_WINDOW,
            error_limit: defaults::ERROR_LIMIT,
            error_window: defaults::ERROR_WINDOW,
            error_accounting: ErrorAccounting::Pessimistic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_deployment_constants() {
        let config = GateConfig::default();
        assert_eq!(config.request_limit, 30);
        assert_eq!(config.request_window, Duration::from_secs(1));
        assert_eq!(config.error_limit, 300);
        assert_eq!(config.error_window, Duration::from_secs(180));
        assert_eq!(config.error_accounting, ErrorAccounting::Pessimistic);
    }
}

//! Dual admission gate combining a request-volume and an error-volume limit.
//!
//! Callers ask the gate for admission before each throttled call and report
//! the outcome afterwards. The error limiter is reserved pessimistically:
//! every call holds an error slot until its outcome is known, and a success
//! hands the slot back without it ever counting.
//!
//! # Example
//!
//! ```rust
//! use rate_gate::DualGate;
//!
//! let gate = DualGate::new();
//!
//! let result: Result<&str, &str> = gate.run(|| {
//!     // ... perform the throttled call ...
//!     Ok("response")
//! });
//! # let _ = result;
//! ```

use std::time::{Duration, Instant};

use crate::config::{ErrorAccounting, GateConfig, defaults};
use crate::error::GateError;
use crate::window::SlidingWindowLimiter;

/// Admission gate enforcing a request-volume and an error-volume limit
/// together.
///
/// [`admit`](Self::admit) blocks until both limits allow another call;
/// [`complete`](Self::complete) must then be called exactly once, on every
/// path including failures. A missed completion leaks a slot and eventually
/// starves all callers; [`run`](Self::run) pairs the two automatically.
#[derive(Debug)]
pub struct DualGate {
    requests: SlidingWindowLimiter,
    errors: SlidingWindowLimiter,
    error_accounting: ErrorAccounting,
}

impl DualGate {
    /// Create a gate with the default deployment limits
    /// ([`defaults`](crate::config::defaults)).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gate from an explicit configuration.
    pub fn with_config(config: GateConfig) -> Result<Self, GateError> {
        Ok(Self {
            requests: SlidingWindowLimiter::new(config.request_limit, config.request_window)?,
            errors: SlidingWindowLimiter::new(config.error_limit, config.error_window)?,
            error_accounting: config.error_accounting,
        })
    }

    /// Block until every limit allows another call, reserving capacity on
    /// both limiters. Returns the total time spent waiting.
    ///
    /// The request limiter is always reserved first, so a call stuck behind
    /// the request limit never consumes error capacity while it waits. The
    /// error slot is reserved before the outcome is known (see
    /// [`ErrorAccounting::Pessimistic`]) and excused retroactively by a
    /// successful [`complete`](Self::complete).
    pub fn admit(&self) -> Duration {
        let start = Instant::now();
        self.requests.reserve();
        if self.error_accounting == ErrorAccounting::Pessimistic {
            self.errors.reserve();
        }
        let waited = start.elapsed();
        tracing::trace!(?waited, "call admitted");
        waited
    }

    /// Report that an admitted call finished.
    ///
    /// Releases both limiters with the current time. A successful call's
    /// error slot is removed without ever counting against the error limit;
    /// a failed call's slot counts until it ages out of the error window.
    ///
    /// Must be called exactly once per [`admit`](Self::admit), on every
    /// path including failures.
    ///
    /// # Panics
    ///
    /// Panics if there is no matching outstanding `admit`.
    pub fn complete(&self, success: bool) {
        let finished = Instant::now();
        self.requests.release(finished, false);
        if self.error_accounting == ErrorAccounting::Pessimistic {
            self.errors.release(finished, success);
        }
    }

    /// Run an action under the gate, pairing admission and completion.
    ///
    /// Admits before invoking `action` and completes with
    /// `success = result.is_ok()` afterwards, on both paths. A panic in
    /// `action` propagates and leaks the reserved slots.
    pub fn run<T, E>(&self, action: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.admit();
        let result = action();
        self.complete(result.is_ok());
        result
    }
}

impl Default for DualGate {
    fn default() -> Self {
        Self {
            requests: SlidingWindowLimiter::from_parts(
                defaults::REQUEST_LIMIT,
                defaults::REQUEST_WINDOW,
            ),
            errors: SlidingWindowLimiter::from_parts(defaults::ERROR_LIMIT, defaults::ERROR_WINDOW),
            error_accounting: ErrorAccounting::Pessimistic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(request: (usize, u64), error: (usize, u64)) -> GateConfig {
        GateConfig {
            request_limit: request.0,
            request_window: Duration::from_millis(request.1),
            error_limit: error.0,
            error_window: Duration::from_millis(error.1),
            error_accounting: ErrorAccounting::Pessimistic,
        }
    }

    #[test]
    fn test_default_gate_uses_deployment_limits() {
        let gate = DualGate::new();
        assert_eq!(gate.requests.limit(), defaults::REQUEST_LIMIT);
        assert_eq!(gate.requests.window(), defaults::REQUEST_WINDOW);
        assert_eq!(gate.errors.limit(), defaults::ERROR_LIMIT);
        assert_eq!(gate.errors.window(), defaults::ERROR_WINDOW);
    }

    #[test]
    fn test_with_config_rejects_invalid_limits() {
        assert!(DualGate::with_config(config((0, 100), (1, 100))).is_err());
        assert!(DualGate::with_config(config((1, 100), (0, 100))).is_err());
        assert!(DualGate::with_config(config((1, 0), (1, 100))).is_err());
    }

    #[test]
    fn test_admit_without_contention_is_fast() {
        let gate = DualGate::with_config(config((5, 100), (5, 1000))).unwrap();
        let waited = gate.admit();
        gate.complete(true);
        assert!(waited < Duration::from_millis(20), "waited {waited:?}");
    }

    #[test]
    fn test_success_frees_error_slot_immediately() {
        // The error window is far too long to age out during the test, so a
        // second admission is only possible if success returned the slot.
        let gate = DualGate::with_config(config((10, 10), (1, 10_000))).unwrap();
        gate.admit();
        gate.complete(true);

        let waited = gate.admit();
        gate.complete(true);
        assert!(waited < Duration::from_millis(50), "waited {waited:?}");
    }

    #[test]
    fn test_failure_holds_error_slot_for_the_window() {
        let gate = DualGate::with_config(config((10, 10), (1, 200))).unwrap();
        gate.admit();
        gate.complete(false);

        let waited = gate.admit();
        gate.complete(true);
        assert!(waited >= Duration::from_millis(150), "waited {waited:?}");
    }

    #[test]
    fn test_disabled_error_accounting_skips_error_limiter() {
        let mut cfg = config((10, 10), (1, 10_000));
        cfg.error_accounting = ErrorAccounting::Disabled;
        let gate = DualGate::with_config(cfg).unwrap();

        gate.admit();
        gate.complete(false);
        // Would block ten seconds if the failure counted.
        let waited = gate.admit();
        gate.complete(false);
        assert!(waited < Duration::from_millis(50), "waited {waited:?}");
        assert_eq!(gate.errors.remaining(), 1);
    }

    #[test]
    fn test_run_completes_on_both_paths() {
        let gate = DualGate::with_config(config((4, 10), (2, 10_000))).unwrap();

        let ok: Result<u32, &str> = gate.run(|| Ok(7));
        assert_eq!(ok, Ok(7));
        // Success released its error slot without counting.
        assert_eq!(gate.errors.remaining(), 2);

        let err: Result<u32, &str> = gate.run(|| Err("boom"));
        assert_eq!(err, Err("boom"));
        // Failure left a completed record in the error window.
        assert_eq!(gate.errors.remaining(), 1);
    }
}

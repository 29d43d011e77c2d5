//! # rate-gate
//!
//! A thread-safe sliding-window rate limiter and a dual admission gate that
//! throttles outbound calls against two independent budgets at once: total
//! call volume and error volume.
//!
//! ## Features
//!
//! - Blocking, infallible reservation with lazy window expiry and no timers
//! - Pessimistic error accounting: every call holds an error slot until its
//!   outcome is known; successes never count
//! - Configurable limits with sensible deployment defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use rate_gate::DualGate;
//!
//! let gate = DualGate::new();
//!
//! let waited = gate.admit();
//! // ... perform the throttled call ...
//! gate.complete(true);
//! # let _ = waited;
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod window;

// Re-export commonly used types at crate root
pub use config::{ErrorAccounting, GateConfig};
pub use error::GateError;
pub use gate::DualGate;
pub use window::SlidingWindowLimiter;

/// Result type alias using GateError
pub type Result<T> = std::result::Result<T, GateError>;

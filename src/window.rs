//! Sliding-window rate limiting for a single resource.
//!
//! Tracks up to `limit` in-flight or recently finished uses inside a
//! trailing time window. [`SlidingWindowLimiter::reserve`] blocks while the
//! window is full; capacity frees itself as completed uses age out. There
//! are no timers: expiry is checked lazily on every reservation attempt.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use rate_gate::SlidingWindowLimiter;
//!
//! let limiter = SlidingWindowLimiter::new(5, Duration::from_secs(1))?;
//!
//! limiter.reserve();
//! // ... perform the throttled action ...
//! limiter.release(Instant::now(), false);
//! # Ok::<(), rate_gate::GateError>(())
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::GateError;

/// Margin added to computed sleeps so a sleeper never wakes exactly on the
/// expiry boundary and finds the front record not yet evictable.
const WAKE_MARGIN: Duration = Duration::from_millis(1);

/// One unit of capacity, occupied from reservation until expiry or removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Reserved; the action has not finished yet.
    Pending,
    /// The action finished at this instant. Counts against the limit until
    /// it ages out of the window.
    Completed(Instant),
}

/// A thread-safe sliding-window rate limiter.
///
/// At most `limit` slots may be outstanding at once, where a slot stays
/// outstanding from [`reserve`](Self::reserve) until its completion
/// timestamp falls out of the trailing `window`. Slots are tracked
/// oldest-first; capacity frees from the front as completed slots expire.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    recents: Mutex<VecDeque<Slot>>,
    freed: Condvar,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `limit` uses per trailing `window`.
    pub fn new(limit: usize, window: Duration) -> Result<Self, GateError> {
        if limit == 0 {
            return Err(GateError::InvalidLimit);
        }
        if window.is_zero() {
            return Err(GateError::InvalidWindow(window));
        }
        Ok(Self::from_parts(limit, window))
    }

    /// Construct without validation. Callers pass known-good constants.
    pub(crate) fn from_parts(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            recents: Mutex::new(VecDeque::with_capacity(limit)),
            freed: Condvar::new(),
        }
    }

    /// Maximum uses per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Trailing window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Block until a slot is free, then occupy it.
    ///
    /// Call this before starting the throttled action and pair it with
    /// exactly one [`release`](Self::release) afterwards. Safe to call from
    /// any number of threads. There is no timeout: if no capacity is ever
    /// released this blocks indefinitely.
    pub fn reserve(&self) {
        let mut recents = self.lock();
        forget_old(&mut recents, self.window);

        if recents.len() == self.limit {
            tracing::debug!(limit = self.limit, "window full, waiting for a free slot");
            let blocked_at = Instant::now();

            while recents.len() == self.limit {
                // The queue is full and non-empty, so there is a front slot.
                match recents.front().copied() {
                    Some(Slot::Completed(finished)) => {
                        // The front slot expires at finished + window. Wait
                        // that long, but let a release wake us early: it may
                        // remove a non-counting slot or change the front.
                        let wake_at = finished + self.window + WAKE_MARGIN;
                        let timeout = wake_at.saturating_duration_since(Instant::now());
                        recents = self
                            .freed
                            .wait_timeout(recents, timeout)
                            .unwrap_or_else(PoisonError::into_inner)
                            .0;
                    }
                    _ => {
                        // Oldest slot is still pending; no wake time is
                        // computable until some release happens.
                        recents = self
                            .freed
                            .wait(recents)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                }
                forget_old(&mut recents, self.window);
            }

            tracing::debug!(waited = ?blocked_at.elapsed(), "slot freed after wait");
        }

        recents.push_back(Slot::Pending);
    }

    /// Occupy a slot only if one is free right now.
    ///
    /// Returns `true` if a pending slot was taken (pair it with
    /// [`release`](Self::release)), `false` if the window is full.
    pub fn try_reserve(&self) -> bool {
        let mut recents = self.lock();
        forget_old(&mut recents, self.window);
        if recents.len() < self.limit {
            recents.push_back(Slot::Pending);
            true
        } else {
            false
        }
    }

    /// Number of slots free right now.
    pub fn remaining(&self) -> usize {
        let mut recents = self.lock();
        forget_old(&mut recents, self.window);
        self.limit - recents.len()
    }

    /// Give a slot back after the action finished.
    ///
    /// Stamps the oldest pending slot with `finished`; it keeps counting
    /// against the limit until it ages out of the window. With
    /// `does_not_count` the pending slot is instead removed outright,
    /// restoring the limiter to its state before the matching
    /// [`reserve`](Self::reserve).
    ///
    /// Wakes every thread blocked in [`reserve`](Self::reserve).
    ///
    /// # Panics
    ///
    /// Panics if no pending slot exists, i.e. there is no matching
    /// outstanding `reserve`. That is a caller bug, not a recoverable
    /// condition.
    pub fn release(&self, finished: Instant, does_not_count: bool) {
        let mut recents = self.lock();
        if does_not_count {
            let position = recents
                .iter()
                .position(|slot| *slot == Slot::Pending)
                .expect("release without a matching reserve");
            let _ = recents.remove(position);
        } else {
            let slot = recents
                .iter_mut()
                .find(|slot| **slot == Slot::Pending)
                .expect("release without a matching reserve");
            *slot = Slot::Completed(finished);
        }
        tracing::trace!(does_not_count, "slot released");
        self.freed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Slot>> {
        self.recents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop front records that have aged out of the window. Lock must be held.
fn forget_old(recents: &mut VecDeque<Slot>, window: Duration) {
    let now = Instant::now();
    while let Some(Slot::Completed(finished)) = recents.front() {
        if now.duration_since(*finished) > window {
            recents.pop_front();
        } else {
            break;
        }
    }
}

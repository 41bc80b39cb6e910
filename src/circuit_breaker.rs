//! # Circuit Breaker Module
//!
//! Stops hammering the recipe provider after repeated failures. Once the
//! failure threshold is reached, calls fail fast until the reset timeout
//! has elapsed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for provider calls
///
/// # State Machine
///
/// - **Closed**: requests pass through
/// - **Open**: failure threshold reached, requests fail fast
/// - after `circuit_breaker_reset_secs` the breaker closes again and the
///   next request is let through
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    /// Create a new, closed circuit breaker
    ///
    /// # Examples
    ///
    /// ```rust
    /// use meal_planner::circuit_breaker::CircuitBreaker;
    /// use meal_planner::config::RecoveryConfig;
    ///
    /// let breaker = CircuitBreaker::new(RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the circuit is open (blocking requests)
    ///
    /// Resets to closed once the reset timeout has elapsed since the last failure.
    pub fn is_open(&self) -> bool {
        let mut state = self.state();

        if state.failure_count >= self.config.circuit_breaker_threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < Duration::from_secs(self.config.circuit_breaker_reset_secs) {
                    return true;
                }
                *state = BreakerState::default();
            }
        }
        false
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut state = self.state();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
    }

    /// Record a successful call, closing the circuit
    pub fn record_success(&self) {
        *self.state() = BreakerState::default();
    }

    /// Number of consecutive failures recorded
    pub fn failure_count(&self) -> u32 {
        self.state().failure_count
    }
}

//! Rate limiting for credential verification.
//!
//! Per-client fixed windows: the first counted attempt opens the window, and
//! once the ceiling is hit every further attempt for that key is refused
//! until the window elapses. Only the login path consults the guard.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    Limited,
}

pub trait AbuseGuard: Send + Sync {
    /// Count one attempt for `key` and report whether it is within the
    /// ceiling.
    fn check_and_count(&self, key: &str) -> GuardDecision;
}

/// Guard that never limits; useful for wiring and tests.
#[derive(Clone, Debug)]
pub struct NoopGuard;

impl AbuseGuard for NoopGuard {
    fn check_and_count(&self, _key: &str) -> GuardDecision {
        GuardDecision::Allowed
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by client address.
#[derive(Debug)]
pub struct FixedWindowGuard {
    window: Duration,
    max_attempts: u32,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowGuard {
    #[must_use]
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            window,
            max_attempts,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl AbuseGuard for FixedWindowGuard {
    fn check_and_count(&self, key: &str) -> GuardDecision {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Drop windows that have rolled over so the map does not grow with
        // every client ever seen.
        windows.retain(|_, window| window.started.elapsed() < self.window);

        let window = windows.entry(key.to_string()).or_insert_with(|| Window {
            started: Instant::now(),
            count: 0,
        });
        window.count = window.count.saturating_add(1);

        if window.count <= self.max_attempts {
            GuardDecision::Allowed
        } else {
            GuardDecision::Limited
        }
    }
}

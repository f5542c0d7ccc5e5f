//! Per-caller rate limiting for tool calls.
//!
//! True sliding window: each identifier keeps the timestamps of its admitted
//! requests within the last window, so a burst recovers as soon as the oldest
//! timestamp ages out rather than at a fixed window boundary.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window limiter keyed by an opaque caller identifier.
///
/// Not internally synchronized; the owning service wraps it in a `Mutex`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    windows: HashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Admit or reject a request. A rejected request is not recorded, so it
    /// does not consume a slot.
    pub fn is_allowed(&mut self, identifier: &str) -> bool {
        self.is_allowed_at(identifier, Instant::now())
    }

    fn is_allowed_at(&mut self, identifier: &str, now: Instant) -> bool {
        let window = self.windows.entry(identifier.to_string()).or_default();
        Self::prune(window, now, self.config.window);

        if window.len() >= self.config.max_requests as usize {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Slots left for the identifier in the current window.
    pub fn remaining(&mut self, identifier: &str) -> u32 {
        self.remaining_at(identifier, Instant::now())
    }

    fn remaining_at(&mut self, identifier: &str, now: Instant) -> u32 {
        let used = match self.windows.get_mut(identifier) {
            Some(window) => {
                Self::prune(window, now, self.config.window);
                window.len() as u32
            }
            None => 0,
        };
        self.config.max_requests.saturating_sub(used)
    }

    /// Time until the oldest recorded request ages out. Zero for an empty
    /// window.
    pub fn reset_time(&mut self, identifier: &str) -> Duration {
        self.reset_time_at(identifier, Instant::now())
    }

    fn reset_time_at(&mut self, identifier: &str, now: Instant) -> Duration {
        match self.windows.get_mut(identifier) {
            Some(window) => {
                Self::prune(window, now, self.config.window);
                match window.front() {
                    Some(oldest) => (*oldest + self.config.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            }
            None => Duration::ZERO,
        }
    }

    /// Drop identifiers whose windows have fully aged out, to bound memory.
    pub fn cleanup(&mut self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&mut self, now: Instant) {
        let horizon = self.config.window;
        self.windows.retain(|_, window| {
            Self::prune(window, now, horizon);
            !window.is_empty()
        });
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.windows.len()
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant, horizon: Duration) {
        while let Some(front) = window.front() {
            if now.duration_since(*front) >= horizon {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_ms: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_millis(window_ms),
        })
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let mut l = limiter(3, 1000);
        let t0 = Instant::now();

        assert!(l.is_allowed_at("alice", t0));
        assert!(l.is_allowed_at("alice", t0));
        assert!(l.is_allowed_at("alice", t0));
        assert!(!l.is_allowed_at("alice", t0));
    }

    #[test]
    fn window_expiry_readmits() {
        let mut l = limiter(3, 1000);
        let t0 = Instant::now();

        for _ in 0..3 {
            assert!(l.is_allowed_at("alice", t0));
        }
        assert!(!l.is_allowed_at("alice", t0 + Duration::from_millis(500)));
        assert!(l.is_allowed_at("alice", t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn rejected_request_does_not_consume_a_slot() {
        let mut l = limiter(2, 1000);
        let t0 = Instant::now();

        assert!(l.is_allowed_at("alice", t0));
        assert!(l.is_allowed_at("alice", t0 + Duration::from_millis(100)));
        // Hammering while full records nothing.
        for i in 0..10 {
            assert!(!l.is_allowed_at("alice", t0 + Duration::from_millis(200 + i)));
        }
        // As soon as the first timestamp ages out, one slot opens, even
        // though the second is still inside the window.
        assert!(l.is_allowed_at("alice", t0 + Duration::from_millis(1001)));
        assert!(!l.is_allowed_at("alice", t0 + Duration::from_millis(1002)));
    }

    #[test]
    fn identifiers_are_independent() {
        let mut l = limiter(1, 1000);
        let t0 = Instant::now();

        assert!(l.is_allowed_at("alice", t0));
        assert!(!l.is_allowed_at("alice", t0));
        assert!(l.is_allowed_at("bob", t0));
    }

    #[test]
    fn remaining_never_negative() {
        let mut l = limiter(2, 1000);
        let t0 = Instant::now();

        assert_eq!(l.remaining_at("alice", t0), 2);
        l.is_allowed_at("alice", t0);
        l.is_allowed_at("alice", t0);
        assert_eq!(l.remaining_at("alice", t0), 0);
        assert_eq!(l.remaining_at("alice", t0 + Duration::from_millis(1000)), 2);
    }

    #[test]
    fn reset_time_tracks_oldest_entry() {
        let mut l = limiter(2, 1000);
        let t0 = Instant::now();

        assert_eq!(l.reset_time_at("alice", t0), Duration::ZERO);
        l.is_allowed_at("alice", t0);
        assert_eq!(
            l.reset_time_at("alice", t0 + Duration::from_millis(400)),
            Duration::from_millis(600)
        );
    }

    #[test]
    fn cleanup_drops_aged_out_identifiers() {
        let mut l = limiter(2, 1000);
        let t0 = Instant::now();

        l.is_allowed_at("alice", t0);
        l.is_allowed_at("bob", t0 + Duration::from_millis(800));
        assert_eq!(l.tracked_identifiers(), 2);

        l.cleanup_at(t0 + Duration::from_millis(1200));
        assert_eq!(l.tracked_identifiers(), 1);

        l.cleanup_at(t0 + Duration::from_millis(2000));
        assert_eq!(l.tracked_identifiers(), 0);
    }
}

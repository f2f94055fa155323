use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Number of tracked keys that triggers the first sweep of expired entries.
const SWEEP_THRESHOLD: usize = 1024;

struct Attempts {
    by_key: HashMap<String, VecDeque<Instant>>,
    sweep_at: usize,
}

/// Sliding-window counter of login attempts, keyed by login email.
pub struct RateLimiter {
    attempts: Mutex<Attempts>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: Mutex::new(Attempts {
                by_key: HashMap::new(),
                sweep_at: SWEEP_THRESHOLD,
            }),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Attempts> {
        // Every update leaves the map valid, so a poisoned lock is still usable.
        self.attempts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prune(entry: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while entry.front().is_some_and(|&at| now.duration_since(at) >= window) {
            entry.pop_front();
        }
    }

    /// Drops every key whose window has expired. The next sweep waits until
    /// the map has doubled.
    fn sweep(&self, attempts: &mut Attempts, now: Instant) {
        attempts.by_key.retain(|_, entry| {
            Self::prune(entry, now, self.window);
            !entry.is_empty()
        });
        attempts.sweep_at = (attempts.by_key.len() * 2).max(SWEEP_THRESHOLD);
    }

    /// Counts an attempt for `key` unless it already used up the window.
    /// Check and count share one lock; concurrent callers never exceed
    /// `max_attempts` between them.
    pub fn try_acquire(&self, key: &str) -> bool {
        let mut attempts = self.lock();
        let now = Instant::now();

        if !attempts.by_key.contains_key(key) && attempts.by_key.len() >= attempts.sweep_at {
            self.sweep(&mut attempts, now);
        }

        let entry = attempts.by_key.entry(key.to_string()).or_default();
        Self::prune(entry, now, self.window);
        if entry.len() >= self.max_attempts {
            return false;
        }
        entry.push_back(now);
        true
    }

    /// Forgets all attempts for `key`, after a successful login.
    pub fn clear(&self, key: &str) {
        self.lock().by_key.remove(key);
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.lock().by_key.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread::{self, sleep};

    #[test]
    fn test_rate_limiter_allows_under_limit() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.try_acquire("a@x.com"));
        assert!(limiter.try_acquire("a@x.com"));
        assert!(limiter.try_acquire("a@x.com"));
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let limiter = RateLimiter::new(2, 60);

        assert!(limiter.try_acquire("a@x.com"));
        assert!(limiter.try_acquire("a@x.com"));
        assert!(!limiter.try_acquire("a@x.com"));
        assert!(!limiter.try_acquire("a@x.com"));
        assert!(limiter.try_acquire("b@x.com"));
    }

    #[test]
    fn test_rate_limiter_window_expires() {
        let limiter = RateLimiter::new(1, 1);

        assert!(limiter.try_acquire("a@x.com"));
        assert!(!limiter.try_acquire("a@x.com"));

        sleep(Duration::from_millis(1100));

        assert!(limiter.try_acquire("a@x.com"));
    }

    #[test]
    fn test_rate_limiter_clear() {
        let limiter = RateLimiter::new(1, 60);

        assert!(limiter.try_acquire("a@x.com"));
        assert!(!limiter.try_acquire("a@x.com"));

        limiter.clear("a@x.com");
        assert!(limiter.try_acquire("a@x.com"));
    }

    #[test]
    fn test_rate_limiter_concurrent_callers_share_the_limit() {
        let limiter = Arc::new(RateLimiter::new(5, 60));
        let granted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let granted = Arc::clone(&granted);
                thread::spawn(move || {
                    if limiter.try_acquire("a@x.com") {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(granted.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_rate_limiter_sweeps_expired_keys() {
        let limiter = RateLimiter::new(5, 1);

        for i in 0..(SWEEP_THRESHOLD * 2) {
            assert!(limiter.try_acquire(&format!("user{}@x.com", i)));
        }
        assert_eq!(limiter.tracked_keys(), SWEEP_THRESHOLD * 2);

        sleep(Duration::from_millis(1100));

        assert!(limiter.try_acquire("late@x.com"));
        assert_eq!(limiter.tracked_keys(), 1);
    }
}

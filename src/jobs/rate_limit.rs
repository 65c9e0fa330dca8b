//! Per-client sliding-window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Admits at most `limit` submissions per client within any `window`.
pub(crate) struct ClientRateLimiter {
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
    limit: usize,
    window: Duration,
}

impl ClientRateLimiter {
    /// A `limit` of 0 disables limiting.
    pub(crate) fn new(limit: usize, window: Duration) -> Self {
        ClientRateLimiter {
            clients: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    /// Records a submission for `client` if it is within its budget.
    ///
    /// Returns `false`, recording nothing, when the budget is spent.
    pub(crate) async fn try_acquire(&self, client: &str) -> bool {
        if self.limit == 0 {
            return true;
        }
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let stamps = clients.entry(client.to_string()).or_default();

        // Remove old entries outside the time window
        while let Some(front) = stamps.front() {
            if now.duration_since(*front) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.limit {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Drops clients with no submissions inside the window.
    pub(crate) async fn sweep(&self) {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        clients.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
    }

    #[cfg(test)]
    pub(crate) async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_client() {
        let limiter = ClientRateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("a").await);
        assert!(!limiter.try_acquire("a").await);
        // Other clients have their own budget
        assert!(limiter.try_acquire("b").await);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = ClientRateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.try_acquire("a").await);
        assert!(!limiter.try_acquire("a").await);
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(limiter.try_acquire("a").await);
    }

    #[tokio::test]
    async fn test_zero_limit_disables() {
        let limiter = ClientRateLimiter::new(0, Duration::from_secs(1));
        for _ in 0..100 {
            assert!(limiter.try_acquire("a").await);
        }
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_clients() {
        let limiter = ClientRateLimiter::new(5, Duration::from_millis(20));
        limiter.try_acquire("a").await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        limiter.sweep().await;
        assert_eq!(limiter.tracked_clients().await, 0);
    }
}

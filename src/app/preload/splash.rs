//! Minimum-display splash gate

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use super::state::PreloadHandle;

/// Decides when a loading screen may be dismissed
///
/// Dismissal needs both the minimum display time to have passed and the
/// preload to be ready. It happens at most once.
#[derive(Debug)]
pub struct SplashGate {
    min_display: Duration,
    started: Instant,
    dismissed: AtomicBool,
}

impl SplashGate {
    /// Start the display clock now
    pub fn start(min_display: Duration) -> Self {
        Self {
            min_display,
            started: Instant::now(),
            dismissed: AtomicBool::new(false),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::Acquire)
    }

    /// Dismiss if allowed. Returns `true` only for the call that dismissed.
    pub fn try_dismiss(&self, is_ready: bool) -> bool {
        if !is_ready || self.elapsed() < self.min_display {
            return false;
        }
        self.dismissed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Wait for readiness and the minimum display time, then dismiss
    ///
    /// Returns `false` if another caller dismissed first.
    pub async fn wait(&self, preload: &PreloadHandle) -> bool {
        preload.wait_ready().await;
        tokio::time::sleep_until(self.started + self.min_display).await;
        let dismissed = self.try_dismiss(true);
        if dismissed {
            tracing::debug!("Splash dismissed after {:?}", self.elapsed());
        }
        dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::preload::state::PreloadCache;

    #[tokio::test(start_paused = true)]
    async fn test_not_dismissed_before_minimum() {
        let gate = SplashGate::start(Duration::from_millis(1500));
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(!gate.try_dismiss(true));

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(gate.try_dismiss(true));
        assert!(gate.is_dismissed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_dismissed_until_ready() {
        let gate = SplashGate::start(Duration::from_millis(1500));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!gate.try_dismiss(false));
        assert!(!gate.is_dismissed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_exactly_once() {
        let gate = SplashGate::start(Duration::ZERO);
        assert!(gate.try_dismiss(true));
        assert!(!gate.try_dismiss(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_holds_for_minimum_when_ready_early() {
        let preload = PreloadHandle::new();
        preload.publish(PreloadCache::default()).unwrap();

        let gate = SplashGate::start(Duration::from_millis(1500));
        assert!(gate.wait(&preload).await);
        assert!(gate.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_holds_for_readiness_when_slow() {
        let preload = PreloadHandle::new();
        let publisher = {
            let preload = preload.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                preload.publish(PreloadCache::default()).unwrap();
            })
        };

        let gate = SplashGate::start(Duration::from_millis(1500));
        assert!(gate.wait(&preload).await);
        assert!(gate.elapsed() >= Duration::from_secs(3));
        publisher.await.unwrap();
    }
}

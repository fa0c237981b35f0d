//! Delays between simulated actions
//!
//! Every high-level interaction is split into discrete steps (one key, one
//! pointer action). Between two steps the session waits according to its
//! [`ActionDelay`]:
//!
//! - no delay: steps run back to back without yielding
//! - `0` ms: the task yields to the scheduler once
//! - `n` ms: the task sleeps for roughly `n` ms
//!
//! A variance factor spreads the sleep around its nominal value so runs that
//! want human-looking pacing do not produce a fixed rhythm.
//!
//! # Example
//!
//! ```rust
//! use ki_user_event::input::timing::ActionDelay;
//! use std::time::Duration;
//!
//! let delay = ActionDelay::millis(100).with_variance(0.3);
//! let step = delay.next_duration().unwrap();
//! assert!(step >= Duration::from_millis(70) && step <= Duration::from_millis(130));
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Callback invoked with each delay before waiting on it, e.g. to advance a
/// fake clock driving the code under test.
pub type AdvanceTimers = Arc<dyn Fn(Duration) + Send + Sync>;

/// Configuration for the pause between two simulated steps
#[derive(Clone, Default)]
pub struct ActionDelay {
    /// Nominal delay in milliseconds, `None` to skip waiting entirely
    pub delay_ms: Option<u64>,
    /// Variance factor (0.0 - 1.0) for timing randomization
    pub variance: f64,
    advance_timers: Option<AdvanceTimers>,
}

impl std::fmt::Debug for ActionDelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDelay")
            .field("delay_ms", &self.delay_ms)
            .field("variance", &self.variance)
            .field("advance_timers", &self.advance_timers.is_some())
            .finish()
    }
}

impl ActionDelay {
    /// Steps run without any pause
    pub fn none() -> Self {
        Self::default()
    }

    /// Yield to the scheduler between steps without sleeping
    pub fn yield_only() -> Self {
        Self::millis(0)
    }

    /// Sleep `ms` milliseconds between steps
    pub fn millis(ms: u64) -> Self {
        Self {
            delay_ms: Some(ms),
            ..Self::default()
        }
    }

    /// Sets the variance factor, clamped to 0.0 - 1.0
    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance.clamp(0.0, 1.0);
        self
    }

    /// Registers a callback receiving each delay before the wait
    pub fn with_advance_timers(mut self, advance: AdvanceTimers) -> Self {
        self.advance_timers = Some(advance);
        self
    }

    /// Duration of the next pause, `None` when steps are not separated
    pub fn next_duration(&self) -> Option<Duration> {
        let ms = self.delay_ms?;
        if ms == 0 || self.variance == 0.0 {
            return Some(Duration::from_millis(ms));
        }
        let spread = (ms as f64 * self.variance).round() as u64;
        Some(random_delay_in_range(
            ms.saturating_sub(spread),
            ms + spread,
            self.variance,
        ))
    }

    /// Waits between two steps
    pub async fn wait(&self) {
        let Some(duration) = self.next_duration() else {
            return;
        };
        if let Some(advance) = &self.advance_timers {
            advance(duration);
        }
        if duration.is_zero() {
            tokio::task::yield_now().await;
        } else {
            trace!(ms = duration.as_millis() as u64, "waiting between steps");
            tokio::time::sleep(duration).await;
        }
    }
}

/// Generates a random delay within a range with normal distribution
///
/// Uses the Box-Muller transform so values cluster around the middle of
/// the range.
///
/// # Arguments
///
/// * `min_ms` - Minimum delay in milliseconds
/// * `max_ms` - Maximum delay in milliseconds
/// * `variance` - How much the delay can vary (0.0 - 1.0)
pub fn random_delay_in_range(min_ms: u64, max_ms: u64, variance: f64) -> Duration {
    if min_ms >= max_ms {
        return Duration::from_millis(min_ms);
    }

    let mean = (min_ms + max_ms) as f64 / 2.0;
    let range = (max_ms - min_ms) as f64;
    let std_dev = range * variance / 2.0;

    let delay = normal_random(mean, std_dev);
    let delay_ms = delay.round().clamp(min_ms as f64, max_ms as f64) as u64;

    Duration::from_millis(delay_ms)
}

fn normal_random(mean: f64, std_dev: f64) -> f64 {
    // Box-Muller transform
    let u1: f64 = rand::random::<f64>().max(1e-10); // Avoid log(0)
    let u2: f64 = rand::random();

    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

    mean + z * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_no_delay() {
        assert_eq!(ActionDelay::none().next_duration(), None);
        assert_eq!(
            ActionDelay::yield_only().next_duration(),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_random_delay_in_range() {
        for _ in 0..100 {
            let delay = random_delay_in_range(50, 150, 0.3);
            let ms = delay.as_millis() as u64;
            assert!((50..=150).contains(&ms));
        }
    }

    #[test]
    fn test_random_delay_edge_case() {
        assert_eq!(random_delay_in_range(100, 100, 0.5).as_millis(), 100);
        assert_eq!(random_delay_in_range(150, 100, 0.5).as_millis(), 150);
    }

    #[test]
    fn test_variance_is_clamped() {
        let delay = ActionDelay::millis(10).with_variance(4.0);
        assert_eq!(delay.variance, 1.0);
        for _ in 0..20 {
            let ms = delay.next_duration().unwrap().as_millis();
            assert!(ms <= 20);
        }
    }

    #[tokio::test]
    async fn test_wait_reports_to_advance_timers() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let delay = ActionDelay::millis(1).with_advance_timers(Arc::new(move |d| {
            sink.fetch_add(d.as_millis() as u64, Ordering::SeqCst);
        }));
        delay.wait().await;
        delay.wait().await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_none_does_not_call_advance_timers() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let delay = ActionDelay::none().with_advance_timers(Arc::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));
        delay.wait().await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}

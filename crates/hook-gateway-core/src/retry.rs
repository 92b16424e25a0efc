//! # Retry Module
//!
//! Exponential backoff for transient handler failures, bounded by total
//! elapsed time rather than by attempt count.
//!
//! The number of attempts is unbounded in principle; the wall-clock exposure
//! is not. A backoff is only granted when the time already spent plus the
//! next delay stays within [`RetryPolicy::max_elapsed_time`].

use crate::shutdown::ShutdownSignal;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Retry policy configuration for exponential backoff
///
/// # Examples
///
/// ```rust
/// use hook_gateway_core::RetryPolicy;
/// use std::time::Duration;
///
/// // Default policy: 500ms initial, 1.5x multiplier, 60s cap, 30s budget
/// let policy = RetryPolicy::default();
///
/// // Tighter budget for a latency-sensitive deployment
/// let policy = RetryPolicy::new(Duration::from_secs(10));
/// assert_eq!(policy.max_elapsed_time, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,

    /// Exponential growth factor applied after every backoff
    pub multiplier: f64,

    /// Maximum delay between two attempts
    pub max_interval: Duration,

    /// Total time budget measured from the first attempt
    pub max_elapsed_time: Duration,

    /// Jitter range as a fraction of the current interval (0.5 = ±50%)
    pub randomization_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: Duration::from_secs(30),
            randomization_factor: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Create a default policy with a custom elapsed-time budget
    pub fn new(max_elapsed_time: Duration) -> Self {
        Self {
            max_elapsed_time,
            ..Self::default()
        }
    }

    /// Disable jitter (deterministic delays, mostly useful in tests)
    pub fn without_jitter(mut self) -> Self {
        self.randomization_factor = 0.0;
        self
    }

    /// Set custom randomization factor (0.0 to 1.0)
    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Start a fresh backoff sequence; the elapsed clock starts now.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.clone())
    }
}

/// Stateful backoff sequence for a single retry loop.
///
/// Delays never decrease: jitter is applied around the current interval, but
/// a delay is never shorter than the one handed out before it.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    policy: RetryPolicy,
    current_interval: Duration,
    last_delay: Duration,
    started_at: Instant,
}

impl ExponentialBackoff {
    pub fn new(policy: RetryPolicy) -> Self {
        let current_interval = policy.initial_interval;
        Self {
            policy,
            current_interval,
            last_delay: Duration::ZERO,
            started_at: Instant::now(),
        }
    }

    /// Time spent since the sequence started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Next delay, or `None` once waiting would exceed the elapsed budget.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        let delay = self
            .randomized(self.current_interval)
            .min(self.policy.max_interval)
            .max(self.last_delay);

        if self.elapsed() + delay > self.policy.max_elapsed_time {
            return None;
        }

        let grown = self.current_interval.as_secs_f64() * self.policy.multiplier;
        self.current_interval = if grown >= self.policy.max_interval.as_secs_f64() {
            self.policy.max_interval
        } else {
            Duration::from_secs_f64(grown)
        };
        self.last_delay = delay;

        Some(delay)
    }

    /// Applies random variation in range [interval * (1-factor), interval * (1+factor)]
    fn randomized(&self, interval: Duration) -> Duration {
        let factor = self.policy.randomization_factor;
        if factor <= 0.0 {
            return interval;
        }

        let base = interval.as_secs_f64();
        let delta = base * factor;
        let value = rand::thread_rng().gen_range((base - delta)..=(base + delta));
        Duration::from_secs_f64(value.max(0.0))
    }
}

// ============================================================================
// Retry loop
// ============================================================================

/// Outcome of a single attempt that failed.
#[derive(Debug)]
pub enum BackoffError<E> {
    /// Worth retrying after a delay
    Transient(E),

    /// Retrying cannot help; stop immediately
    Permanent(E),
}

/// Why a retry loop gave up.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E: std::error::Error + 'static> {
    #[error("gave up after {attempts} attempts in {elapsed:?}: {error}")]
    Exhausted {
        #[source]
        error: E,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("permanent failure on attempt {attempts}: {error}")]
    Permanent {
        #[source]
        error: E,
        attempts: u32,
    },

    #[error("cancelled by shutdown after {attempts} attempts")]
    Cancelled { last_error: E, attempts: u32 },
}

impl<E: std::error::Error + 'static> RetryError<E> {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::Permanent { attempts, .. }
            | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// The error reported by the last attempt
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { error, .. } | Self::Permanent { error, .. } => error,
            Self::Cancelled { last_error, .. } => last_error,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, the elapsed budget
/// runs out, or `shutdown` fires.
///
/// Attempts are strictly sequential. `notify` is called with the failing
/// error and the chosen delay before every sleep.
///
/// # Examples
///
/// ```rust
/// use hook_gateway_core::{retry_notify, BackoffError, RetryPolicy, ShutdownSignal};
/// use std::time::Duration;
///
/// # #[derive(Debug)]
/// # struct Flaky;
/// # impl std::fmt::Display for Flaky {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "flaky") }
/// # }
/// # impl std::error::Error for Flaky {}
/// # async fn example() {
/// let policy = RetryPolicy::new(Duration::from_secs(5));
/// let mut shutdown = ShutdownSignal::never();
///
/// let result = retry_notify(
///     &policy,
///     &mut shutdown,
///     || async { Ok::<_, BackoffError<Flaky>>(()) },
///     |error, delay| println!("failed with {error}, retrying in {delay:?}"),
/// )
/// .await;
/// assert!(result.is_ok());
/// # }
/// ```
pub async fn retry_notify<T, E, F, Fut, N>(
    policy: &RetryPolicy,
    shutdown: &mut ShutdownSignal,
    mut operation: F,
    mut notify: N,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackoffError<E>>>,
    N: FnMut(&E, Duration),
{
    let mut backoff = policy.backoff();
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(BackoffError::Permanent(error)) => {
                return Err(RetryError::Permanent { error, attempts })
            }
            Err(BackoffError::Transient(error)) => error,
        };

        let Some(delay) = backoff.next_backoff() else {
            return Err(RetryError::Exhausted {
                error,
                attempts,
                elapsed: backoff.elapsed(),
            });
        };

        if shutdown.is_triggered() {
            return Err(RetryError::Cancelled {
                last_error: error,
                attempts,
            });
        }

        notify(&error, delay);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.triggered() => {
                return Err(RetryError::Cancelled { last_error: error, attempts });
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

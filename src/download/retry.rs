//! Retry policy with exponential backoff.
//!
//! Shared by item downloads and page fetches. A failure is classified into a
//! [`FailureType`]; the [`RetryPolicy`] then decides whether another attempt
//! is allowed and how long to wait before it.
//!
//! # Example
//!
//! ```
//! use workshop_core::download::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::with_max_retries(2);
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

/// Default number of additional attempts after the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default base delay for exponential backoff.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default maximum delay cap.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to delays.
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    Transient,

    /// Failure that won't succeed regardless of retries (e.g. HTTP 404).
    Permanent,

    /// Server rate limiting (HTTP 429); retried with backoff.
    RateLimited,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
///
/// With defaults, delays are approximately: 2s, 4s, 8s, ... capped at 60s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Base delay for the first retry.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Multiplier applied each attempt.
    backoff_multiplier: f32,

    /// Upper bound of random jitter added to each delay.
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES + 1,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// `max_attempts` includes the initial attempt and is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
            ..Self::default()
        }
    }

    /// Creates a policy with a custom total attempt count, defaults otherwise.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Creates a policy allowing `max_retries` attempts after the first.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::with_max_attempts(max_retries.saturating_add(1))
    }

    /// Creates a policy that retries without waiting.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_jitter: Duration::ZERO,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the number of attempts allowed after the first.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_attempts - 1
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the backoff delay following failed attempt `attempt`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let multiplier = f64::from(self.backoff_multiplier);

        // attempt 1 = 1x base
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * multiplier.powf(exponent);

        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    /// Generates random jitter between 0 and `max_jitter`.
    #[allow(clippy::cast_possible_truncation)]
    fn calculate_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(0..=max_ms))
    }
}

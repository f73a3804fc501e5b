//! RetryPolicy - maps a send outcome to the next action
//!
//! Pure decision logic: computes *what* to do and *how long* to wait, never
//! waits itself. Waiting is the stream's job, through the injected clock.

use std::time::Duration;

use contracts::{FailureReason, RetryConfig, SendOutcome};
use rand::Rng;

/// Randomization applied to backoff delays
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Jitter {
    /// Exact delays
    #[default]
    None,
    /// Scale the delay by a random factor in `[1 - ratio, 1 + ratio]`
    Proportional(JitterRatio),
}

/// Jitter ratio, always finite and within `(0, 1]`
///
/// Only built through [`Jitter::proportional`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterRatio(f64);

impl JitterRatio {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Jitter {
    /// Proportional jitter with `ratio` clamped to `[0, 1]`
    ///
    /// Non-finite or non-positive ratios disable jitter.
    pub fn proportional(ratio: f64) -> Self {
        if !ratio.is_finite() || ratio <= 0.0 {
            Self::None
        } else {
            Self::Proportional(JitterRatio(ratio.min(1.0)))
        }
    }

    /// Configured ratio, 0 when disabled
    pub fn ratio(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Proportional(ratio) => ratio.get(),
        }
    }

    pub fn apply(&self, delay: Duration) -> Duration {
        match *self {
            Self::None => delay,
            Self::Proportional(JitterRatio(ratio)) => {
                let factor = rand::rng().random_range((1.0 - ratio)..=(1.0 + ratio));
                delay.mul_f64(factor.max(0.0))
            }
        }
    }
}

/// What the stream does after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Batch delivered, stream ends
    Complete,
    /// Send again immediately
    RetryNow,
    /// Send the same batch again after `delay`
    RetryAfter {
        delay: Duration,
        /// Whether this retry moves the exponential sequence forward
        advances_backoff: bool,
    },
    /// Split the batch and dispatch both halves independently
    Split,
    /// Terminal failure
    GiveUp(FailureReason),
}

/// Exponential backoff with optional jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// `max_delay` below `base_delay` is raised to `base_delay`
    pub fn new(base_delay: Duration, max_delay: Duration, jitter: Jitter) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            jitter,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.base_delay(),
            config.max_delay(),
            Jitter::proportional(config.jitter_ratio),
        )
    }

    /// Same policy with jitter disabled
    pub fn without_jitter(mut self) -> Self {
        self.jitter = Jitter::None;
        self
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// `min(base * 2^step, max)` before jitter
    pub fn backoff_delay(&self, step: u32) -> Duration {
        1u32.checked_shl(step)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Decide the next action for `outcome`
    ///
    /// `backoff_step` is the number of backoff retries the stream has taken
    /// so far; requested waits do not count.
    pub fn decide(&self, outcome: &SendOutcome, backoff_step: u32) -> RetryAction {
        match outcome {
            SendOutcome::Success => RetryAction::Complete,
            SendOutcome::BackoffRequested => {
                let delay = self
                    .jitter
                    .apply(self.backoff_delay(backoff_step))
                    .min(self.max_delay);
                RetryAction::RetryAfter {
                    delay,
                    advances_backoff: true,
                }
            }
            SendOutcome::RequestedWait(wait) if wait.is_zero() => RetryAction::RetryNow,
            SendOutcome::RequestedWait(wait) => RetryAction::RetryAfter {
                delay: *wait,
                advances_backoff: false,
            },
            SendOutcome::SplitRequested => RetryAction::Split,
            SendOutcome::PermanentFailure { reason } => {
                RetryAction::GiveUp(FailureReason::Rejected(reason.clone()))
            }
        }
    }
}

//! # Backoff policy for reconnect attempts.
//!
//! [`BackoffPolicy`] controls how reconnect delays grow across consecutive
//! failures. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay after the first failure;
//! - [`BackoffPolicy::growth`] exponential doubling or a fixed linear step;
//! - [`BackoffPolicy::max`] the ceiling;
//! - [`BackoffPolicy::ceiling`] what happens once the ceiling is passed.
//!
//! The delay for failure `n` (0-indexed) is derived purely from `n`, then jitter
//! is applied. Jitter output never feeds back into later calculations.
//!
//! [`BackoffState`] is the per-stream counter the supervisor keeps. It remembers
//! which [`FaultKind`] it is escalating; a fault of another kind restarts the
//! count, and a successful connection resets it.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use firehose::BackoffPolicy;
//!
//! let refused = BackoffPolicy::exponential(Duration::from_secs(5), Duration::from_secs(20));
//! assert_eq!(refused.next(0), Some(Duration::from_secs(5)));
//! assert_eq!(refused.next(2), Some(Duration::from_secs(20)));
//! assert_eq!(refused.next(3), None); // 40s would pass the ceiling: give up
//!
//! let network = BackoffPolicy::linear(
//!     Duration::from_millis(250),
//!     Duration::from_millis(250),
//!     Duration::from_secs(1),
//! );
//! assert_eq!(network.next(1), Some(Duration::from_millis(500)));
//! assert_eq!(network.next(99), Some(Duration::from_secs(1)));
//! ```

use std::time::Duration;

use crate::error::FaultKind;
use crate::policies::jitter::JitterPolicy;

/// How delays grow between consecutive failures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Growth {
    /// `first × factor^n`.
    Exponential {
        /// Multiplicative growth factor.
        factor: f64,
    },
    /// `first + step × n`.
    Linear {
        /// Increment added per consecutive failure.
        step: Duration,
    },
}

/// What to do once the computed delay passes [`BackoffPolicy::max`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ceiling {
    /// Clamp to `max` and keep retrying forever.
    Clamp,
    /// Stop retrying; the stream is closed.
    GiveUp,
}

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Delay ceiling.
    pub max: Duration,
    /// Growth between consecutive failures.
    pub growth: Growth,
    /// Behavior past the ceiling.
    pub ceiling: Ceiling,
    /// Jitter policy to prevent thundering herd.
    pub jitter: JitterPolicy,
}

impl BackoffPolicy {
    /// Doubling delays; gives up once a delay would exceed `max`.
    pub fn exponential(first: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            growth: Growth::Exponential { factor: 2.0 },
            ceiling: Ceiling::GiveUp,
            jitter: JitterPolicy::None,
        }
    }

    /// Delays growing by `step`; clamped at `max`, never gives up.
    pub fn linear(first: Duration, step: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            growth: Growth::Linear { step },
            ceiling: Ceiling::Clamp,
            jitter: JitterPolicy::None,
        }
    }

    /// Default policy for refused connections: 5s doubling, closes past 320s.
    pub fn refused_default() -> Self {
        Self::exponential(Duration::from_secs(5), Duration::from_secs(320))
    }

    /// Default policy for network faults: 250ms, +250ms per failure, capped at 16s.
    pub fn network_default() -> Self {
        Self::linear(
            Duration::from_millis(250),
            Duration::from_millis(250),
            Duration::from_secs(16),
        )
    }

    /// Returns a copy with the given jitter policy.
    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay after failure number `failure` (0-indexed).
    ///
    /// Returns `None` when the delay passes the ceiling and the policy is
    /// [`Ceiling::GiveUp`].
    pub fn next(&self, failure: u32) -> Option<Duration> {
        let max_secs = self.max.as_secs_f64();
        let unclamped_secs = match self.growth {
            Growth::Exponential { factor } => {
                let exp = failure.min(i32::MAX as u32) as i32;
                self.first.as_secs_f64() * factor.powi(exp)
            }
            Growth::Linear { step } => {
                self.first.as_secs_f64() + step.as_secs_f64() * f64::from(failure)
            }
        };

        let base = if !unclamped_secs.is_finite() || unclamped_secs > max_secs {
            match self.ceiling {
                Ceiling::Clamp => self.max,
                Ceiling::GiveUp => return None,
            }
        } else if unclamped_secs < 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(unclamped_secs)
        };

        Some(self.jitter.apply(base))
    }
}

/// Outcome of recording one failure in a [`BackoffState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retry {
    /// Sleep this long, then reconnect.
    After(Duration),
    /// The regime's ceiling was passed; stop.
    Exhausted,
}

/// Consecutive-failure bookkeeping for one stream.
///
/// Owned by the supervisor task only.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackoffState {
    kind: Option<FaultKind>,
    failures: u32,
}

impl BackoffState {
    /// Creates a state with no recorded failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all failures. Called when a connection opens.
    pub fn reset(&mut self) {
        self.kind = None;
        self.failures = 0;
    }

    /// Kind of the fault currently escalating, if any.
    pub fn kind(&self) -> Option<FaultKind> {
        self.kind
    }

    /// Number of consecutive failures of [`kind`](Self::kind).
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Records a failure of `kind` and returns what to do under `policy`.
    pub fn record(&mut self, kind: FaultKind, policy: &BackoffPolicy) -> Retry {
        if self.kind != Some(kind) {
            self.kind = Some(kind);
            self.failures = 0;
        }
        let n = self.failures;
        self.failures = self.failures.saturating_add(1);

        match policy.next(n) {
            Some(delay) => Retry::After(delay),
            None => Retry::Exhausted,
        }
    }
}

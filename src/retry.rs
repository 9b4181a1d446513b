// src/retry.rs

use crate::message::Msg;
use std::time::Duration;

/// Growth schedule for the wait between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
  /// The same wait before every retry.
  Fixed,
  /// The wait is multiplied by `factor` after each retry, clamped to
  /// `max_interval`. A factor below 2 is treated as 2.
  Exponential { factor: u32, max_interval: Duration },
}

/// Bounds the retry loop of
/// [`Client::request_with_retry`](crate::Client::request_with_retry).
///
/// `max_retries` counts the waits taken after a would-block signal, across
/// the send and receive phases combined; `max_retries = 0` means a single
/// non-blocking attempt. With `Backoff::Fixed` the total wait is bounded by
/// approximately `retry_interval * max_retries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  pub retry_interval: Duration,
  pub max_retries: u32,
  pub backoff: Backoff,
}

impl RetryPolicy {
  /// Fixed-interval policy, the reference behavior.
  pub fn new(retry_interval: Duration, max_retries: u32) -> Self {
    Self {
      retry_interval,
      max_retries,
      backoff: Backoff::Fixed,
    }
  }

  /// Replaces the backoff schedule.
  pub fn with_backoff(mut self, backoff: Backoff) -> Self {
    self.backoff = backoff;
    self
  }

  /// Wait to take before retry number `attempt` (zero-based).
  pub(crate) fn interval_for(&self, attempt: u32) -> Duration {
    match self.backoff {
      Backoff::Fixed => self.retry_interval,
      Backoff::Exponential { factor, max_interval } => {
        let scaled = factor
          .max(2)
          .checked_pow(attempt)
          .map(|multiplier| self.retry_interval.saturating_mul(multiplier))
          .unwrap_or(max_interval);
        scaled.min(max_interval)
      }
    }
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(Duration::from_millis(100), 10)
  }
}

/// Terminal outcome of a bounded-retry request that did not hit a hard
/// transport fault.
///
/// Exhausting the retry budget is deliberately not an error: no fault
/// occurred, the reply just never arrived in the allotted attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
  /// The reply payload, returned verbatim.
  Reply(Msg),
  /// Retry budget exhausted with no reply and no transport fault.
  /// `attempts` is the number of waits that were taken.
  TimedOut { attempts: u32 },
  /// The caller's cancellation token fired before a terminal outcome.
  Cancelled,
}

impl RetryOutcome {
  /// Returns the reply payload, if this outcome carries one.
  pub fn into_reply(self) -> Option<Msg> {
    match self {
      RetryOutcome::Reply(msg) => Some(msg),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixed_backoff_never_grows() {
    let policy = RetryPolicy::new(Duration::from_millis(50), 5);
    for attempt in 0..5 {
      assert_eq!(policy.interval_for(attempt), Duration::from_millis(50));
    }
  }

  #[test]
  fn exponential_backoff_doubles_and_clamps() {
    let policy = RetryPolicy::new(Duration::from_millis(10), 10).with_backoff(Backoff::Exponential {
      factor: 2,
      max_interval: Duration::from_millis(65),
    });
    assert_eq!(policy.interval_for(0), Duration::from_millis(10));
    assert_eq!(policy.interval_for(1), Duration::from_millis(20));
    assert_eq!(policy.interval_for(2), Duration::from_millis(40));
    assert_eq!(policy.interval_for(3), Duration::from_millis(65));
    // Large attempt numbers overflow the multiplier; stay at the clamp.
    assert_eq!(policy.interval_for(40), Duration::from_millis(65));
  }

  #[test]
  fn degenerate_factor_is_lifted_to_two() {
    let policy = RetryPolicy::new(Duration::from_millis(10), 3).with_backoff(Backoff::Exponential {
      factor: 0,
      max_interval: Duration::from_secs(1),
    });
    assert_eq!(policy.interval_for(1), Duration::from_millis(20));
  }
}

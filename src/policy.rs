//! Retry and backoff policy.
//!
//! Pure decision logic: given the outcome of attempt `k`, either stop or wait
//! `unit * 2^k` before attempt `k + 1`. No I/O, no randomness, no shared state.

use std::time::Duration;

use crate::{AttemptOutcome, ClientOptions};

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The outcome just classified is terminal.
    Stop,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff without jitter or cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Multiplier for the `2^k` schedule.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            unit: Duration::from_secs(1),
        }
    }
}

impl From<&ClientOptions> for RetryPolicy {
    fn from(opts: &ClientOptions) -> Self {
        Self {
            max_attempts: opts.max_attempts.max(1),
            unit: Duration::from_millis(opts.backoff_unit_ms),
        }
    }
}

impl RetryPolicy {
    /// Same schedule shape with a different unit (e.g. milliseconds in tests).
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    /// Delay to wait after attempt `attempt` (1-based) fails.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Decide what happens after attempt `attempt` (1-based) produced `outcome`.
    pub fn decide(&self, outcome: &AttemptOutcome, attempt: u32) -> Decision {
        if !outcome.is_retryable() || attempt >= self.max_attempts {
            return Decision::Stop;
        }
        Decision::RetryAfter(self.backoff(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> AttemptOutcome {
        AttemptOutcome::TransientFailure {
            status: Some(500),
            reason: "Internal Server Error".to_owned(),
        }
    }

    #[test]
    fn retries_transient_and_not_found_with_doubling_delays() {
        let p = RetryPolicy::default();
        for attempt in 1..=6u32 {
            let expected = Decision::RetryAfter(Duration::from_secs(1 << attempt));
            assert_eq!(p.decide(&transient(), attempt), expected);
            assert_eq!(p.decide(&AttemptOutcome::NotFound, attempt), expected);
        }
    }

    #[test]
    fn stops_after_seventh_attempt() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(&transient(), 7), Decision::Stop);
        assert_eq!(p.decide(&AttemptOutcome::NotFound, 7), Decision::Stop);
        assert_eq!(p.decide(&AttemptOutcome::NotFound, 8), Decision::Stop);
    }

    #[test]
    fn success_stops_regardless_of_budget() {
        let p = RetryPolicy::default();
        let ok = AttemptOutcome::Success {
            status: 200,
            body: Vec::new(),
        };
        for attempt in 1..=7 {
            assert_eq!(p.decide(&ok, attempt), Decision::Stop);
        }
    }

    #[test]
    fn permanent_failure_and_cancel_stop_on_first_attempt() {
        let p = RetryPolicy::default();
        let bad = AttemptOutcome::PermanentFailure {
            status: 400,
            reason: "Bad Request".to_owned(),
        };
        assert_eq!(p.decide(&bad, 1), Decision::Stop);
        assert_eq!(p.decide(&AttemptOutcome::Cancelled, 1), Decision::Stop);
    }

    #[test]
    fn schedule_is_strictly_increasing_and_repeatable() {
        let p = RetryPolicy::default();
        let run = || {
            [
                AttemptOutcome::NotFound,
                transient(),
                AttemptOutcome::NotFound,
                transient(),
            ]
            .iter()
            .enumerate()
            .map(|(i, o)| p.decide(o, i as u32 + 1))
            .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());

        let delays: Vec<Duration> = (1..=6).map(|k| p.backoff(k)).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(delays.last(), Some(&Duration::from_secs(64)));
    }

    #[test]
    fn unit_scales_schedule() {
        let p = RetryPolicy::default().with_unit(Duration::from_millis(1));
        assert_eq!(p.backoff(3), Duration::from_millis(8));
    }

    #[test]
    fn from_options_never_allows_zero_attempts() {
        let opts = ClientOptions {
            max_attempts: 0,
            ..ClientOptions::default()
        };
        let p = RetryPolicy::from(&opts);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.decide(&AttemptOutcome::NotFound, 1), Decision::Stop);
    }
}

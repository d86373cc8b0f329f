//! Retry budget and backoff schedule for the fetch client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for retryable fetch failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Exponential base: retry `n` waits `base^n` units
    #[serde(default = "default_backoff_base")]
    pub backoff_base: u32,

    /// Length of one backoff unit in milliseconds
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base() -> u32 {
    2
}
fn default_backoff_unit_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            backoff_unit_ms: default_backoff_unit_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry `retry` (0-indexed): `base^retry` units
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = u64::from(self.backoff_base).saturating_pow(retry);
        Duration::from_millis(self.backoff_unit_ms.saturating_mul(factor))
    }

    /// Check whether another attempt is allowed after `retries_done` retries
    pub fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Total attempts the policy allows, including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Per-call retry bookkeeping; never shared between calls
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Retries performed so far
    pub attempt: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a retry and return the delay to wait first, or `None` once
    /// the budget is spent
    pub fn next_delay(&mut self, policy: &RetryPolicy) -> Option<Duration> {
        if !policy.should_retry(self.attempt) {
            return None;
        }
        let delay = policy.delay_for_retry(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}
